//! Field mapping boundary.
//!
//! How a field's values are encoded, analyzed and turned into queries is decided
//! by the object-mapping layer. Translation only consumes it through
//! [`FieldInfo`] and [`FieldMappingProvider`].

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use ahash::AHashMap;

use crate::data::DataValue;
use crate::error::{LexiqError, Result};
use crate::lexical::query::Query;
use crate::lexical::query::range::RangeQuery;
use crate::lexical::query::term::TermQuery;
use crate::lexical::search::searcher::SortKind;

/// Everything translation needs to know about one field.
pub trait FieldInfo: Send + Sync + Debug {
    /// The indexed field name.
    fn name(&self) -> &str;

    /// Whether values are numerically encoded.
    fn is_numeric(&self) -> bool;

    /// The native sort type, or `None` when sorting needs [`FieldInfo::compare`].
    fn sort_kind(&self) -> Option<SortKind>;

    /// Encode a literal into the term text stored in the index.
    fn convert(&self, value: &DataValue) -> Result<String>;

    /// Build the query matching an encoded value.
    fn build_query(&self, text: &str) -> Result<Box<dyn Query>>;

    /// Build a range query over encoded bounds.
    fn build_range_query(
        &self,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Box<dyn Query>>;

    /// Compare two stored values, used for custom sorts.
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Looks up field mappings by name.
pub trait FieldMappingProvider: Send + Sync {
    /// The mapping for `name`, if one is registered.
    fn field_info(&self, name: &str) -> Option<Arc<dyn FieldInfo>>;

    /// All searchable fields, used to expand any-field predicates.
    fn all_fields(&self) -> Vec<String>;

    /// The mapping for `name`, falling back to a keyword mapping.
    fn resolve(&self, name: &str) -> Arc<dyn FieldInfo> {
        self.field_info(name)
            .unwrap_or_else(|| Arc::new(KeywordFieldInfo::new(name)))
    }
}

/// Untokenized field: values are stored verbatim and matched by exact term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFieldInfo {
    name: String,
    sort_kind: Option<SortKind>,
}

impl KeywordFieldInfo {
    pub fn new(name: impl Into<String>) -> Self {
        KeywordFieldInfo {
            name: name.into(),
            sort_kind: Some(SortKind::String),
        }
    }

    /// Override the native sort type; `None` forces comparator sorting.
    pub fn with_sort_kind(mut self, sort_kind: Option<SortKind>) -> Self {
        self.sort_kind = sort_kind;
        self
    }
}

impl FieldInfo for KeywordFieldInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_numeric(&self) -> bool {
        false
    }

    fn sort_kind(&self) -> Option<SortKind> {
        self.sort_kind
    }

    fn convert(&self, value: &DataValue) -> Result<String> {
        match value {
            DataValue::Null => Err(LexiqError::invalid_argument(format!(
                "cannot encode null for field `{}`",
                self.name
            ))),
            DataValue::Bool(b) => Ok(b.to_string()),
            DataValue::Int64(i) => Ok(i.to_string()),
            DataValue::Float64(f) => Ok(f.to_string()),
            DataValue::Text(s) => Ok(s.clone()),
            DataValue::DateTime(dt) => Ok(dt.to_rfc3339()),
        }
    }

    fn build_query(&self, text: &str) -> Result<Box<dyn Query>> {
        Ok(Box::new(TermQuery::new(self.name.as_str(), text)))
    }

    fn build_range_query(
        &self,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Box<dyn Query>> {
        Ok(Box::new(RangeQuery::new(
            self.name.as_str(),
            lower.map(str::to_string),
            upper.map(str::to_string),
            include_lower,
            include_upper,
        )))
    }
}

/// A fixed set of field mappings.
#[derive(Debug, Default, Clone)]
pub struct StaticFieldMappings {
    fields: AHashMap<String, Arc<dyn FieldInfo>>,
    order: Vec<String>,
}

impl StaticFieldMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping, replacing any existing one with the same name.
    pub fn with_field(mut self, info: Arc<dyn FieldInfo>) -> Self {
        let name = info.name().to_string();
        if self.fields.insert(name.clone(), info).is_none() {
            self.order.push(name);
        }
        self
    }

    /// Register a keyword mapping for each name.
    pub fn with_keywords<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.with_field(Arc::new(KeywordFieldInfo::new(name)));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldMappingProvider for StaticFieldMappings {
    fn field_info(&self, name: &str) -> Option<Arc<dyn FieldInfo>> {
        self.fields.get(name).cloned()
    }

    fn all_fields(&self) -> Vec<String> {
        self.order.clone()
    }
}
