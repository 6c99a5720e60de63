//! Range query over encoded term values.

use serde::{Deserialize, Serialize};

use crate::lexical::query::{Query, with_boost_suffix};

/// A query matching terms between two bounds.
///
/// Either bound may be absent, giving an open range. Bounds are the already
/// encoded term text; numeric encoding is the field mapping's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    field: String,
    lower: Option<String>,
    upper: Option<String>,
    include_lower: bool,
    include_upper: bool,
    boost: f32,
}

impl RangeQuery {
    pub fn new<F: Into<String>>(
        field: F,
        lower: Option<String>,
        upper: Option<String>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        RangeQuery {
            field: field.into(),
            lower,
            upper,
            include_lower,
            include_upper,
            boost: 1.0,
        }
    }

    /// Range with only a lower bound.
    pub fn greater_than<F: Into<String>, V: Into<String>>(field: F, value: V, inclusive: bool) -> Self {
        Self::new(field, Some(value.into()), None, inclusive, false)
    }

    /// Range with only an upper bound.
    pub fn less_than<F: Into<String>, V: Into<String>>(field: F, value: V, inclusive: bool) -> Self {
        Self::new(field, None, Some(value.into()), false, inclusive)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn lower(&self) -> Option<&str> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&str> {
        self.upper.as_deref()
    }

    pub fn include_lower(&self) -> bool {
        self.include_lower
    }

    pub fn include_upper(&self) -> bool {
        self.include_upper
    }

    /// Check whether an encoded term falls inside the range.
    pub fn contains(&self, term: &str) -> bool {
        let above = match &self.lower {
            Some(lower) if self.include_lower => term >= lower.as_str(),
            Some(lower) => term > lower.as_str(),
            None => true,
        };
        let below = match &self.upper {
            Some(upper) if self.include_upper => term <= upper.as_str(),
            Some(upper) => term < upper.as_str(),
            None => true,
        };
        above && below
    }
}

impl Query for RangeQuery {
    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn description(&self) -> String {
        let open = if self.include_lower { '[' } else { '{' };
        let close = if self.include_upper { ']' } else { '}' };
        with_boost_suffix(
            format!(
                "{}:{}{} TO {}{}",
                self.field,
                open,
                self.lower.as_deref().unwrap_or("*"),
                self.upper.as_deref().unwrap_or("*"),
                close
            ),
            self.boost,
        )
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn field(&self) -> Option<&str> {
        Some(&self.field)
    }
}
