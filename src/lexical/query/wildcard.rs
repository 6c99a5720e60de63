//! Wildcard pattern queries.

use std::sync::Arc;

use regex::Regex;

use crate::error::{LexiqError, Result};
use crate::lexical::query::{Query, with_boost_suffix};

/// Matches terms against a wildcard pattern.
///
/// `*` matches any run of characters and `?` exactly one; `\` makes the next
/// character literal. The pattern is compiled on construction, so a query that
/// exists is known to be valid.
#[derive(Debug, Clone)]
pub struct WildcardQuery {
    field: String,
    pattern: String,
    regex: Arc<Regex>,
    boost: f32,
}

impl WildcardQuery {
    pub fn new<F: Into<String>, P: Into<String>>(field: F, pattern: P) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&to_regex(&pattern)).map_err(|e| {
            LexiqError::invalid_argument(format!("invalid wildcard pattern `{pattern}`: {e}"))
        })?;

        Ok(WildcardQuery {
            field: field.into(),
            pattern,
            regex: Arc::new(regex),
            boost: 1.0,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Escape wildcard metacharacters so `text` matches literally.
    pub fn escape(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if matches!(c, '*' | '?' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    /// True if `term` matches the whole pattern.
    pub fn matches(&self, term: &str) -> bool {
        self.regex.is_match(term)
    }
}

/// Anchored regex equivalent of a wildcard pattern.
fn to_regex(pattern: &str) -> String {
    let mut regex = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            // A trailing backslash stands for itself.
            '\\' => regex.push_str(&regex::escape(&chars.next().unwrap_or('\\').to_string())),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}

impl Query for WildcardQuery {
    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn description(&self) -> String {
        with_boost_suffix(format!("{}:{}", self.field, self.pattern), self.boost)
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
