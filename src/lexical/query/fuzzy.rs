//! Approximate term matching.

use serde::{Deserialize, Serialize};

use crate::lexical::query::{Query, with_boost_suffix};

/// Matches terms within an edit distance of `term`: `field:term~N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyQuery {
    field: String,
    term: String,
    /// Maximum Levenshtein distance.
    max_edits: u32,
    boost: f32,
}

impl FuzzyQuery {
    pub fn new<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        FuzzyQuery {
            field: field.into(),
            term: term.into(),
            max_edits: 2,
            boost: 1.0,
        }
    }

    /// Translate a similarity into an edit distance for `term`.
    ///
    /// Values of 1 or more are taken as an explicit edit count. Values below 1
    /// are a minimum similarity: `floor((1 - similarity) * len)` edits, capped
    /// at `max_edits`.
    pub fn edits_for_similarity(term: &str, similarity: f32, max_edits: u32) -> u32 {
        if similarity >= 1.0 {
            return (similarity as u32).min(max_edits);
        }
        let len = term.chars().count() as f32;
        // Nudge past f32 rounding so 0.8 on five characters yields one edit.
        let edits = ((1.0 - similarity.max(0.0)) * len + 1e-4).floor() as u32;
        edits.min(max_edits)
    }

    pub fn max_edits(mut self, max_edits: u32) -> Self {
        self.max_edits = max_edits;
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn edits(&self) -> u32 {
        self.max_edits
    }
}

impl Query for FuzzyQuery {
    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn description(&self) -> String {
        with_boost_suffix(
            format!("{}:{}~{}", self.field, self.term, self.max_edits),
            self.boost,
        )
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn field(&self) -> Option<&str> {
        Some(&self.field)
    }
}
