//! Boolean combination of queries.

use serde::{Deserialize, Serialize};

use crate::lexical::query::match_all::MatchAllQuery;
use crate::lexical::query::{Query, with_boost_suffix};

/// How a clause takes part in a boolean query.
///
/// Predicates carry one of these as their polarity before they are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occur {
    /// Required.
    Must,
    /// Optional; contributes to the score when it matches.
    Should,
    /// Forbidden.
    MustNot,
    /// Required but not scored.
    Filter,
}

impl Occur {
    /// The polarity obtained by logically negating a clause.
    ///
    /// A negated optional clause becomes a prohibited one.
    pub fn negate(self) -> Self {
        match self {
            Occur::Must | Occur::Should | Occur::Filter => Occur::MustNot,
            Occur::MustNot => Occur::Must,
        }
    }

    /// The occurrence used when this clause participates in a conjunction.
    pub fn in_conjunction(self) -> Self {
        match self {
            Occur::Should => Occur::Must,
            other => other,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
            Occur::Filter => "#",
        }
    }
}

/// One sub-query and its occurrence.
#[derive(Debug)]
pub struct BooleanClause {
    pub query: Box<dyn Query>,
    pub occur: Occur,
}

impl BooleanClause {
    pub fn new(query: Box<dyn Query>, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }
}

impl Clone for BooleanClause {
    fn clone(&self) -> Self {
        BooleanClause::new(self.query.clone_box(), self.occur)
    }
}

/// Clauses joined by their occurrences: `(+a -b c)`.
#[derive(Debug, Clone)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
    boost: f32,
}

impl BooleanQuery {
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            boost: 1.0,
        }
    }

    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    pub fn add(&mut self, query: Box<dyn Query>, occur: Occur) {
        self.add_clause(BooleanClause::new(query, occur));
    }

    pub fn add_should(&mut self, query: Box<dyn Query>) {
        self.add(query, Occur::Should);
    }

    pub fn add_must_not(&mut self, query: Box<dyn Query>) {
        self.add(query, Occur::MustNot);
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses_by_occur(&self, occur: Occur) -> Vec<&BooleanClause> {
        self.clauses.iter().filter(|c| c.occur == occur).collect()
    }

    /// True when the query has clauses and every one of them is MUST_NOT.
    ///
    /// Such a query matches nothing on its own.
    pub fn is_purely_negative(&self) -> bool {
        !self.clauses.is_empty() && self.clauses.iter().all(|c| c.occur == Occur::MustNot)
    }

    /// Append a match-everything SHOULD clause if the query is purely negative.
    ///
    /// Returns true when a clause was added.
    pub fn ensure_positive_clause(&mut self) -> bool {
        if !self.is_purely_negative() {
            return false;
        }
        self.add_should(Box::new(MatchAllQuery::new()));
        true
    }
}

impl Default for BooleanQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl Query for BooleanQuery {
    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| format!("{}{}", clause.occur.prefix(), clause.query.description()))
            .collect();
        with_boost_suffix(format!("({})", parts.join(" ")), self.boost)
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::query::term::TermQuery;

    fn term(field: &str, text: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(field, text))
    }

    #[test]
    fn test_description_prefixes() {
        let mut query = BooleanQuery::new();
        assert_eq!(query.description(), "()");

        query.add(term("title", "hello"), Occur::Must);
        query.add_should(term("body", "world"));
        query.add_must_not(term("title", "spam"));
        query.add(term("lang", "en"), Occur::Filter);

        assert_eq!(
            query.description(),
            "(+title:hello body:world -title:spam #lang:en)"
        );
        assert_eq!(query.clauses_by_occur(Occur::Should).len(), 1);
        assert!(!query.is_purely_negative());

        query.set_boost(2.0);
        assert!(query.description().ends_with(")^2"));
    }

    #[test]
    fn test_purely_negative_gets_match_all() {
        let mut query = BooleanQuery::new();
        assert!(!query.ensure_positive_clause());

        query.add_must_not(term("title", "spam"));
        assert!(query.is_purely_negative());
        assert!(query.ensure_positive_clause());
        assert_eq!(query.description(), "(-title:spam *:*)");
        assert!(!query.ensure_positive_clause());
    }

    #[test]
    fn test_occur_negate() {
        assert_eq!(Occur::Must.negate(), Occur::MustNot);
        assert_eq!(Occur::MustNot.negate(), Occur::Must);
        assert_eq!(Occur::Should.negate(), Occur::MustNot);
        assert_eq!(Occur::Should.in_conjunction(), Occur::Must);
        assert_eq!(Occur::MustNot.in_conjunction(), Occur::MustNot);
    }
}
