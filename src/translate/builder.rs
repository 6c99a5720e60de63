//! Builds native queries from lowered expressions.

use crate::config::CompilerConfig;
use crate::data::DataValue;
use crate::error::{LexiqError, Result};
use crate::expr::{
    BinaryOp, Expr, Predicate, QueryType, RangePredicate, UnaryOp, evaluate, is_evaluable,
};
use crate::field::{FieldInfo, FieldMappingProvider};
use crate::lexical::query::Query;
use crate::lexical::query::boolean::{BooleanQuery, Occur};
use crate::lexical::query::fuzzy::FuzzyQuery;
use crate::lexical::query::match_all::MatchAllQuery;
use crate::lexical::query::prefix::PrefixQuery;
use crate::lexical::query::wildcard::WildcardQuery;

/// A query plus how it joins the enclosing boolean query.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub query: Box<dyn Query>,
    pub occur: Occur,
}

impl Fragment {
    fn new(query: Box<dyn Query>, occur: Occur) -> Self {
        Fragment { query, occur }
    }
}

/// Turns lowered where/filter expressions into query fragments.
pub struct QueryBuilder<'a> {
    provider: &'a dyn FieldMappingProvider,
    config: &'a CompilerConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(provider: &'a dyn FieldMappingProvider, config: &'a CompilerConfig) -> Self {
        QueryBuilder { provider, config }
    }

    pub fn build(&self, expr: &Expr) -> Result<Fragment> {
        match expr {
            Expr::Predicate(predicate) => self.predicate(predicate),
            Expr::Range(range) => self.range(range),
            Expr::Binary {
                op: BinaryOp::AndAlso,
                ..
            } => self.conjunction(expr),
            Expr::Binary {
                op: BinaryOp::OrElse,
                ..
            } => self.disjunction(expr),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let fragment = self.build(operand)?;
                Ok(Fragment::new(fragment.query, fragment.occur.negate()))
            }
            Expr::Boost { target, boost } => {
                let mut fragment = self.build(target)?;
                let boosted = fragment.query.boost() * boost;
                fragment.query.set_boost(boosted);
                Ok(fragment)
            }
            Expr::Conditional { .. } if !is_evaluable(expr) => {
                Err(LexiqError::ambiguous_null_guard(expr))
            }
            Expr::Binary { op, left, right } if op.is_comparison() => {
                if left.field_operand().is_none() && right.field_operand().is_none() {
                    Err(LexiqError::no_field_reference(expr))
                } else {
                    Err(LexiqError::unsupported_expression(expr))
                }
            }
            closed if is_evaluable(closed) => match evaluate(closed)? {
                DataValue::Bool(true) => {
                    Ok(Fragment::new(Box::new(MatchAllQuery::new()), Occur::Must))
                }
                DataValue::Bool(false) => {
                    Ok(Fragment::new(Box::new(MatchAllQuery::new()), Occur::MustNot))
                }
                other => Err(LexiqError::unsupported_expression(format!(
                    "{closed} evaluates to {other}, not a truth value"
                ))),
            },
            other => Err(LexiqError::unsupported_expression(other)),
        }
    }

    fn conjunction(&self, expr: &Expr) -> Result<Fragment> {
        let mut operands = Vec::new();
        flatten(expr, BinaryOp::AndAlso, &mut operands);

        let mut query = BooleanQuery::new();
        for operand in operands {
            let fragment = self.build(operand)?;
            query.add(fragment.query, fragment.occur.in_conjunction());
        }
        query.ensure_positive_clause();
        Ok(Fragment::new(Box::new(query), Occur::Must))
    }

    fn disjunction(&self, expr: &Expr) -> Result<Fragment> {
        let mut operands = Vec::new();
        flatten(expr, BinaryOp::OrElse, &mut operands);

        let mut query = BooleanQuery::new();
        for operand in operands {
            let fragment = self.build(operand)?;
            query.add_should(optional(fragment));
        }
        Ok(Fragment::new(Box::new(query), Occur::Must))
    }

    fn predicate(&self, predicate: &Predicate) -> Result<Fragment> {
        if !predicate.field.is_any_field() {
            return self.field_predicate(&predicate.field.name, predicate);
        }

        let fields = self.provider.all_fields();
        if fields.is_empty() {
            return Err(LexiqError::invalid_argument(
                "any-field predicate but no searchable fields are mapped",
            ));
        }
        // Each field is tested positively; the predicate's polarity applies to the whole.
        let positive = predicate.clone().with_occur(Occur::Must);
        let mut query = BooleanQuery::new();
        for name in &fields {
            let fragment = self.field_predicate(name, &positive)?;
            query.add_should(optional(fragment));
        }
        Ok(Fragment::new(Box::new(query), predicate.occur))
    }

    fn field_predicate(&self, name: &str, predicate: &Predicate) -> Result<Fragment> {
        let info = self.provider.resolve(name);
        let value = evaluate(&predicate.pattern)?;

        // "Has no value" cannot be a term query; test for any value instead.
        if value.is_null() {
            let mut query = WildcardQuery::new(name, self.config.all_values_token.as_str())?;
            query.set_boost(predicate.boost);
            return Ok(Fragment::new(Box::new(query), predicate.occur.negate()));
        }

        let text = info.convert(&value)?;
        let pattern = if predicate.allow_special_characters {
            text.clone()
        } else {
            WildcardQuery::escape(&text)
        };

        let mut query: Box<dyn Query> = match predicate.query_type {
            QueryType::Default => info.build_query(&text)?,
            QueryType::Prefix => Box::new(PrefixQuery::new(name, text)),
            QueryType::Suffix => Box::new(WildcardQuery::new(name, format!("*{pattern}"))?),
            QueryType::Wildcard => Box::new(WildcardQuery::new(name, format!("*{pattern}*"))?),
            QueryType::Fuzzy => {
                let similarity = predicate
                    .similarity
                    .unwrap_or(self.config.default_fuzzy_similarity);
                let edits = FuzzyQuery::edits_for_similarity(
                    &text,
                    similarity,
                    self.config.max_fuzzy_edits,
                );
                Box::new(FuzzyQuery::new(name, text).max_edits(edits))
            }
            comparison => bound_query(info.as_ref(), comparison, &text)?,
        };
        if predicate.boost != 1.0 {
            query.set_boost(predicate.boost);
        }
        Ok(Fragment::new(query, predicate.occur))
    }

    fn range(&self, range: &RangePredicate) -> Result<Fragment> {
        if range.field.is_any_field() {
            return Err(LexiqError::unsupported_expression(format!(
                "range over any field: {range}"
            )));
        }
        let info = self.provider.resolve(&range.field.name);
        let lower = self.bound(info.as_ref(), range.lower.as_deref())?;
        let upper = self.bound(info.as_ref(), range.upper.as_deref())?;

        let mut query = info.build_range_query(
            lower.as_deref(),
            upper.as_deref(),
            range.include_lower(),
            range.include_upper(),
        )?;
        if range.boost != 1.0 {
            query.set_boost(range.boost);
        }
        Ok(Fragment::new(query, range.occur))
    }

    /// Encode a range bound; a null bound leaves the range open.
    fn bound(&self, info: &dyn FieldInfo, bound: Option<&Expr>) -> Result<Option<String>> {
        let Some(bound) = bound else {
            return Ok(None);
        };
        let value = evaluate(bound)?;
        if value.is_null() {
            return Ok(None);
        }
        info.convert(&value).map(Some)
    }
}

/// A single-sided comparison query.
fn bound_query(info: &dyn FieldInfo, query_type: QueryType, text: &str) -> Result<Box<dyn Query>> {
    match query_type {
        QueryType::GreaterThan => info.build_range_query(Some(text), None, false, false),
        QueryType::GreaterOrEqual => info.build_range_query(Some(text), None, true, false),
        QueryType::LessThan => info.build_range_query(None, Some(text), false, false),
        QueryType::LessOrEqual => info.build_range_query(None, Some(text), false, true),
        other => Err(LexiqError::internal(format!("{other:?} is not a comparison"))),
    }
}

/// The query as an optional clause of a disjunction.
///
/// A negative operand becomes `(-q *:*)`, since a bare MUST_NOT clause among
/// SHOULD clauses would exclude matches instead of offering an alternative.
fn optional(fragment: Fragment) -> Box<dyn Query> {
    match fragment.occur {
        Occur::MustNot => {
            let mut negated = BooleanQuery::new();
            negated.add_must_not(fragment.query);
            negated.ensure_positive_clause();
            Box::new(negated)
        }
        _ => fragment.query,
    }
}

/// Collect the operands of a chain of `op`, leaving boosted sub-chains intact.
fn flatten<'e>(expr: &'e Expr, op: BinaryOp, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::Binary {
            op: inner,
            left,
            right,
        } if *inner == op => {
            flatten(left, op, out);
            flatten(right, op, out);
        }
        other => out.push(other),
    }
}
