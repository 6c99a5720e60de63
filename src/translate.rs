//! Query-model translation.
//!
//! A [`QueryModel`] is lowered clause by clause and compiled into a
//! [`TranslatedQuery`]: the boolean query, an optional filter, the sort
//! specification, the result window and the composed boost function.
//!
//! # Module Structure
//!
//! - `model`: query models, body clauses and result operators
//! - `builder`: lowered expression to native query
//! - `translator`: the model walk and the translated description

pub mod builder;
pub mod model;
pub mod translator;

pub use builder::{Fragment, QueryBuilder};
pub use model::{BodyClause, BoostFn, OrderClause, QueryModel, QuerySource, ResultOperator};
pub use translator::{Aggregate, QueryModelTranslator, TranslatedQuery};

use crate::config::CompilerConfig;
use crate::error::Result;
use crate::field::FieldMappingProvider;

/// Translate `model` with a fresh translator.
pub fn translate<T: 'static>(
    model: &QueryModel<T>,
    provider: &dyn FieldMappingProvider,
    config: &CompilerConfig,
) -> Result<TranslatedQuery<T>> {
    QueryModelTranslator::new(provider, config).translate(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, ScalarKind};
    use crate::field::StaticFieldMappings;
    use crate::lexical::search::searcher::{SortField, SortKind, SortOrder};

    fn doc() -> Expr {
        Expr::source("doc")
    }

    fn title() -> Expr {
        doc().member("title", ScalarKind::Text)
    }

    fn run(model: QueryModel<()>) -> TranslatedQuery<()> {
        let mappings = StaticFieldMappings::new().with_keywords(["title", "body"]);
        translate(&model, &mappings, &CompilerConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_model_matches_all() {
        let translated = run(QueryModel::from_index("books"));
        assert_eq!(translated.query().description(), "*:*");
        assert!(translated.filter().is_none());
        assert_eq!(translated.max(), None);
    }

    #[test]
    fn test_where_clauses_conjoin() {
        let translated = run(QueryModel::from_index("books")
            .where_clause(title().starts_with("ru"))
            .where_clause(doc().member("body", ScalarKind::Text).equal("fast")));
        assert_eq!(translated.query().description(), "(+title:ru* +body:fast)");
    }

    #[test]
    fn test_conjunction_inside_one_clause_is_spliced() {
        let translated = run(QueryModel::from_index("books").where_clause(
            title()
                .equal("a")
                .and_also(doc().member("body", ScalarKind::Text).not_equal("b")),
        ));
        assert_eq!(translated.query().description(), "(+title:a -body:b)");
    }

    #[test]
    fn test_disjunction_with_negative_operand() {
        let translated = run(QueryModel::from_index("books")
            .where_clause(title().equal("a").or_else(title().not_equal("b"))));
        assert_eq!(
            translated.query().description(),
            "(+(title:a (-title:b *:*)))"
        );
    }

    #[test]
    fn test_null_pattern_degrades_to_wildcard() {
        let is_null = run(QueryModel::from_index("books").where_clause(title().equal(Expr::null())));
        assert_eq!(is_null.query().description(), "(-title:* *:*)");

        let not_null =
            run(QueryModel::from_index("books").where_clause(title().not_equal(Expr::null())));
        assert_eq!(not_null.query().description(), "(+title:*)");
    }

    #[test]
    fn test_suffix_contains_and_escaping() {
        let translated = run(QueryModel::from_index("books")
            .where_clause(title().ends_with("a*b"))
            .where_clause(title().contains_text("c?").allow_special_characters()));
        assert_eq!(
            translated.query().description(),
            "(+title:*a\\*b +title:*c?*)"
        );
    }

    #[test]
    fn test_fuzzy_edits_from_similarity() {
        let translated =
            run(QueryModel::from_index("books").where_clause(title().similar_to("rusty", Some(0.8))));
        assert_eq!(translated.query().description(), "(+title:rusty~1)");
    }

    #[test]
    fn test_any_field_expands_to_should() {
        let translated = run(
            QueryModel::from_index("books").where_clause(doc().any_field().equal("rust")),
        );
        assert_eq!(
            translated.query().description(),
            "(+(title:rust body:rust))"
        );
    }

    #[test]
    fn test_filter_clause() {
        let translated = run(QueryModel::from_index("books")
            .where_clause(title().equal("a"))
            .filter(doc().member("year", ScalarKind::Int64).greater_or_equal(2000)));
        assert_eq!(translated.query().description(), "(+title:a)");
        assert_eq!(
            translated.filter().map(|f| f.description()).as_deref(),
            Some("(+year:[2000 TO *})")
        );
    }

    #[test]
    fn test_ordering() {
        let translated = run(QueryModel::from_index("books")
            .order_by(doc().score(), SortOrder::Desc)
            .then_by(doc().member("year", ScalarKind::Int64), SortOrder::Asc)
            .then_by(doc().member("author", ScalarKind::Other), SortOrder::Asc));

        let sort = translated.sort();
        assert!(matches!(sort[0], SortField::Score { order: SortOrder::Desc }));
        assert!(matches!(
            sort[1],
            SortField::Field { kind: SortKind::Int64, .. }
        ));
        assert!(matches!(sort[2], SortField::Custom { .. }));
    }

    #[test]
    fn test_aggregates_limit_window() {
        let first = run(QueryModel::from_index("books").first());
        assert_eq!(first.aggregate(), Some(Aggregate::First));
        assert_eq!(first.max(), Some(1));

        let single = run(QueryModel::from_index("books").take(10).single());
        assert_eq!(single.max(), Some(2));

        let last_then_first = run(QueryModel::from_index("books").last().first());
        assert_eq!(last_then_first.max(), None);
        assert!(last_then_first.take_last());
    }

    #[test]
    fn test_unknown_operators_pass_through() {
        let translated = run(QueryModel::from_index("books")
            .with_operator(ResultOperator::Other("distinct".into()))
            .count()
            .any());
        assert_eq!(translated.unsupported_operators(), ["distinct", "any"]);
        assert_eq!(translated.aggregate(), Some(Aggregate::Count));
    }
}
