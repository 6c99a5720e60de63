//! Error types for query compilation and snapshot management.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LexiqError>;

/// The error type for all lexiq operations.
#[derive(Debug, Error)]
pub enum LexiqError {
    /// An operator that cannot be expressed as a search query touched a field.
    #[error("unsupported operator `{operator}` applied to a field reference")]
    UnsupportedOperator { operator: String },

    /// A comparison survived lowering without referencing any field.
    #[error("no field reference found in `{expression}`")]
    NoFieldReferenceFound { expression: String },

    /// A boost was applied to something that is neither a field nor a query.
    #[error("boost cannot be applied to `{target}`")]
    BoostTarget { target: String },

    /// A null-guard conditional whose shape could not be proven safe to remove.
    #[error("ambiguous null guard `{expression}`")]
    AmbiguousNullGuard { expression: String },

    /// An expression kind that has no query equivalent.
    #[error("unsupported expression `{expression}`")]
    UnsupportedExpression { expression: String },

    /// A pattern could not be evaluated to a literal value.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A result operator that neither the translator nor the executor handles.
    #[error("unsupported result operator `{operator}`")]
    UnsupportedResultOperator { operator: String },

    /// The snapshot context was disposed.
    #[error("context has been disposed")]
    ManagerDisposed,

    /// A snapshot handle was released more than once.
    #[error("snapshot handle already released")]
    AlreadyReleased,

    /// `First`/`Single` found nothing.
    #[error("sequence contains no elements")]
    NoResults,

    /// `Single` found more than one hit.
    #[error("sequence contains more than one element")]
    MoreThanOneResult,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Failure reported by the underlying index.
    #[error("index error: {0}")]
    Index(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LexiqError {
    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        LexiqError::UnsupportedOperator {
            operator: operator.into(),
        }
    }

    pub fn no_field_reference(expression: impl ToString) -> Self {
        LexiqError::NoFieldReferenceFound {
            expression: expression.to_string(),
        }
    }

    pub fn boost_target(target: impl ToString) -> Self {
        LexiqError::BoostTarget {
            target: target.to_string(),
        }
    }

    pub fn ambiguous_null_guard(expression: impl ToString) -> Self {
        LexiqError::AmbiguousNullGuard {
            expression: expression.to_string(),
        }
    }

    pub fn unsupported_expression(expression: impl ToString) -> Self {
        LexiqError::UnsupportedExpression {
            expression: expression.to_string(),
        }
    }

    pub fn unsupported_result_operator(operator: impl Into<String>) -> Self {
        LexiqError::UnsupportedResultOperator {
            operator: operator.into(),
        }
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        LexiqError::Evaluation(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        LexiqError::InvalidArgument(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        LexiqError::InvalidConfig(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        LexiqError::Index(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        LexiqError::Internal(msg.into())
    }

    /// Wrap an arbitrary collaborator error.
    pub fn other(err: impl Into<anyhow::Error>) -> Self {
        LexiqError::Other(err.into())
    }

    /// Returns true for errors raised while lowering or translating a query.
    pub fn is_translation_error(&self) -> bool {
        matches!(
            self,
            LexiqError::UnsupportedOperator { .. }
                | LexiqError::NoFieldReferenceFound { .. }
                | LexiqError::BoostTarget { .. }
                | LexiqError::AmbiguousNullGuard { .. }
                | LexiqError::UnsupportedExpression { .. }
                | LexiqError::Evaluation(_)
        )
    }
}
