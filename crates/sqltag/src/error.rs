//! Error types for sqltag

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sqltag operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while composing, transposing or executing a query
#[derive(Debug, Error)]
pub enum SqlError {
    /// A template was built from zero literal segments
    #[error("expected at least one literal segment")]
    MissingLiterals,

    /// Literal segments and interpolated values do not line up
    #[error("expected {literals} literal segments to have {expected} values, got {found}")]
    ValueCountMismatch {
        literals: usize,
        expected: usize,
        found: usize,
    },

    /// Array parameters of a bulk query disagree on the row count
    #[error(
        "all array parameters must be the same length: expected {expected}, parameter {position} has {found}"
    )]
    ColumnLengthMismatch {
        expected: usize,
        found: usize,
        /// 1-based position of the offending parameter.
        position: usize,
    },

    /// `join` over an empty list under `EmptyJoinPolicy::Error`
    #[error("cannot join an empty list")]
    EmptyJoin,

    /// Connection settings cannot identify a database
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Pool creation, acquisition or teardown error
    #[error("Pool error: {0}")]
    Pool(String),

    /// An operation did not finish in time
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Error reported by the execution transport
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SqlError {
    /// Create a pool error
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error comes from inconsistent bulk parameters
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::ColumnLengthMismatch { .. })
    }

    /// Check if this error was raised while building a template
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::MissingLiterals | Self::ValueCountMismatch { .. } | Self::EmptyJoin
        )
    }
}
