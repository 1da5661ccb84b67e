use dbcheck_core::EvalError;

/// Errors a [`Connection`](crate::Connection) implementation can return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The backend rejected or failed to run a statement.
    #[error("query failed: {message} (sql: {sql})")]
    Query { sql: String, message: String },

    /// A result set lacks a column the executor needs.
    #[error("column {column} not found in result set")]
    MissingColumn { column: String },

    /// A backend-specific error (connectivity, driver, type mapping, etc.).
    #[error("backend error: {0}")]
    Backend(String),
}

/// All errors an assertion run can end with.
///
/// Only [`AssertError::Mismatch`] is retryable, and only before the final
/// attempt; everything else stops the run immediately.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssertError {
    /// The assertion is assembled wrongly: missing table, no conditions,
    /// options out of range, unsupported comparator or filter.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An expected value can not be coerced into the observed value's type.
    #[error("data format error: {message}")]
    DataFormat { message: String },

    /// A condition evaluated false on the final attempt.
    #[error("{message}")]
    Mismatch { message: String },

    /// The filters matched no rows on the final attempt.
    #[error("Data records not found")]
    NotFound,

    /// The connection failed to run a query.
    #[error("execution error: {0}")]
    Execution(#[from] ConnectionError),
}

impl AssertError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AssertError::Configuration {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AssertError::Mismatch { .. })
    }
}

impl From<EvalError> for AssertError {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::Configuration { message } => AssertError::Configuration { message },
            EvalError::UnsupportedComparator { name } => AssertError::Configuration {
                message: format!("unsupported comparator: {}", name),
            },
            EvalError::DataFormat { message } => AssertError::DataFormat { message },
        }
    }
}
