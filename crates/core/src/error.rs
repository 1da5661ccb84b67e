/// Errors raised while building or evaluating conditions.
///
/// None of these are retryable: each one describes a caller mistake that a
/// later polling attempt cannot fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The assertion is assembled wrongly (missing column, comparator applied
    /// to a value shape it cannot handle, bad option range, ...).
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An expected value cannot be coerced into the actual value's type.
    #[error("data format error: {message}")]
    DataFormat { message: String },

    /// A comparator tag that does not name any known comparator.
    #[error("unsupported comparator: {name}")]
    UnsupportedComparator { name: String },
}

impl EvalError {
    pub fn configuration(message: impl Into<String>) -> Self {
        EvalError::Configuration {
            message: message.into(),
        }
    }

    pub fn data_format(message: impl Into<String>) -> Self {
        EvalError::DataFormat {
            message: message.into(),
        }
    }
}
