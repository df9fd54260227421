use std::fmt;

/// Fatal error classes raised by the imputation engine. Configuration and
/// format errors are detected before or while reading input; consistency
/// errors indicate a bug in an upstream component and are reported at
/// window entry; writer state errors are programming errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImputationError {
    ConfigError(String),
    FormatError(String),
    ConsistencyError(String),
    WriterStateError(String),
}

impl fmt::Display for ImputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputationError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ImputationError::FormatError(msg) => write!(f, "Format error: {}", msg),
            ImputationError::ConsistencyError(msg) => write!(f, "Consistency error: {}", msg),
            ImputationError::WriterStateError(msg) => write!(f, "Writer state error: {}", msg),
        }
    }
}

impl std::error::Error for ImputationError {}
