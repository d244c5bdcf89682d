//! Error types for cqlkit.

use thiserror::Error;

/// The main error type for cqlkit operations.
#[derive(Debug, Error)]
pub enum CqlError {
    /// A named column does not exist in the schema it was looked up in.
    #[error("Reference error: {0}")]
    Reference(String),

    /// A value or declaration does not have the expected type.
    #[error("Type error: {0}")]
    Type(String),

    /// A required argument is absent or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An existing binding would be silently replaced.
    #[error("Invariant error: {0}")]
    Invariant(String),

    /// Failed to parse a column type expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// The execution collaborator rejected a statement.
    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CqlError {
    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for cqlkit operations.
pub type CqlResult<T> = Result<T, CqlError>;
