//! Error types for Breakwater

use thiserror::Error;

/// Result type alias for Breakwater operations
pub type BreakwaterResult<T> = Result<T, BreakwaterError>;

/// Errors raised while building breakers or loading their configuration.
///
/// Failures of a protected call are never reported through this type; see
/// [`CircuitBreakerError`](crate::circuit_breaker::CircuitBreakerError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BreakwaterError {
    /// Invalid circuit breaker configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        field: Option<String>,
    },

    /// Configuration text could not be read or parsed
    #[error("Parse error: {message}")]
    Parse { message: String },
}

impl BreakwaterError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error pointing at a specific field
    pub fn config_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Name of the offending configuration field, if known
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Config { field, .. } => field.as_deref(),
            Self::Parse { .. } => None,
        }
    }
}

impl From<toml::de::Error> for BreakwaterError {
    fn from(error: toml::de::Error) -> Self {
        Self::parse(error.to_string())
    }
}
