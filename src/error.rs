use thiserror::Error;

/// Errors surfaced by the call agent and its collaborators
#[derive(Error, Debug)]
pub enum Error {
    // Dependency errors (classified by the dependency itself)
    #[error("Transient failure from {service}: {message}")]
    Transient { service: String, message: String },

    #[error("Permanent failure from {service}: {message}")]
    Permanent { service: String, message: String },

    // Circuit breaker errors
    #[error("Circuit breaker open for service: {service}")]
    CircuitBreakerOpen { service: String },

    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // I/O errors (potentially transient)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML encoding error: {0}")]
    Toml(#[from] toml::ser::Error),

    // Network errors (transient - should retry)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error categorization for retry strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Permanent errors - should not retry
    Permanent,
    /// Transient errors - safe to retry
    Transient,
    /// Circuit breaker refused the call - stop retrying temporarily
    CircuitBreaker,
}

impl Error {
    /// Build a retryable error for `service`
    pub fn transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Build a non-retryable error for `service`
    pub fn permanent(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permanent {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Categorize error for retry logic
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Permanent { .. }
            | Self::InvalidConfig { .. }
            | Self::Config(_)
            | Self::Serde(_)
            | Self::Toml(_) => ErrorCategory::Permanent,

            Self::CircuitBreakerOpen { .. } => ErrorCategory::CircuitBreaker,

            Self::Transient { .. } | Self::Io(_) | Self::Http(_) => ErrorCategory::Transient,
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }

    /// Name of the service that produced the error, when known
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Transient { service, .. }
            | Self::Permanent { service, .. }
            | Self::CircuitBreakerOpen { service } => Some(service),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
