//! Error handling for the incident SDK
//!
//! This module provides the error system used across the SDK:
//! - Classifies every failed upstream attempt into exactly one kind
//! - Partitions kinds into retryable / terminal / cancelled for the dispatcher
//! - Converts transport-level errors at the boundary
//! - Provides a convenient Result type alias

use thiserror::Error;

pub mod mapping;

/// Result type for incident SDK operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Why an in-flight operation was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelKind {
    /// The caller's own cancellation signal fired.
    Caller,

    /// A newer operation of the same kind superseded this one.
    Superseded,
}

/// How the dispatcher must react to a failure.
///
/// The retry loop consults only this partition, never the error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth another attempt if budget remains.
    Retryable,

    /// Must not be retried; surfaced to the caller.
    Terminal,

    /// Propagated silently; neither retried nor reported as an error.
    Cancelled,
}

/// Main error type for the incident SDK
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// Transport failure before any response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt deadline elapsed before a response arrived
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Upstream responded with a 5xx status
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Upstream responded 429, optionally with a Retry-After hint
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Raw Retry-After header value, if the server sent one
        retry_after: Option<String>,
    },

    /// Any other non-2xx response; never retried
    #[error("Request rejected (HTTP {status}): {message}")]
    Client {
        status: u16,
        message: String,
        /// Structured field errors from the response body, if present
        details: Option<Vec<String>>,
    },

    /// A request or document failed a field-level invariant locally
    #[error("Validation error: {0}")]
    Validation(String),

    /// A 2xx response body could not be decoded
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation was abandoned before completing
    #[error("Operation cancelled")]
    Cancelled(CancelKind),
}

impl ServiceError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ServiceError::Network(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    /// Create a server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ServiceError::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<String>) -> Self {
        ServiceError::RateLimited {
            message: message.into(),
            retry_after,
        }
    }

    /// Create a client error
    pub fn client(status: u16, message: impl Into<String>, details: Option<Vec<String>>) -> Self {
        ServiceError::Client {
            status,
            message: message.into(),
            details,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        ServiceError::Parsing(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    /// Create a cancellation marker
    pub fn cancelled(kind: CancelKind) -> Self {
        ServiceError::Cancelled(kind)
    }

    /// Partition this error for the dispatcher.
    pub fn class(&self) -> FailureClass {
        match self {
            ServiceError::Network(_)
            | ServiceError::Timeout(_)
            | ServiceError::Server { .. }
            | ServiceError::RateLimited { .. } => FailureClass::Retryable,
            ServiceError::Client { .. }
            | ServiceError::Validation(_)
            | ServiceError::Parsing(_)
            | ServiceError::Configuration(_) => FailureClass::Terminal,
            ServiceError::Cancelled(_) => FailureClass::Cancelled,
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        self.class() == FailureClass::Retryable
    }

    /// Check if this is a cancellation rather than a genuine failure
    pub fn is_cancelled(&self) -> bool {
        self.class() == FailureClass::Cancelled
    }

    /// Get the HTTP status code if this error carries one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Server { status, .. } => Some(*status),
            ServiceError::Client { status, .. } => Some(*status),
            ServiceError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Structured field errors, for client failures that carry them
    pub fn details(&self) -> Option<&[String]> {
        match self {
            ServiceError::Client {
                details: Some(details),
                ..
            } => Some(details),
            _ => None,
        }
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ServiceError::network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            ServiceError::parsing(format!("Response decode error: {}", err))
        } else {
            ServiceError::network(format!("Transport error: {}", err))
        }
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::parsing(format!("JSON error: {}", err))
    }
}
