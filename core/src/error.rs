//! Structured error types for Sherwood
//!
//! Every failure a run can hit falls into one of three families:
//! configuration (fatal at start-up), validation (rejected before any
//! request is sent) and upstream (names the backend that failed).

use std::time::Duration;
use thiserror::Error;

use crate::llm::BackendId;

/// Why an upstream call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCause {
    /// Could not reach the provider at all
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials rejected (401/403)
    #[error("authentication failed ({status})")]
    Unauthorized { status: u16 },

    /// Quota or rate limit hit (429)
    #[error("quota or rate limit exceeded")]
    Quota,

    /// Prompt or answer blocked by the provider's content filter
    #[error("content blocked: {reason}")]
    ContentFiltered { reason: String },

    /// Provider returned a non-success status
    #[error("provider error {status}: {message}")]
    Provider { status: u16, message: String },

    /// Response decoded but lacked the fields we need
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Primary error type for Sherwood operations
#[derive(Error, Debug)]
pub enum SherwoodError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Missing required config or secret
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // =========================================================================
    // User Input Errors
    // =========================================================================
    /// Rejected before any remote call was issued
    #[error("invalid input: {message}")]
    Validation { message: String },

    // =========================================================================
    // Provider / API Errors
    // =========================================================================
    /// A backend call failed
    #[error("{backend} failed: {cause}")]
    Upstream {
        backend: BackendId,
        cause: UpstreamCause,
    },

    /// A backend call did not answer in time
    #[error("{backend} timed out after {after:?}")]
    Timeout { backend: BackendId, after: Duration },

    /// Notification sink rejected the message
    #[error("notification failed: {message}")]
    Notification { message: String },

    // =========================================================================
    // External Error Wrappers
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("template error: {0}")]
    Template(String),
}

impl SherwoodError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn upstream(backend: BackendId, cause: UpstreamCause) -> Self {
        Self::Upstream { backend, cause }
    }

    /// Backend responsible for the error, if any
    pub fn backend(&self) -> Option<BackendId> {
        match self {
            Self::Upstream { backend, .. } | Self::Timeout { backend, .. } => Some(*backend),
            _ => None,
        }
    }

    /// Check if error is transient. Runs never retry; this only shapes the message.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Upstream { cause, .. } => match cause {
                UpstreamCause::Transport(_) | UpstreamCause::Quota => true,
                UpstreamCause::Provider { status, .. } => matches!(status, 500 | 502 | 503 | 504),
                UpstreamCause::Unauthorized { .. }
                | UpstreamCause::ContentFiltered { .. }
                | UpstreamCause::Malformed(_) => false,
            },
            Self::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut
            ),
            Self::MissingConfig { .. }
            | Self::InvalidConfig { .. }
            | Self::Validation { .. }
            | Self::Notification { .. }
            | Self::Json(_)
            | Self::Template(_) => false,
        }
    }

    /// Check if error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Self::MissingConfig { .. }
                | Self::InvalidConfig { .. }
                | Self::Validation { .. }
                | Self::Upstream {
                    cause: UpstreamCause::Unauthorized { .. },
                    ..
                }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingConfig { key } => {
                format!("{} is not set. Export it before starting Sherwood.", key)
            }
            Self::Upstream {
                backend,
                cause: UpstreamCause::Unauthorized { .. },
            } => format!("{} rejected the API key. Please check your credentials.", backend),
            Self::Upstream {
                backend,
                cause: UpstreamCause::Quota,
            } => format!("{} is rate limited or out of quota. Try again later.", backend),
            Self::Upstream { backend, .. } => {
                format!("Error occurred when running {}: {}", backend, self)
            }
            Self::Timeout { backend, after } => {
                format!("{} did not answer within {} seconds.", backend, after.as_secs())
            }
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for SherwoodError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<tera::Error> for SherwoodError {
    fn from(err: tera::Error) -> Self {
        Self::Template(err.to_string())
    }
}

/// Result type alias using SherwoodError
pub type Result<T> = std::result::Result<T, SherwoodError>;

/// Extension trait for converting Option to Result with SherwoodError
pub trait OptionExt<T> {
    fn ok_or_missing(self, key: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, key: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| SherwoodError::MissingConfig { key: key.into() })
    }
}
