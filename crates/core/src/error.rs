//! Typed error enums shared by collaborator implementations.
//!
//! Provider traits return [`ProviderError`] so the service layer can tell a
//! missing entity from a transport failure without downcasting.

use thiserror::Error;

/// Errors raised by external provider collaborators (schedule, catalog,
/// directory, live session).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status.
    #[error("provider status {code}: {body}")]
    Status { code: u16, body: String },

    /// Response body could not be decoded into the domain type.
    #[error("decode error in {context}: {message}")]
    Decode { context: String, message: String },

    /// Provider reported that a requested entity does not exist.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Provider rejected the request as malformed.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// Whether this error is likely transient (worth retrying by the provider client).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode { context: "JSON".to_owned(), message: err.to_string() }
    }
}

/// Errors produced while parsing domain values from their wire names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

impl CoreError {
    pub(crate) fn invalid(field: &'static str, value: &str) -> Self {
        Self::InvalidValue { field, value: value.to_owned() }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
