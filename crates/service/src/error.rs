//! Typed error enum for the service layer.
//!
//! Unifies repository and provider failures with the request-level failure
//! kinds (not found, invalid arguments, already complete, cancelled), so HTTP
//! handlers can match on them instead of parsing messages.

use assess_report_core::ProviderError;
use assess_report_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A subject or one of its required records does not exist.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed request: unknown enum value, unknown student or content,
    /// or a completion attempted before the window elapsed.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Mutation attempted on a finalized subject.
    #[error("subject {0} is already complete")]
    AlreadyComplete(String),

    /// A required external provider call failed.
    #[error("{provider} provider: {source}")]
    Dependency {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },

    /// Repository operation failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying by the caller).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Dependency { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Storage(StorageError::NotFound { .. })
                | Self::Dependency { source: ProviderError::NotFound { .. }, .. }
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }
}

/// Adapter for `map_err` on provider calls.
pub(crate) fn dependency(provider: &'static str) -> impl FnOnce(ProviderError) -> ServiceError {
    move |source| ServiceError::Dependency { provider, source }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
