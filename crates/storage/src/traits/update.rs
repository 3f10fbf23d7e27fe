use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::SubjectUpdate;

/// Atomic subject mutations.
#[async_trait]
pub trait UpdateStore: Send + Sync {
    /// Apply the whole change set in one transaction: subject status, subject
    /// users, content upserts, outcome upserts and reviewer feedback. Either
    /// everything is written or nothing is.
    async fn update_subjects_tx(&self, update: &SubjectUpdate) -> Result<(), StorageError>;
}
