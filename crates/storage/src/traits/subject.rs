use async_trait::async_trait;
use assess_report_core::Subject;

use crate::error::StorageError;
use crate::types::{PaginatedResult, Pager, SubjectFilter};

/// Subject lookups.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Page of subjects matching `filter`, newest first, with the total match count.
    async fn query_subjects(
        &self,
        filter: &SubjectFilter,
        pager: Pager,
    ) -> Result<PaginatedResult<Subject>, StorageError>;

    /// Get subject by ID.
    async fn get_subject(&self, id: &str) -> Result<Option<Subject>, StorageError>;
}
