use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{ReviewerFeedback, SubjectContent, SubjectUser, SubjectUserOutcome};

use crate::error::StorageError;

/// Batch reads of the rows hanging off subjects.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Teachers and students grouped by subject ID.
    async fn get_subject_users(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectUser>>, StorageError>;

    /// Reviewed content rows grouped by subject ID.
    async fn get_subject_contents(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectContent>>, StorageError>;

    /// Recorded outcome rows for the given subject users.
    async fn get_user_outcomes(
        &self,
        subject_user_ids: &[String],
    ) -> Result<Vec<SubjectUserOutcome>, StorageError>;

    /// Reviewer feedback grouped by subject user ID.
    async fn get_reviewer_feedbacks(
        &self,
        subject_user_ids: &[String],
    ) -> Result<HashMap<String, Vec<ReviewerFeedback>>, StorageError>;
}
