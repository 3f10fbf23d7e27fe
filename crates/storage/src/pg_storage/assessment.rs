//! AssessmentStore implementation for PgStorage.

use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{ReviewerFeedback, SubjectContent, SubjectUser, SubjectUserOutcome};

use super::{
    CONTENT_COLUMNS, PgStorage, USER_COLUMNS, row_to_outcome, row_to_reviewer_feedback,
    row_to_subject_content, row_to_subject_user,
};
use crate::error::StorageError;
use crate::traits::AssessmentStore;

#[async_trait]
impl AssessmentStore for PgStorage {
    async fn get_subject_users(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectUser>>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM assessment_users WHERE assessment_id = ANY($1) ORDER BY id"
        ))
        .bind(subject_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<SubjectUser>> = HashMap::new();
        for row in &rows {
            let user = row_to_subject_user(row)?;
            grouped.entry(user.subject_id.clone()).or_default().push(user);
        }
        Ok(grouped)
    }

    async fn get_subject_contents(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectContent>>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTENT_COLUMNS} FROM assessment_contents WHERE assessment_id = ANY($1) ORDER BY id"
        ))
        .bind(subject_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<SubjectContent>> = HashMap::new();
        for row in &rows {
            let content = row_to_subject_content(row)?;
            grouped.entry(content.subject_id.clone()).or_default().push(content);
        }
        Ok(grouped)
    }

    async fn get_user_outcomes(
        &self,
        subject_user_ids: &[String],
    ) -> Result<Vec<SubjectUserOutcome>, StorageError> {
        let rows = sqlx::query(
            "SELECT assessment_user_id, assessment_content_id, outcome_id, status
             FROM assessment_user_outcomes WHERE assessment_user_id = ANY($1)",
        )
        .bind(subject_user_ids)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_outcome).collect()
    }

    async fn get_reviewer_feedbacks(
        &self,
        subject_user_ids: &[String],
    ) -> Result<HashMap<String, Vec<ReviewerFeedback>>, StorageError> {
        let rows = sqlx::query(
            "SELECT assessment_user_id, student_feedback_id, reviewer_comment, reviewed_at
             FROM reviewer_feedbacks WHERE assessment_user_id = ANY($1)
             ORDER BY reviewed_at DESC NULLS LAST",
        )
        .bind(subject_user_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<ReviewerFeedback>> = HashMap::new();
        for row in &rows {
            let feedback = row_to_reviewer_feedback(row)?;
            grouped.entry(feedback.subject_user_id.clone()).or_default().push(feedback);
        }
        Ok(grouped)
    }
}
