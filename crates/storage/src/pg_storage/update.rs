//! UpdateStore implementation for PgStorage.

use async_trait::async_trait;

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::UpdateStore;
use crate::types::SubjectUpdate;

#[async_trait]
impl UpdateStore for PgStorage {
    async fn update_subjects_tx(&self, update: &SubjectUpdate) -> Result<(), StorageError> {
        // Dropping `tx` on any early return rolls the whole change set back.
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE assessments SET status = $1, completed_at = $2 WHERE id = $3",
        )
        .bind(update.status.as_str())
        .bind(update.completed_at)
        .bind(&update.subject_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "subject", id: update.subject_id.clone() });
        }

        for change in &update.users {
            let updated = sqlx::query(
                "UPDATE assessment_users SET status_by_user = $1 WHERE id = $2 AND assessment_id = $3",
            )
            .bind(change.status_by_user.as_str())
            .bind(&change.subject_user_id)
            .bind(&update.subject_id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(StorageError::NotFound {
                    entity: "subject_user",
                    id: change.subject_user_id.clone(),
                });
            }
        }

        for content in &update.contents {
            sqlx::query(
                "INSERT INTO assessment_contents
                   (id, assessment_id, content_id, content_type, status, reviewer_comment)
                 VALUES ($1,$2,$3,$4,$5,$6)
                 ON CONFLICT (assessment_id, content_id) DO UPDATE SET
                   content_type = EXCLUDED.content_type,
                   status = EXCLUDED.status,
                   reviewer_comment = EXCLUDED.reviewer_comment",
            )
            .bind(&content.id)
            .bind(&content.subject_id)
            .bind(&content.content_id)
            .bind(content.content_type.as_str())
            .bind(content.status.as_str())
            .bind(&content.reviewer_comment)
            .execute(&mut *tx)
            .await?;
        }

        for outcome in &update.outcomes {
            sqlx::query(
                "INSERT INTO assessment_user_outcomes
                   (assessment_user_id, assessment_content_id, outcome_id, status)
                 VALUES ($1,$2,$3,$4)
                 ON CONFLICT (assessment_user_id, assessment_content_id, outcome_id)
                 DO UPDATE SET status = EXCLUDED.status",
            )
            .bind(&outcome.key.subject_user_id)
            .bind(&outcome.key.subject_content_id)
            .bind(&outcome.key.outcome_id)
            .bind(outcome.status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for feedback in &update.reviewer_feedbacks {
            sqlx::query(
                "INSERT INTO reviewer_feedbacks
                   (assessment_user_id, student_feedback_id, reviewer_comment, reviewed_at)
                 VALUES ($1,$2,$3,$4)
                 ON CONFLICT (assessment_user_id, student_feedback_id) DO UPDATE SET
                   reviewer_comment = EXCLUDED.reviewer_comment,
                   reviewed_at = EXCLUDED.reviewed_at",
            )
            .bind(&feedback.subject_user_id)
            .bind(&feedback.student_feedback_id)
            .bind(&feedback.reviewer_comment)
            .bind(feedback.reviewed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(subject_id = %update.subject_id, status = %update.status, "committed subject update");
        Ok(())
    }
}
