//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by domain concern.

#![allow(clippy::absolute_paths, reason = "std paths in error handling are clear")]

mod assessment;
mod subjects;
mod update;

use assess_report_core::constants::{
    PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS,
};
use assess_report_core::{
    OutcomeKey, ReviewerFeedback, Subject, SubjectContent, SubjectUser, SubjectUserOutcome,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::StorageError;

use super::pg_migrations::run_pg_migrations;

pub(crate) const SUBJECT_COLUMNS: &str =
    "id, kind, schedule_id, title, status, created_at, completed_at, migration_flag";

pub(crate) const USER_COLUMNS: &str =
    "id, assessment_id, user_id, user_type, status_by_user, status_by_system";

pub(crate) const CONTENT_COLUMNS: &str =
    "id, assessment_id, content_id, content_type, status, reviewer_comment";

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

pub(crate) fn row_to_subject(row: &PgRow) -> Result<Subject, StorageError> {
    Ok(Subject {
        id: row.try_get("id")?,
        kind: row.try_get::<String, _>("kind")?.parse()?,
        schedule_id: row.try_get("schedule_id")?,
        title: row.try_get("title")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
        migration_flag: row.try_get::<String, _>("migration_flag")?.parse()?,
    })
}

pub(crate) fn row_to_subject_user(row: &PgRow) -> Result<SubjectUser, StorageError> {
    Ok(SubjectUser {
        id: row.try_get("id")?,
        subject_id: row.try_get("assessment_id")?,
        user_id: row.try_get("user_id")?,
        user_type: row.try_get::<String, _>("user_type")?.parse()?,
        status_by_user: row.try_get::<String, _>("status_by_user")?.parse()?,
        status_by_system: row.try_get::<String, _>("status_by_system")?.parse()?,
    })
}

pub(crate) fn row_to_subject_content(row: &PgRow) -> Result<SubjectContent, StorageError> {
    Ok(SubjectContent {
        id: row.try_get("id")?,
        subject_id: row.try_get("assessment_id")?,
        content_id: row.try_get("content_id")?,
        content_type: row.try_get::<String, _>("content_type")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        reviewer_comment: row.try_get("reviewer_comment")?,
    })
}

pub(crate) fn row_to_outcome(row: &PgRow) -> Result<SubjectUserOutcome, StorageError> {
    Ok(SubjectUserOutcome {
        key: OutcomeKey {
            subject_user_id: row.try_get("assessment_user_id")?,
            subject_content_id: row.try_get("assessment_content_id")?,
            outcome_id: row.try_get("outcome_id")?,
        },
        status: row.try_get::<String, _>("status")?.parse()?,
    })
}

pub(crate) fn row_to_reviewer_feedback(row: &PgRow) -> Result<ReviewerFeedback, StorageError> {
    Ok(ReviewerFeedback {
        subject_user_id: row.try_get("assessment_user_id")?,
        student_feedback_id: row.try_get("student_feedback_id")?,
        reviewer_comment: row.try_get("reviewer_comment")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}
