//! PostgreSQL schema migrations for the assessment tables.

use sqlx::PgPool;

use crate::error::StorageError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS assessments (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        schedule_id TEXT NOT NULL,
        title TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'not_started',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        completed_at TIMESTAMPTZ,
        migration_flag TEXT NOT NULL DEFAULT 'current'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_assessments_created ON assessments (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_assessments_schedule ON assessments (schedule_id)",
    r#"
    CREATE TABLE IF NOT EXISTS assessment_users (
        id TEXT PRIMARY KEY,
        assessment_id TEXT NOT NULL REFERENCES assessments (id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        user_type TEXT NOT NULL,
        status_by_user TEXT NOT NULL DEFAULT 'participate',
        status_by_system TEXT NOT NULL DEFAULT 'participate',
        UNIQUE (assessment_id, user_id, user_type)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_assessment_users_user ON assessment_users (user_id, user_type)",
    r#"
    CREATE TABLE IF NOT EXISTS assessment_contents (
        id TEXT PRIMARY KEY,
        assessment_id TEXT NOT NULL REFERENCES assessments (id) ON DELETE CASCADE,
        content_id TEXT NOT NULL,
        content_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'covered',
        reviewer_comment TEXT NOT NULL DEFAULT '',
        UNIQUE (assessment_id, content_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assessment_user_outcomes (
        assessment_user_id TEXT NOT NULL REFERENCES assessment_users (id) ON DELETE CASCADE,
        assessment_content_id TEXT NOT NULL,
        outcome_id TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'unknown',
        PRIMARY KEY (assessment_user_id, assessment_content_id, outcome_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviewer_feedbacks (
        assessment_user_id TEXT NOT NULL REFERENCES assessment_users (id) ON DELETE CASCADE,
        student_feedback_id TEXT NOT NULL,
        reviewer_comment TEXT NOT NULL DEFAULT '',
        reviewed_at TIMESTAMPTZ,
        PRIMARY KEY (assessment_user_id, student_feedback_id)
    )
    "#,
];

/// Run all PostgreSQL migrations. Every statement is idempotent.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
    }
    tracing::debug!(statements = SCHEMA.len(), "PostgreSQL schema up to date");
    Ok(())
}
