//! SubjectStore implementation for PgStorage.

use async_trait::async_trait;
use assess_report_core::Subject;
use sqlx::Row;

use super::{PgStorage, SUBJECT_COLUMNS, row_to_subject};
use crate::error::StorageError;
use crate::traits::SubjectStore;
use crate::types::{PaginatedResult, Pager, SubjectFilter};

const FILTER_CLAUSE: &str = "
    WHERE (cardinality($1::text[]) = 0 OR a.kind = ANY($1))
      AND (cardinality($2::text[]) = 0 OR a.status = ANY($2))
      AND ($3::text IS NULL OR EXISTS (
            SELECT 1 FROM assessment_users u
            WHERE u.assessment_id = a.id AND u.user_type = 'teacher' AND u.user_id = $3))
      AND ($4::text IS NULL OR a.title ILIKE '%' || $4 || '%')";

fn wire_names<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl SubjectStore for PgStorage {
    async fn query_subjects(
        &self,
        filter: &SubjectFilter,
        pager: Pager,
    ) -> Result<PaginatedResult<Subject>, StorageError> {
        let kinds = wire_names(&filter.kinds);
        let statuses = wire_names(&filter.statuses);
        let title = filter.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let limit = i64::try_from(pager.limit()).map_err(|e| StorageError::corrupt("page size", e))?;
        let offset = i64::try_from(pager.offset()).map_err(|e| StorageError::corrupt("page offset", e))?;

        let total: i64 =
            sqlx::query(&format!("SELECT COUNT(*) AS total FROM assessments a {FILTER_CLAUSE}"))
                .bind(&kinds)
                .bind(&statuses)
                .bind(filter.teacher_id.as_deref())
                .bind(title)
                .fetch_one(&self.pool)
                .await?
                .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM assessments a {FILTER_CLAUSE}
             ORDER BY a.created_at DESC, a.id ASC
             LIMIT $5 OFFSET $6"
        ))
        .bind(&kinds)
        .bind(&statuses)
        .bind(filter.teacher_id.as_deref())
        .bind(title)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(row_to_subject).collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResult {
            items,
            total: u64::try_from(total).unwrap_or(0),
            offset: pager.offset() as u64,
            limit: pager.limit() as u64,
        })
    }

    async fn get_subject(&self, id: &str) -> Result<Option<Subject>, StorageError> {
        let row = sqlx::query(&format!("SELECT {SUBJECT_COLUMNS} FROM assessments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_subject(&r)).transpose()
    }
}
