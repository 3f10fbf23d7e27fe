//! Unified storage backend with enum dispatch.

use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{ReviewerFeedback, Subject, SubjectContent, SubjectUser, SubjectUserOutcome};

use crate::error::StorageError;
use crate::memory::MemoryStorage;
use crate::traits::{AssessmentStore, SubjectStore, UpdateStore};
use crate::types::{PaginatedResult, Pager, SubjectFilter, SubjectUpdate};

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            StorageBackend::Memory(s) => <MemoryStorage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_storage::PgStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    Memory(MemoryStorage),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    #[must_use]
    pub fn new_memory() -> Self {
        Self::Memory(MemoryStorage::new())
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    /// The in-memory store, when this backend is one. Used to seed demo data.
    #[must_use]
    pub fn as_memory(&self) -> Option<&MemoryStorage> {
        match self {
            Self::Memory(s) => Some(s),
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => None,
        }
    }
}

// ── SubjectStore ─────────────────────────────────────────────────

#[async_trait]
impl SubjectStore for StorageBackend {
    async fn query_subjects(
        &self,
        filter: &SubjectFilter,
        pager: Pager,
    ) -> Result<PaginatedResult<Subject>, StorageError> {
        dispatch!(self, SubjectStore, query_subjects(filter, pager))
    }

    async fn get_subject(&self, id: &str) -> Result<Option<Subject>, StorageError> {
        dispatch!(self, SubjectStore, get_subject(id))
    }
}

// ── AssessmentStore ──────────────────────────────────────────────

#[async_trait]
impl AssessmentStore for StorageBackend {
    async fn get_subject_users(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectUser>>, StorageError> {
        dispatch!(self, AssessmentStore, get_subject_users(subject_ids))
    }

    async fn get_subject_contents(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectContent>>, StorageError> {
        dispatch!(self, AssessmentStore, get_subject_contents(subject_ids))
    }

    async fn get_user_outcomes(
        &self,
        subject_user_ids: &[String],
    ) -> Result<Vec<SubjectUserOutcome>, StorageError> {
        dispatch!(self, AssessmentStore, get_user_outcomes(subject_user_ids))
    }

    async fn get_reviewer_feedbacks(
        &self,
        subject_user_ids: &[String],
    ) -> Result<HashMap<String, Vec<ReviewerFeedback>>, StorageError> {
        dispatch!(self, AssessmentStore, get_reviewer_feedbacks(subject_user_ids))
    }
}

// ── UpdateStore ──────────────────────────────────────────────────

#[async_trait]
impl UpdateStore for StorageBackend {
    async fn update_subjects_tx(&self, update: &SubjectUpdate) -> Result<(), StorageError> {
        dispatch!(self, UpdateStore, update_subjects_tx(update))
    }
}
