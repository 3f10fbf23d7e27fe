use std::sync::Arc;

use assess_report_core::Subject;
use assess_report_storage::traits::SubjectStore;
use assess_report_storage::{Pager, StorageBackend, SubjectFilter};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::assembler::{assemble_detail, assemble_page};
use crate::config::ReportConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::report::{DetailReport, PageReport};
use crate::session::{AggregationSession, Providers, ReportMode};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Entry point for the report operations. Every call builds its own
/// [`AggregationSession`]; nothing is cached between calls.
#[derive(Clone)]
pub struct ReportService {
    pub(crate) storage: Arc<StorageBackend>,
    providers: Providers,
    config: ReportConfig,
    clock: Clock,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ReportService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, providers: Providers, config: ReportConfig) -> Self {
        Self { storage, providers, config, clock: Arc::new(Utc::now) }
    }

    /// Replaces the wall clock, e.g. to pin `now` in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// A fresh session over `subjects`, with `now` captured once.
    #[must_use]
    pub fn session(&self, subjects: Vec<Subject>, mode: ReportMode, cancel: &CancellationToken) -> AggregationSession {
        AggregationSession::new(
            subjects,
            mode,
            Arc::clone(&self.storage),
            self.providers.clone(),
            self.config,
            (self.clock)(),
            cancel.clone(),
        )
    }

    /// One page of subject reports, newest first.
    pub async fn page(
        &self,
        filter: &SubjectFilter,
        pager: Pager,
        cancel: &CancellationToken,
    ) -> ServiceResult<PageReport> {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        let pager = Pager::new(pager.page, pager.page_size.min(self.config.max_page_size));
        let result = self.storage.query_subjects(filter, pager).await?;
        let session = self.session(result.items, ReportMode::List, cancel);
        let items = assemble_page(&session).await?;
        tracing::debug!(
            total = result.total,
            page = pager.page,
            items = items.len(),
            cached = session.cached_resources(),
            "page assembled"
        );
        Ok(PageReport { total: result.total, page: pager.page, page_size: pager.page_size, items })
    }

    pub async fn get_detail(&self, subject_id: &str, cancel: &CancellationToken) -> ServiceResult<DetailReport> {
        let subject = self.load_subject(subject_id, cancel).await?;
        let session = self.session(vec![subject.clone()], ReportMode::Detail, cancel);
        assemble_detail(&session, &subject).await
    }

    pub(crate) async fn load_subject(&self, subject_id: &str, cancel: &CancellationToken) -> ServiceResult<Subject> {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        self.storage
            .get_subject(subject_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound { entity: "subject", id: subject_id.to_owned() })
    }
}
