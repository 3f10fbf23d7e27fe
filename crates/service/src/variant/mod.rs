//! Derived attributes per subject kind.
//!
//! Every kind implements [`VariantStrategy`]. The trait's provided methods
//! hold the rules most kinds share; a kind overrides only what differs, and
//! reuses another kind's rule by calling that kind's strategy directly.
//! Every method takes a group of subjects of the strategy's kind and returns
//! a map keyed by subject id; subjects whose inputs are missing are absent.

mod offline_class;
mod offline_study;
mod online_class;
mod online_study;
mod review_study;
pub(crate) mod shared;

use assess_report_core::{Subject, SubjectKind};
use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::report::{ContentRow, NamedRef, OutcomeReport, ScheduleRef, StudentContents, StudentRow};
use crate::session::{AggregationSession, ById};

pub use offline_class::OfflineClass;
pub use offline_study::OfflineStudy;
pub use online_class::OnlineClass;
pub use online_study::OnlineStudy;
pub use review_study::ReviewStudy;
pub use shared::remaining_secs;

#[async_trait]
pub trait VariantStrategy: Send + Sync {
    fn kind(&self) -> SubjectKind;

    /// Completing a subject of this kind is refused while time remains.
    fn completion_requires_elapsed_window(&self) -> bool {
        self.kind().is_study()
    }

    /// Whether scores and comments for this kind live in a live room.
    fn uses_room(&self) -> bool {
        true
    }

    async fn schedule(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<ScheduleRef>> {
        shared::schedule(session, subjects).await
    }

    async fn teacher(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<Vec<NamedRef>>> {
        shared::teachers(session, subjects, true).await
    }

    async fn lesson_plan(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<NamedRef>> {
        shared::lesson_plan(session, subjects).await
    }

    async fn program(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<NamedRef>> {
        shared::program(session, subjects).await
    }

    async fn subject_area(
        &self,
        session: &AggregationSession,
        subjects: &[&Subject],
    ) -> ServiceResult<ById<Vec<NamedRef>>> {
        shared::subject_area(session, subjects).await
    }

    async fn class(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<Vec<NamedRef>>> {
        shared::class(session, subjects).await
    }

    /// Ratio in `0..=1` of the work done by participating students.
    async fn complete_rate(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<f64>>;

    async fn remaining_time(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<i64>> {
        shared::remaining_time(session, subjects).await
    }

    async fn outcomes(
        &self,
        session: &AggregationSession,
        subjects: &[&Subject],
    ) -> ServiceResult<ById<Vec<OutcomeReport>>> {
        shared::outcomes(session, subjects).await
    }

    async fn contents(
        &self,
        session: &AggregationSession,
        subjects: &[&Subject],
    ) -> ServiceResult<ById<Vec<ContentRow>>> {
        shared::contents(session, subjects).await
    }

    async fn students(
        &self,
        session: &AggregationSession,
        subjects: &[&Subject],
    ) -> ServiceResult<ById<Vec<StudentRow>>> {
        shared::room_students(session, subjects).await
    }

    /// Per-student content rows, for kinds where students work on
    /// different contents.
    async fn diff_content_students(
        &self,
        _session: &AggregationSession,
        subjects: &[&Subject],
    ) -> ServiceResult<ById<Vec<StudentContents>>> {
        Ok(subjects.iter().map(|s| (s.id.clone(), Vec::new())).collect())
    }

    async fn anyone_attempted(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<bool>> {
        shared::room_attempted(session, subjects).await
    }
}

/// The strategy for a kind.
#[must_use]
pub fn strategy_for(kind: SubjectKind) -> &'static dyn VariantStrategy {
    match kind {
        SubjectKind::OnlineClass => &OnlineClass,
        SubjectKind::OfflineClass => &OfflineClass,
        SubjectKind::OnlineStudy => &OnlineStudy,
        SubjectKind::OfflineStudy => &OfflineStudy,
        SubjectKind::ReviewStudy => &ReviewStudy,
    }
}
