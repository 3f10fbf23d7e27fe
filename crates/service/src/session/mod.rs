//! Per-request aggregation session.
//!
//! An [`AggregationSession`] owns one batch of subjects and lazily fetches
//! every raw collection it needs exactly once, keyed by the id sets derived
//! from that batch. Derived views (content sources, room trees, score
//! roll-ups) are memoized the same way. Nothing is shared between sessions.

mod content_source;
mod memo;
mod raw;
mod room;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use assess_report_core::{
    CatalogProvider, ClassInfo, ContentView, DirectoryProvider, LiveSessionProvider, Outcome,
    OutcomeKey, OutcomeStatus, Program, ReviewerFeedback, RoomInfo, Schedule, ScheduleProvider,
    ScheduleRelation, StudentFeedback, StudentReview, Subject, SubjectArea, SubjectContent,
    SubjectKind, SubjectUser, User,
};
use assess_report_storage::StorageBackend;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::ReportConfig;
use crate::error::{ServiceError, ServiceResult};

pub use content_source::{ContentResolution, ContentSource};
pub(crate) use memo::Memo;
pub use room::{StudentScores, SubjectRoom};

pub type ById<T> = HashMap<String, T>;

/// Which reply the session is assembling. Detail replies skip directory
/// name lookups for teachers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    List,
    Detail,
}

/// External collaborators, injected at construction.
#[derive(Clone)]
pub struct Providers {
    pub schedules: Arc<dyn ScheduleProvider>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub directory: Arc<dyn DirectoryProvider>,
    pub live: Arc<dyn LiveSessionProvider>,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Caches {
    schedules: Memo<ById<Schedule>>,
    schedule_relations: Memo<ById<Vec<ScheduleRelation>>>,
    student_reviews: Memo<ById<Vec<StudentReview>>>,
    student_feedbacks: Memo<ById<Vec<StudentFeedback>>>,
    subject_users: Memo<ById<Vec<SubjectUser>>>,
    subject_contents: Memo<ById<Vec<SubjectContent>>>,
    user_outcomes: Memo<HashMap<OutcomeKey, OutcomeStatus>>,
    reviewer_feedbacks: Memo<ById<Vec<ReviewerFeedback>>>,
    programs: Memo<ById<Program>>,
    subject_areas: Memo<ById<SubjectArea>>,
    classes: Memo<ById<ClassInfo>>,
    users: Memo<ById<User>>,
    latest_content_ids: Memo<ById<String>>,
    latest_plans: Memo<ById<ContentView>>,
    latest_materials: Memo<ById<ContentView>>,
    review_contents: Memo<ById<ContentView>>,
    outcomes: Memo<ById<Outcome>>,
    room_infos: Memo<ById<RoomInfo>>,
    content_sources: Memo<ById<ContentResolution>>,
    room_trees: Memo<ById<SubjectRoom>>,
    room_scores: Memo<ById<StudentScores>>,
    room_comments: Memo<ById<ById<Vec<String>>>>,
}

impl Caches {
    fn new() -> Self {
        Self {
            schedules: Memo::new("schedules"),
            schedule_relations: Memo::new("schedule_relations"),
            student_reviews: Memo::new("student_reviews"),
            student_feedbacks: Memo::new("student_feedbacks"),
            subject_users: Memo::new("subject_users"),
            subject_contents: Memo::new("subject_contents"),
            user_outcomes: Memo::new("user_outcomes"),
            reviewer_feedbacks: Memo::new("reviewer_feedbacks"),
            programs: Memo::new("programs"),
            subject_areas: Memo::new("subject_areas"),
            classes: Memo::new("classes"),
            users: Memo::new("users"),
            latest_content_ids: Memo::new("latest_content_ids"),
            latest_plans: Memo::new("latest_plans"),
            latest_materials: Memo::new("latest_materials"),
            review_contents: Memo::new("review_contents"),
            outcomes: Memo::new("outcomes"),
            room_infos: Memo::new("room_infos"),
            content_sources: Memo::new("content_sources"),
            room_trees: Memo::new("room_trees"),
            room_scores: Memo::new("room_scores"),
            room_comments: Memo::new("room_comments"),
        }
    }

    fn ready_count(&self) -> usize {
        [
            self.schedules.is_ready(),
            self.schedule_relations.is_ready(),
            self.student_reviews.is_ready(),
            self.student_feedbacks.is_ready(),
            self.subject_users.is_ready(),
            self.subject_contents.is_ready(),
            self.user_outcomes.is_ready(),
            self.reviewer_feedbacks.is_ready(),
            self.programs.is_ready(),
            self.subject_areas.is_ready(),
            self.classes.is_ready(),
            self.users.is_ready(),
            self.latest_content_ids.is_ready(),
            self.latest_plans.is_ready(),
            self.latest_materials.is_ready(),
            self.review_contents.is_ready(),
            self.outcomes.is_ready(),
            self.room_infos.is_ready(),
            self.content_sources.is_ready(),
            self.room_trees.is_ready(),
            self.room_scores.is_ready(),
            self.room_comments.is_ready(),
        ]
        .into_iter()
        .filter(|ready| *ready)
        .count()
    }
}

pub struct AggregationSession {
    subjects: Vec<Subject>,
    mode: ReportMode,
    storage: Arc<StorageBackend>,
    providers: Providers,
    config: ReportConfig,
    now: DateTime<Utc>,
    cancel: CancellationToken,
    cache: Caches,
}

impl std::fmt::Debug for AggregationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationSession")
            .field("subjects", &self.subjects.len())
            .field("mode", &self.mode)
            .field("now", &self.now)
            .field("cached_resources", &self.cache.ready_count())
            .finish_non_exhaustive()
    }
}

impl AggregationSession {
    #[must_use]
    pub fn new(
        subjects: Vec<Subject>,
        mode: ReportMode,
        storage: Arc<StorageBackend>,
        providers: Providers,
        config: ReportConfig,
        now: DateTime<Utc>,
        cancel: CancellationToken,
    ) -> Self {
        Self { subjects, mode, storage, providers, config, now, cancel, cache: Caches::new() }
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub const fn mode(&self) -> ReportMode {
        self.mode
    }

    #[must_use]
    pub const fn providers(&self) -> &Providers {
        &self.providers
    }

    #[must_use]
    pub const fn config(&self) -> &ReportConfig {
        &self.config
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of resources fetched or derived so far.
    #[must_use]
    pub fn cached_resources(&self) -> usize {
        self.cache.ready_count()
    }

    fn subject_ids(&self) -> Vec<String> {
        dedup(self.subjects.iter().map(|s| s.id.as_str()))
    }

    /// Distinct schedule ids of subjects accepted by `kinds`.
    fn schedule_ids(&self, kinds: impl Fn(SubjectKind) -> bool) -> Vec<String> {
        dedup(self.subjects.iter().filter(|s| kinds(s.kind)).map(|s| s.schedule_id.as_str()))
    }

    /// The subject's schedule, or `NotFound` when the provider has none.
    pub async fn require_schedule(&self, subject: &Subject) -> ServiceResult<&Schedule> {
        self.schedules().await?.get(&subject.schedule_id).ok_or_else(|| ServiceError::NotFound {
            entity: "schedule",
            id: subject.schedule_id.clone(),
        })
    }

    /// Students of a subject, in repository order.
    pub async fn students(&self, subject_id: &str) -> ServiceResult<Vec<&SubjectUser>> {
        Ok(self
            .subject_users()
            .await?
            .get(subject_id)
            .map(|users| users.iter().filter(|u| u.is_student()).collect())
            .unwrap_or_default())
    }

    /// Students who did not decline the subject.
    pub async fn participating_students(&self, subject_id: &str) -> ServiceResult<Vec<&SubjectUser>> {
        let mut students = self.students(subject_id).await?;
        students.retain(|u| !u.declined());
        Ok(students)
    }
}

/// Sorted, deduplicated, non-empty ids.
pub(crate) fn dedup<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    ids.into_iter()
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}
