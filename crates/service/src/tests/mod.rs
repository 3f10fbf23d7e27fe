//! Counting fake providers and fixtures shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use assess_report_core::{
    AddCommentRequest, CatalogProvider, ClassInfo, ContentKey, ContentType, ContentView,
    DirectoryProvider, FileType, LiveSessionProvider, MigrationFlag, Outcome, ParticipationStatus,
    Program, ProviderError, ProviderResult, RoomContentType, RoomInfo, RoomOptions, RoomScoreRecord,
    RoomUserScores, Schedule, ScheduleProvider, ScheduleRelation, SetScoreRequest, StudentFeedback,
    StudentReview, Subject, SubjectArea, SubjectKind, SubjectStatus, SubjectUser, User, UserType,
};
use assess_report_storage::{MemoryStorage, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use crate::{AggregationSession, Providers, ReportConfig, ReportMode, ReportService};

mod report_tests;

pub(crate) const DAY: i64 = 86_400;
/// 2024-01-10T00:00:00Z
pub(crate) const NOW_SECS: i64 = 1_704_844_800;

pub(crate) fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(NOW_SECS, 0).single().unwrap_or_default()
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeData {
    pub schedules: HashMap<String, Schedule>,
    pub relations: HashMap<String, Vec<ScheduleRelation>>,
    pub reviews: HashMap<String, Vec<StudentReview>>,
    pub feedbacks: HashMap<String, Vec<StudentFeedback>>,
    pub contents: HashMap<String, ContentView>,
    pub outcomes: HashMap<String, Outcome>,
    /// Old id to newest id; ids not listed are current.
    pub latest_ids: HashMap<String, String>,
    pub users: HashMap<String, User>,
    pub programs: HashMap<String, Program>,
    pub subject_areas: HashMap<String, SubjectArea>,
    pub classes: HashMap<String, ClassInfo>,
    pub rooms: HashMap<String, RoomInfo>,
}

/// In-process providers that count every call and can be told to fail.
#[derive(Debug, Default)]
pub(crate) struct FakeProviders {
    data: FakeData,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    pub set_scores: Mutex<Vec<SetScoreRequest>>,
    pub added_comments: Mutex<Vec<AddCommentRequest>>,
}

#[expect(clippy::unwrap_used, reason = "test code")]
impl FakeProviders {
    pub(crate) fn new(data: FakeData) -> Arc<Self> {
        Arc::new(Self { data, ..Self::default() })
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    fn record(&self, op: &'static str) -> ProviderResult<()> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        if self.failing.lock().unwrap().contains(op) {
            return Err(ProviderError::Status { code: 503, body: format!("{op} unavailable") });
        }
        Ok(())
    }

    pub(crate) fn providers(self: &Arc<Self>) -> Providers {
        Providers {
            schedules: self.clone(),
            catalog: self.clone(),
            directory: self.clone(),
            live: self.clone(),
        }
    }
}

fn pick<T: Clone>(map: &HashMap<String, T>, ids: &[String]) -> HashMap<String, T> {
    ids.iter().filter_map(|id| map.get(id).map(|v| (id.clone(), v.clone()))).collect()
}

#[async_trait]
impl ScheduleProvider for FakeProviders {
    async fn batch_get(&self, ids: &[String]) -> ProviderResult<HashMap<String, Schedule>> {
        self.record("schedules")?;
        Ok(pick(&self.data.schedules, ids))
    }

    async fn get_relations(&self, ids: &[String]) -> ProviderResult<HashMap<String, Vec<ScheduleRelation>>> {
        self.record("relations")?;
        Ok(pick(&self.data.relations, ids))
    }

    async fn get_student_reviews(&self, ids: &[String]) -> ProviderResult<HashMap<String, Vec<StudentReview>>> {
        self.record("student_reviews")?;
        Ok(pick(&self.data.reviews, ids))
    }

    async fn get_student_feedbacks(&self, ids: &[String]) -> ProviderResult<HashMap<String, Vec<StudentFeedback>>> {
        self.record("student_feedbacks")?;
        Ok(pick(&self.data.feedbacks, ids))
    }
}

#[async_trait]
impl CatalogProvider for FakeProviders {
    async fn batch_get_content(&self, ids: &[String]) -> ProviderResult<HashMap<String, ContentView>> {
        self.record("contents")?;
        Ok(pick(&self.data.contents, ids))
    }

    async fn batch_get_outcomes(&self, ids: &[String]) -> ProviderResult<HashMap<String, Outcome>> {
        self.record("outcomes")?;
        Ok(pick(&self.data.outcomes, ids))
    }

    async fn get_latest_content_ids(&self, ids: &[String]) -> ProviderResult<HashMap<String, String>> {
        self.record("latest_ids")?;
        Ok(ids
            .iter()
            .map(|id| (id.clone(), self.data.latest_ids.get(id).unwrap_or(id).clone()))
            .collect())
    }
}

#[async_trait]
impl DirectoryProvider for FakeProviders {
    async fn batch_get_users(&self, ids: &[String]) -> ProviderResult<HashMap<String, User>> {
        self.record("users")?;
        Ok(pick(&self.data.users, ids))
    }

    async fn batch_get_programs(&self, ids: &[String]) -> ProviderResult<HashMap<String, Program>> {
        self.record("programs")?;
        Ok(pick(&self.data.programs, ids))
    }

    async fn batch_get_subject_areas(&self, ids: &[String]) -> ProviderResult<HashMap<String, SubjectArea>> {
        self.record("subject_areas")?;
        Ok(pick(&self.data.subject_areas, ids))
    }

    async fn batch_get_classes(&self, ids: &[String]) -> ProviderResult<HashMap<String, ClassInfo>> {
        self.record("classes")?;
        Ok(pick(&self.data.classes, ids))
    }
}

#[async_trait]
impl LiveSessionProvider for FakeProviders {
    async fn get_scores_and_comments(
        &self,
        ids: &[String],
        _options: RoomOptions,
    ) -> ProviderResult<HashMap<String, RoomInfo>> {
        self.record("rooms")?;
        Ok(pick(&self.data.rooms, ids))
    }

    #[expect(clippy::unwrap_used, reason = "test code")]
    async fn batch_set_score(&self, requests: &[SetScoreRequest]) -> ProviderResult<()> {
        self.record("set_score")?;
        self.set_scores.lock().unwrap().extend_from_slice(requests);
        Ok(())
    }

    #[expect(clippy::unwrap_used, reason = "test code")]
    async fn batch_add_comment(&self, requests: &[AddCommentRequest]) -> ProviderResult<()> {
        self.record("add_comment")?;
        self.added_comments.lock().unwrap().extend_from_slice(requests);
        Ok(())
    }
}

// ── Builders ───────────────────────────────────────────────────────────

pub(crate) fn subject(id: &str, kind: SubjectKind, created_days_ago: i64) -> Subject {
    Subject {
        id: id.to_owned(),
        kind,
        schedule_id: format!("sch-{id}"),
        title: format!("Lesson {id}"),
        status: SubjectStatus::Started,
        created_at: now() - chrono::TimeDelta::days(created_days_ago),
        completed_at: None,
        migration_flag: MigrationFlag::Current,
    }
}

pub(crate) fn schedule(subject: &Subject, plan_id: &str) -> Schedule {
    Schedule {
        id: subject.schedule_id.clone(),
        title: subject.title.clone(),
        program_id: "prog1".to_owned(),
        lesson_plan_id: plan_id.to_owned(),
        locked_content: None,
        due_at: None,
    }
}

pub(crate) fn user(subject_id: &str, user_id: &str, user_type: UserType) -> SubjectUser {
    SubjectUser {
        id: format!("{subject_id}:{user_id}"),
        subject_id: subject_id.to_owned(),
        user_id: user_id.to_owned(),
        user_type,
        status_by_user: ParticipationStatus::Participate,
        status_by_system: ParticipationStatus::Participate,
    }
}

pub(crate) fn plan(id: &str, materials: &[&str], outcome_ids: &[&str]) -> ContentView {
    ContentView {
        id: id.to_owned(),
        name: format!("Plan {id}"),
        outcome_ids: outcome_ids.iter().map(|s| (*s).to_owned()).collect(),
        content_type: ContentType::Plan,
        latest_id: String::new(),
        file_type: FileType::Other,
        material_ids: materials.iter().map(|s| (*s).to_owned()).collect(),
    }
}

pub(crate) fn material(id: &str, file_type: FileType, outcome_ids: &[&str]) -> ContentView {
    ContentView {
        id: id.to_owned(),
        name: format!("Material {id}"),
        outcome_ids: outcome_ids.iter().map(|s| (*s).to_owned()).collect(),
        content_type: ContentType::Material,
        latest_id: String::new(),
        file_type,
        material_ids: Vec::new(),
    }
}

pub(crate) fn record(content: &str, sub: &str, file_type: FileType, max: f64, score: Option<f64>) -> RoomScoreRecord {
    RoomScoreRecord {
        key: ContentKey::new(content, sub),
        parent_sub_content_id: String::new(),
        content_type: if sub.is_empty() { RoomContentType::Material } else { RoomContentType::Unknown },
        file_type,
        name: format!("{content}/{sub}"),
        max_score: max,
        score,
        seen: score.is_some(),
        answer: None,
    }
}

pub(crate) fn outcome(id: &str, assumed: bool) -> Outcome {
    Outcome { id: id.to_owned(), name: format!("Outcome {id}"), assumed }
}

pub(crate) struct Fixture {
    pub storage: MemoryStorage,
    pub fake: Arc<FakeProviders>,
}

impl Fixture {
    pub(crate) fn service(&self, config: ReportConfig) -> ReportService {
        ReportService::new(
            Arc::new(StorageBackend::Memory(self.storage.clone())),
            self.fake.providers(),
            config,
        )
        .with_clock(now)
    }

    pub(crate) fn session(&self, subjects: Vec<Subject>, mode: ReportMode) -> AggregationSession {
        self.service(ReportConfig::default()).session(subjects, mode, &CancellationToken::new())
    }
}

pub(crate) async fn online_class_fixture() -> (Fixture, Subject) {
    lesson_fixture(SubjectKind::OnlineClass).await
}

/// Subject `a1` created a day ago: teacher `t1`, students `s1` and `s2`,
/// plan `p1` with one container material `m1` holding two scored items.
/// `s1` attempted both items (3/5 and 5/5) and handed in feedback `f1`,
/// `s2` did nothing.
#[expect(clippy::unwrap_used, reason = "test code")]
pub(crate) async fn lesson_fixture(kind: SubjectKind) -> (Fixture, Subject) {
    let a1 = subject("a1", kind, 1);

    let mut data = FakeData::default();
    data.schedules.insert(a1.schedule_id.clone(), schedule(&a1, "p1"));
    data.contents.insert("p1".into(), plan("p1", &["m1"], &["o-plan"]));
    data.contents.insert("m1".into(), material("m1", FileType::HasChildren, &["o1"]));
    data.outcomes.insert("o1".into(), outcome("o1", false));
    data.outcomes.insert("o-plan".into(), outcome("o-plan", true));
    data.programs.insert("prog1".into(), Program { id: "prog1".into(), name: "Maths".into() });
    data.users.insert("t1".into(), User { id: "t1".into(), name: "Ms. Teacher".into() });
    data.relations.insert(
        a1.schedule_id.clone(),
        vec![ScheduleRelation {
            schedule_id: a1.schedule_id.clone(),
            relation_type: assess_report_core::RelationType::Class,
            relation_id: "c1".into(),
        }],
    );
    data.classes.insert("c1".into(), ClassInfo { id: "c1".into(), name: "Class 3B".into() });
    data.feedbacks.insert(
        a1.schedule_id.clone(),
        vec![StudentFeedback {
            id: "f1".into(),
            schedule_id: a1.schedule_id.clone(),
            student_id: "s1".into(),
            attachment_names: vec!["essay.pdf".into()],
            submitted_at: now() - chrono::TimeDelta::hours(2),
        }],
    );
    data.rooms.insert(
        a1.schedule_id.clone(),
        RoomInfo {
            users: vec![RoomUserScores {
                user_id: "s1".into(),
                scores: vec![
                    record("m1", "", FileType::HasChildren, 0.0, None),
                    record("m1", "q1", FileType::H5p, 5.0, Some(3.0)),
                    record("m1", "q2", FileType::H5p, 5.0, Some(5.0)),
                ],
            }],
            comments: vec![assess_report_core::RoomComment {
                student_id: "s1".into(),
                teacher_id: "t1".into(),
                comment: "Well done".into(),
            }],
        },
    );

    let storage = MemoryStorage::new();
    storage.insert_subject(a1.clone()).await;
    for (id, kind) in [("t1", UserType::Teacher), ("s1", UserType::Student), ("s2", UserType::Student)] {
        storage.insert_subject_user(user("a1", id, kind)).await.unwrap();
    }

    (Fixture { storage, fake: FakeProviders::new(data) }, a1)
}
