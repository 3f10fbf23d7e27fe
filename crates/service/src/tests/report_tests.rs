use assess_report_core::{
    FileType, OutcomeStatus, ReviewerFeedback, StudentFeedback, StudentReview, SubjectKind, UserType,
};
use assess_report_storage::{Pager, SubjectFilter};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::session::ContentSource;
use crate::{ReportConfig, ServiceError};

fn status_of(row: &crate::report::StudentRow, outcome_id: &str) -> Option<OutcomeStatus> {
    row.outcomes.iter().find(|o| o.outcome_id == outcome_id).map(|o| o.status)
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn online_class_detail() {
    let (fixture, _) = online_class_fixture().await;
    let report = fixture
        .service(ReportConfig::default())
        .get_detail("a1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.complete_rate, Some(1.0));
    assert_eq!(report.summary.remaining_secs, Some(6 * DAY));
    assert!(report.summary.anyone_attempted);
    assert_eq!(report.content_source, Some(ContentSource::Latest));
    // Detail replies do not resolve teacher names.
    assert_eq!(report.summary.teachers.len(), 1);
    assert_eq!(report.summary.teachers[0].id, "t1");
    assert_eq!(report.summary.teachers[0].name, None);

    let rows: Vec<(&str, &str, &str)> = report
        .contents
        .iter()
        .map(|r| (r.number.as_str(), r.content_id.as_str(), r.sub_content_id.as_str()))
        .collect();
    assert_eq!(rows, [("0", "p1", ""), ("1", "m1", ""), ("1-1", "m1", "q1"), ("1-2", "m1", "q2")]);
    assert!(report.contents[0].is_plan);
    assert_eq!(report.contents[1].max_score, Some(10.0));
    assert_eq!(report.contents[1].outcome_ids, ["o1"]);

    let s1 = report.students.iter().find(|s| s.student_id == "s1").unwrap();
    let s2 = report.students.iter().find(|s| s.student_id == "s2").unwrap();
    assert!(s1.attempted);
    assert_eq!(s1.score.ratio(), Some(0.8));
    assert_eq!(s1.comments, ["Well done"]);
    assert!(!s2.attempted);
    assert!(s2.comments.is_empty());
    assert_eq!(status_of(s2, "o1"), Some(OutcomeStatus::Unknown));
    assert_eq!(status_of(s2, "o-plan"), Some(OutcomeStatus::Achieved));
    assert_eq!(status_of(s1, "o1"), Some(OutcomeStatus::Unknown));

    let summary: Vec<(&str, usize, usize)> =
        report.outcomes.iter().map(|o| (o.outcome_id.as_str(), o.achieved, o.unknown)).collect();
    assert_eq!(summary, [("o-plan", 2, 0), ("o1", 0, 2)]);
    assert!(report.diff_content_students.is_empty());
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn detail_issues_each_batch_call_once() {
    let (fixture, _) = online_class_fixture().await;
    fixture.service(ReportConfig::default()).get_detail("a1", &CancellationToken::new()).await.unwrap();

    for op in ["schedules", "relations", "rooms", "latest_ids", "outcomes", "programs", "classes"] {
        assert_eq!(fixture.fake.calls(op), 1, "{op}");
    }
    assert_eq!(fixture.fake.calls("users"), 0);
    assert_eq!(fixture.fake.calls("student_reviews"), 0);
    assert_eq!(fixture.storage.call_count("get_subject_users"), 1);
    assert_eq!(fixture.storage.call_count("get_user_outcomes"), 1);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn score_threshold_marks_outcome_achieved() {
    let (fixture, _) = online_class_fixture().await;
    let config = ReportConfig { outcome_score_threshold: Some(0.75), ..ReportConfig::default() };
    let report = fixture.service(config).get_detail("a1", &CancellationToken::new()).await.unwrap();

    let s1 = report.students.iter().find(|s| s.student_id == "s1").unwrap();
    let s2 = report.students.iter().find(|s| s.student_id == "s2").unwrap();
    assert_eq!(status_of(s1, "o1"), Some(OutcomeStatus::Achieved));
    assert_eq!(status_of(s2, "o1"), Some(OutcomeStatus::Unknown));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn page_resolves_names() {
    let (fixture, _) = online_class_fixture().await;
    let page = fixture
        .service(ReportConfig::default())
        .page(&SubjectFilter::default(), Pager::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    let item = &page.items[0];
    assert_eq!(item.teachers[0].name.as_deref(), Some("Ms. Teacher"));
    assert_eq!(item.program.as_ref().and_then(|p| p.name.as_deref()), Some("Maths"));
    assert_eq!(item.classes[0].name.as_deref(), Some("Class 3B"));
    assert_eq!(item.lesson_plan.as_ref().map(|p| p.id.as_str()), Some("p1"));
    assert_eq!(item.schedule.as_ref().map(|s| s.id.as_str()), Some("sch-a1"));
    assert_eq!(item.complete_rate, Some(1.0));
    assert_eq!(item.remaining_secs, Some(6 * DAY));
    assert_eq!(fixture.fake.calls("users"), 1);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn remaining_time_is_zero_after_the_window() {
    let (mut fixture, a1) = online_class_fixture().await;
    let late = subject("b1", SubjectKind::OnlineStudy, 10);
    let mut due = subject("b2", SubjectKind::OnlineStudy, 10);
    due.title = "Due soon".into();
    let mut data = FakeData::default();
    data.schedules.insert(a1.schedule_id.clone(), schedule(&a1, "p1"));
    data.schedules.insert(late.schedule_id.clone(), schedule(&late, "p1"));
    let mut with_due = schedule(&due, "p1");
    with_due.due_at = Some(now() + chrono::TimeDelta::days(2));
    data.schedules.insert(due.schedule_id.clone(), with_due);
    fixture.fake = FakeProviders::new(data);
    fixture.storage.insert_subject(late).await;
    fixture.storage.insert_subject(due).await;

    let page = fixture
        .service(ReportConfig::default())
        .page(&SubjectFilter::default(), Pager::default(), &CancellationToken::new())
        .await
        .unwrap();

    let remaining: Vec<(&str, Option<i64>)> =
        page.items.iter().map(|i| (i.id.as_str(), i.remaining_secs)).collect();
    assert_eq!(remaining, [("a1", Some(6 * DAY)), ("b1", Some(0)), ("b2", Some(2 * DAY))]);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn page_keeps_subjects_without_schedule() {
    let (fixture, _) = online_class_fixture().await;
    fixture.storage.insert_subject(subject("a2", SubjectKind::OfflineClass, 2)).await;

    let page = fixture
        .service(ReportConfig::default())
        .page(&SubjectFilter::default(), Pager::default(), &CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["a1", "a2"]);
    let orphan = &page.items[1];
    assert!(orphan.schedule.is_none());
    assert!(orphan.program.is_none());
    assert!(orphan.lesson_plan.is_none());
    assert_eq!(orphan.complete_rate, None);
    assert_eq!(orphan.remaining_secs, None);
    assert_eq!(fixture.fake.calls("schedules"), 1);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn page_size_is_clamped_by_config() {
    let (fixture, _) = online_class_fixture().await;
    fixture.storage.insert_subject(subject("a2", SubjectKind::OnlineClass, 2)).await;
    let config = ReportConfig { max_page_size: 1, ..ReportConfig::default() };

    let page = fixture
        .service(config)
        .page(&SubjectFilter::default(), Pager::new(2, 50), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.page_size, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "a2");
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn detail_of_unknown_subject_or_schedule_is_not_found() {
    let (fixture, _) = online_class_fixture().await;
    fixture.storage.insert_subject(subject("a2", SubjectKind::OfflineClass, 2)).await;
    let service = fixture.service(ReportConfig::default());

    let err = service.get_detail("missing", &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "subject", .. }));

    let err = service.get_detail("a2", &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "schedule", .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn detail_fails_fast_on_required_provider() {
    let (fixture, _) = online_class_fixture().await;
    fixture.fake.fail("outcomes");

    let err = fixture
        .service(ReportConfig::default())
        .get_detail("a1", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Dependency { provider: "catalog", .. }));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn offline_study_progress_comes_from_feedback() {
    let c1 = subject("c1", SubjectKind::OfflineStudy, 1);
    let mut data = FakeData::default();
    data.schedules.insert(c1.schedule_id.clone(), schedule(&c1, "p1"));
    data.contents.insert("p1".into(), plan("p1", &["m1"], &[]));
    data.contents.insert("m1".into(), material("m1", FileType::Document, &[]));
    let submitted = |id: &str, hours_ago: i64| StudentFeedback {
        id: id.to_owned(),
        schedule_id: c1.schedule_id.clone(),
        student_id: "s1".into(),
        attachment_names: vec![format!("{id}.pdf")],
        submitted_at: now() - chrono::TimeDelta::hours(hours_ago),
    };
    data.feedbacks.insert(c1.schedule_id.clone(), vec![submitted("f-old", 5), submitted("f-new", 1)]);

    let storage = MemoryStorage::new();
    storage.insert_subject(c1.clone()).await;
    for (id, kind) in [("t1", UserType::Teacher), ("s1", UserType::Student), ("s2", UserType::Student)] {
        storage.insert_subject_user(user("c1", id, kind)).await.unwrap();
    }
    storage
        .insert_reviewer_feedback(ReviewerFeedback {
            subject_user_id: "c1:s1".into(),
            student_feedback_id: "f-new".into(),
            reviewer_comment: "Nice".into(),
            reviewed_at: Some(now()),
        })
        .await;
    let fixture = Fixture { storage, fake: FakeProviders::new(data) };

    let report = fixture
        .service(ReportConfig::default())
        .get_detail("c1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.complete_rate, Some(0.5));
    assert!(report.summary.anyone_attempted);
    let s1 = report.students.iter().find(|s| s.student_id == "s1").unwrap();
    let feedback = s1.feedback.as_ref().unwrap();
    assert_eq!(feedback.feedback_id, "f-new");
    assert_eq!(feedback.reviewer_comment.as_deref(), Some("Nice"));
    assert!(s1.attempted);
    let s2 = report.students.iter().find(|s| s.student_id == "s2").unwrap();
    assert!(s2.feedback.is_none());
    assert_eq!(fixture.fake.calls("rooms"), 0);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn review_study_tracks_each_assignment() {
    let r1 = subject("r1", SubjectKind::ReviewStudy, 1);
    let mut data = FakeData::default();
    data.schedules.insert(r1.schedule_id.clone(), schedule(&r1, ""));
    data.contents.insert("m1".into(), material("m1", FileType::H5p, &[]));
    data.contents.insert("m2".into(), material("m2", FileType::H5p, &[]));
    let assign = |student: &str, ids: &[&str]| StudentReview {
        schedule_id: r1.schedule_id.clone(),
        student_id: student.to_owned(),
        content_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
    };
    data.reviews.insert(r1.schedule_id.clone(), vec![assign("s1", &["m1", "m2"]), assign("s2", &["m2"])]);
    data.rooms.insert(
        r1.schedule_id.clone(),
        RoomInfo {
            users: vec![RoomUserScores {
                user_id: "s1".into(),
                scores: vec![record("m1", "", FileType::H5p, 1.0, Some(1.0))],
            }],
            comments: Vec::new(),
        },
    );

    let storage = MemoryStorage::new();
    storage.insert_subject(r1).await;
    for id in ["s1", "s2"] {
        storage.insert_subject_user(user("r1", id, UserType::Student)).await.unwrap();
    }
    let fixture = Fixture { storage, fake: FakeProviders::new(data) };

    let report = fixture
        .service(ReportConfig::default())
        .get_detail("r1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.content_source, Some(ContentSource::Review));
    assert!(report.summary.lesson_plan.is_none());
    let rate = report.summary.complete_rate.unwrap();
    assert!((rate - 1.0 / 3.0).abs() < 1e-9, "rate {rate}");

    let per_student: Vec<(&str, Vec<&str>)> = report
        .diff_content_students
        .iter()
        .map(|s| (s.student_id.as_str(), s.contents.iter().map(|c| c.content_id.as_str()).collect()))
        .collect();
    assert_eq!(per_student, [("s1", vec!["m1", "m2"]), ("s2", vec!["m2"])]);
    assert_eq!(fixture.fake.calls("latest_ids"), 0);
}

/// Subject `a1` with one student `s1`, plan `p1` and material `m1` of
/// `file_type`, whose room holds `records` for `s1`.
#[expect(clippy::unwrap_used, reason = "test code")]
async fn single_material_fixture(file_type: FileType, records: Vec<RoomScoreRecord>) -> (Fixture, Subject) {
    let a1 = subject("a1", SubjectKind::OnlineClass, 1);
    let mut data = FakeData::default();
    data.schedules.insert(a1.schedule_id.clone(), schedule(&a1, "p1"));
    data.contents.insert("p1".into(), plan("p1", &["m1"], &[]));
    data.contents.insert("m1".into(), material("m1", file_type, &[]));
    data.rooms.insert(
        a1.schedule_id.clone(),
        RoomInfo { users: vec![RoomUserScores { user_id: "s1".into(), scores: records }], comments: Vec::new() },
    );

    let storage = MemoryStorage::new();
    storage.insert_subject(a1.clone()).await;
    storage.insert_subject_user(user("a1", "s1", UserType::Student)).await.unwrap();
    (Fixture { storage, fake: FakeProviders::new(data) }, a1)
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn leaf_material_is_numbered_once() {
    let (fixture, _) = single_material_fixture(
        FileType::H5p,
        vec![
            record("m1", "", FileType::H5p, 2.0, Some(1.0)),
            record("m1", "q1", FileType::H5p, 1.0, Some(1.0)),
        ],
    )
    .await;
    let report = fixture
        .service(ReportConfig::default())
        .get_detail("a1", &CancellationToken::new())
        .await
        .unwrap();

    let numbers: Vec<&str> = report.contents.iter().map(|r| r.number.as_str()).collect();
    assert_eq!(numbers, ["0", "1"]);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn same_content_rate_is_clamped_to_one() {
    let (fixture, a1) = single_material_fixture(
        FileType::HasChildren,
        vec![
            record("m1", "", FileType::HasChildren, 0.0, None),
            record("m1", "q1", FileType::H5p, 1.0, Some(1.0)),
            record("m1", "q2", FileType::H5p, 1.0, Some(0.0)),
            record("m1", "q3", FileType::H5p, 1.0, Some(1.0)),
        ],
    )
    .await;
    let session = fixture.session(vec![a1], ReportMode::Detail);

    // Three seen items against one student times one material.
    let rate = crate::variant::strategy_for(SubjectKind::OnlineClass)
        .complete_rate(&session, &[&session.subjects()[0]])
        .await
        .unwrap();
    assert_eq!(rate["a1"], 1.0);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn offline_study_rate_counts_declined_students() {
    let c1 = subject("c1", SubjectKind::OfflineStudy, 1);
    let mut data = FakeData::default();
    data.schedules.insert(c1.schedule_id.clone(), schedule(&c1, "p1"));
    data.contents.insert("p1".into(), plan("p1", &[], &[]));
    data.feedbacks.insert(
        c1.schedule_id.clone(),
        vec![StudentFeedback {
            id: "f1".into(),
            schedule_id: c1.schedule_id.clone(),
            student_id: "s1".into(),
            attachment_names: Vec::new(),
            submitted_at: now(),
        }],
    );

    let storage = MemoryStorage::new();
    storage.insert_subject(c1.clone()).await;
    storage.insert_subject_user(user("c1", "s1", UserType::Student)).await.unwrap();
    let mut declined = user("c1", "s2", UserType::Student);
    declined.status_by_user = ParticipationStatus::NotParticipate;
    storage.insert_subject_user(declined).await.unwrap();
    let fixture = Fixture { storage, fake: FakeProviders::new(data) };

    let report = fixture
        .service(ReportConfig::default())
        .get_detail("c1", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.summary.complete_rate, Some(0.5));
}
