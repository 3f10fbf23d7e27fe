//! Test utilities and module declarations for storage tests.

use assess_report_core::{
    ContentStatus, MigrationFlag, ParticipationStatus, Subject, SubjectContent,
    SubjectContentType, SubjectKind, SubjectStatus, SubjectUser, UserType,
};
use chrono::{TimeZone, Utc};

use crate::MemoryStorage;

pub fn create_test_subject(id: &str, kind: SubjectKind, created_secs: i64) -> Subject {
    Subject {
        id: id.to_owned(),
        kind,
        schedule_id: format!("sched-{id}"),
        title: format!("Assessment {id}"),
        status: SubjectStatus::Started,
        created_at: Utc.timestamp_opt(created_secs, 0).single().unwrap_or_default(),
        completed_at: None,
        migration_flag: MigrationFlag::Current,
    }
}

pub fn create_test_user(subject_id: &str, user_id: &str, user_type: UserType) -> SubjectUser {
    SubjectUser {
        id: format!("{subject_id}:{user_id}"),
        subject_id: subject_id.to_owned(),
        user_id: user_id.to_owned(),
        user_type,
        status_by_user: ParticipationStatus::Participate,
        status_by_system: ParticipationStatus::Participate,
    }
}

pub fn create_test_content(subject_id: &str, content_id: &str) -> SubjectContent {
    SubjectContent {
        id: format!("{subject_id}:{content_id}"),
        subject_id: subject_id.to_owned(),
        content_id: content_id.to_owned(),
        content_type: SubjectContentType::Material,
        status: ContentStatus::Covered,
        reviewer_comment: String::new(),
    }
}

#[expect(clippy::unwrap_used, reason = "test code")]
pub async fn seeded_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.insert_subject(create_test_subject("a1", SubjectKind::OnlineClass, 100)).await;
    storage.insert_subject(create_test_subject("a2", SubjectKind::OfflineStudy, 200)).await;
    storage.insert_subject(create_test_subject("a3", SubjectKind::OnlineClass, 300)).await;
    storage.insert_subject_user(create_test_user("a1", "t1", UserType::Teacher)).await.unwrap();
    storage.insert_subject_user(create_test_user("a1", "s1", UserType::Student)).await.unwrap();
    storage.insert_subject_user(create_test_user("a2", "t2", UserType::Teacher)).await.unwrap();
    storage.insert_subject_user(create_test_user("a3", "t1", UserType::Teacher)).await.unwrap();
    storage.insert_subject_content(create_test_content("a1", "m1")).await;
    storage
}

mod update_tests;
