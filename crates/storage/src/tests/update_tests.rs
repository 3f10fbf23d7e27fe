use assess_report_core::{
    ContentStatus, OutcomeKey, OutcomeStatus, ParticipationStatus, ReviewerFeedback,
    SubjectStatus, SubjectUserOutcome,
};
use chrono::Utc;
use proptest::prelude::*;

use super::{create_test_content, seeded_storage};
use crate::error::StorageError;
use crate::traits::{AssessmentStore, SubjectStore, UpdateStore};
use crate::types::{SubjectUpdate, SubjectUserUpdate};

fn draft_update(subject_id: &str) -> SubjectUpdate {
    SubjectUpdate {
        subject_id: subject_id.to_owned(),
        status: SubjectStatus::InDraft,
        completed_at: None,
        users: Vec::new(),
        contents: Vec::new(),
        outcomes: Vec::new(),
        reviewer_feedbacks: Vec::new(),
    }
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn update_applies_every_part() {
    let storage = seeded_storage().await;
    let mut content = create_test_content("a1", "m1");
    content.status = ContentStatus::NotCovered;
    content.reviewer_comment = "skipped".into();
    content.id = "ignored-new-id".into();

    let update = SubjectUpdate {
        status: SubjectStatus::Complete,
        completed_at: Some(Utc::now()),
        users: vec![SubjectUserUpdate {
            subject_user_id: "a1:s1".into(),
            status_by_user: ParticipationStatus::NotParticipate,
        }],
        contents: vec![content],
        outcomes: vec![SubjectUserOutcome {
            key: OutcomeKey::new("a1:s1", "a1:m1", "o1"),
            status: OutcomeStatus::Achieved,
        }],
        reviewer_feedbacks: vec![ReviewerFeedback {
            subject_user_id: "a1:s1".into(),
            student_feedback_id: "f1".into(),
            reviewer_comment: "good".into(),
            reviewed_at: None,
        }],
        ..draft_update("a1")
    };
    storage.update_subjects_tx(&update).await.unwrap();

    let subject = storage.get_subject("a1").await.unwrap().unwrap();
    assert_eq!(subject.status, SubjectStatus::Complete);
    assert!(subject.completed_at.is_some());

    let ids = vec!["a1".to_owned()];
    let users = storage.get_subject_users(&ids).await.unwrap();
    let student = users["a1"].iter().find(|u| u.id == "a1:s1").unwrap();
    assert!(student.declined());

    let contents = storage.get_subject_contents(&ids).await.unwrap();
    assert_eq!(contents["a1"].len(), 1);
    assert_eq!(contents["a1"][0].id, "a1:m1");
    assert_eq!(contents["a1"][0].status, ContentStatus::NotCovered);

    let su = vec!["a1:s1".to_owned()];
    assert_eq!(storage.get_user_outcomes(&su).await.unwrap().len(), 1);
    assert_eq!(storage.get_reviewer_feedbacks(&su).await.unwrap()["a1:s1"][0].reviewer_comment, "good");
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn failed_update_leaves_store_untouched() {
    let storage = seeded_storage().await;
    let update = SubjectUpdate {
        users: vec![SubjectUserUpdate {
            subject_user_id: "no-such-user".into(),
            status_by_user: ParticipationStatus::NotParticipate,
        }],
        outcomes: vec![SubjectUserOutcome {
            key: OutcomeKey::new("a1:s1", "a1:m1", "o1"),
            status: OutcomeStatus::Achieved,
        }],
        ..draft_update("a1")
    };

    let err = storage.update_subjects_tx(&update).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "subject_user", .. }));

    let subject = storage.get_subject("a1").await.unwrap().unwrap();
    assert_eq!(subject.status, SubjectStatus::Started);
    assert_eq!(storage.outcome_row_count().await, 0);
}

#[tokio::test]
async fn update_of_unknown_subject_is_not_found() {
    let storage = seeded_storage().await;
    let err = storage.update_subjects_tx(&draft_update("ghost")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "subject", .. }));
}

fn outcome_status() -> impl Strategy<Value = OutcomeStatus> {
    prop_oneof![
        Just(OutcomeStatus::Unknown),
        Just(OutcomeStatus::Achieved),
        Just(OutcomeStatus::NotAchieved),
    ]
}

proptest! {
    #[test]
    fn outcome_rows_stay_unique_per_key(
        writes in prop::collection::vec((0usize..3, 0usize..3, outcome_status()), 1..20),
        repeats in 1usize..4,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let storage = seeded_storage().await;
            let outcomes: Vec<SubjectUserOutcome> = writes
                .iter()
                .map(|(content, outcome, status)| SubjectUserOutcome {
                    key: OutcomeKey::new("a1:s1", format!("c{content}"), format!("o{outcome}")),
                    status: *status,
                })
                .collect();
            let update = SubjectUpdate { outcomes: outcomes.clone(), ..draft_update("a1") };
            for _ in 0..repeats {
                storage.update_subjects_tx(&update).await.unwrap();
            }

            let distinct: std::collections::HashSet<_> = outcomes.iter().map(|o| &o.key).collect();
            prop_assert_eq!(storage.outcome_row_count().await, distinct.len());

            let stored = storage.get_user_outcomes(&["a1:s1".to_owned()]).await.unwrap();
            for row in stored {
                let last = outcomes.iter().rev().find(|o| o.key == row.key).map(|o| o.status);
                prop_assert_eq!(Some(row.status), last);
            }
            Ok(())
        })?;
    }
}
