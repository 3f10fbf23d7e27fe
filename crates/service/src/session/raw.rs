//! Raw collection accessors. Each one issues at most one batch call per
//! session; id sets are derived from the subject batch or from earlier
//! accessors.

use std::collections::HashMap;

use assess_report_core::{
    ClassInfo, ContentView, Outcome, OutcomeKey, OutcomeStatus, Program, RelationType,
    ReviewerFeedback, RoomInfo, RoomOptions, Schedule, ScheduleRelation, StudentFeedback,
    StudentReview, SubjectArea, SubjectContent, SubjectKind, SubjectUser, User,
};
use assess_report_storage::AssessmentStore;

use super::{AggregationSession, ById, dedup};
use crate::error::{ServiceResult, dependency};

const fn has_room(kind: SubjectKind) -> bool {
    !matches!(kind, SubjectKind::OfflineStudy)
}

impl AggregationSession {
    pub async fn schedules(&self) -> ServiceResult<&ById<Schedule>> {
        self.cache
            .schedules
            .get_or_fetch(&self.cancel, || async {
                let ids = self.schedule_ids(|_| true);
                let found = self
                    .providers
                    .schedules
                    .batch_get(&ids)
                    .await
                    .map_err(dependency("schedule"))?;
                if found.len() < ids.len() {
                    tracing::debug!(requested = ids.len(), found = found.len(), "schedules missing from provider");
                }
                Ok(found)
            })
            .await
    }

    pub async fn schedule_relations(&self) -> ServiceResult<&ById<Vec<ScheduleRelation>>> {
        self.cache
            .schedule_relations
            .get_or_fetch(&self.cancel, || async {
                let ids = self.schedule_ids(|_| true);
                self.providers.schedules.get_relations(&ids).await.map_err(dependency("schedule"))
            })
            .await
    }

    /// Review assignments; only review-study schedules are queried.
    pub async fn student_reviews(&self) -> ServiceResult<&ById<Vec<StudentReview>>> {
        self.cache
            .student_reviews
            .get_or_fetch(&self.cancel, || async {
                let ids = self.schedule_ids(|k| k == SubjectKind::ReviewStudy);
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.schedules.get_student_reviews(&ids).await.map_err(dependency("schedule"))
            })
            .await
    }

    /// Submitted feedback; only offline-study schedules are queried.
    pub async fn student_feedbacks(&self) -> ServiceResult<&ById<Vec<StudentFeedback>>> {
        self.cache
            .student_feedbacks
            .get_or_fetch(&self.cancel, || async {
                let ids = self.schedule_ids(|k| k == SubjectKind::OfflineStudy);
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers
                    .schedules
                    .get_student_feedbacks(&ids)
                    .await
                    .map_err(dependency("schedule"))
            })
            .await
    }

    pub async fn subject_users(&self) -> ServiceResult<&ById<Vec<SubjectUser>>> {
        self.cache
            .subject_users
            .get_or_fetch(&self.cancel, || async {
                Ok(self.storage.get_subject_users(&self.subject_ids()).await?)
            })
            .await
    }

    pub async fn subject_contents(&self) -> ServiceResult<&ById<Vec<SubjectContent>>> {
        self.cache
            .subject_contents
            .get_or_fetch(&self.cancel, || async {
                Ok(self.storage.get_subject_contents(&self.subject_ids()).await?)
            })
            .await
    }

    /// Recorded outcome statuses of every subject user in the batch.
    pub async fn user_outcomes(&self) -> ServiceResult<&HashMap<OutcomeKey, OutcomeStatus>> {
        self.cache
            .user_outcomes
            .get_or_fetch(&self.cancel, || async {
                let users = self.subject_users().await?;
                let ids = dedup(users.values().flatten().map(|u| u.id.as_str()));
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                let rows = self.storage.get_user_outcomes(&ids).await?;
                Ok(rows.into_iter().map(|row| (row.key, row.status)).collect())
            })
            .await
    }

    /// Teacher reviews of student feedback, keyed by subject-user id.
    pub async fn reviewer_feedbacks(&self) -> ServiceResult<&ById<Vec<ReviewerFeedback>>> {
        self.cache
            .reviewer_feedbacks
            .get_or_fetch(&self.cancel, || async {
                let users = self.subject_users().await?;
                let ids = dedup(
                    self.subjects
                        .iter()
                        .filter(|s| s.kind == SubjectKind::OfflineStudy)
                        .filter_map(|s| users.get(&s.id))
                        .flatten()
                        .filter(|u| u.is_student())
                        .map(|u| u.id.as_str()),
                );
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                Ok(self.storage.get_reviewer_feedbacks(&ids).await?)
            })
            .await
    }

    pub async fn programs(&self) -> ServiceResult<&ById<Program>> {
        self.cache
            .programs
            .get_or_fetch(&self.cancel, || async {
                let schedules = self.schedules().await?;
                let ids = dedup(schedules.values().map(|s| s.program_id.as_str()));
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.directory.batch_get_programs(&ids).await.map_err(dependency("directory"))
            })
            .await
    }

    pub async fn subject_areas(&self) -> ServiceResult<&ById<SubjectArea>> {
        self.cache
            .subject_areas
            .get_or_fetch(&self.cancel, || async {
                let ids = self.relation_ids(RelationType::SubjectCategory).await?;
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers
                    .directory
                    .batch_get_subject_areas(&ids)
                    .await
                    .map_err(dependency("directory"))
            })
            .await
    }

    pub async fn classes(&self) -> ServiceResult<&ById<ClassInfo>> {
        self.cache
            .classes
            .get_or_fetch(&self.cancel, || async {
                let ids = self.relation_ids(RelationType::Class).await?;
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.directory.batch_get_classes(&ids).await.map_err(dependency("directory"))
            })
            .await
    }

    /// Directory records of every teacher in the batch.
    pub async fn users(&self) -> ServiceResult<&ById<User>> {
        self.cache
            .users
            .get_or_fetch(&self.cancel, || async {
                let users = self.subject_users().await?;
                let ids = dedup(users.values().flatten().filter(|u| u.is_teacher()).map(|u| u.user_id.as_str()));
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.directory.batch_get_users(&ids).await.map_err(dependency("directory"))
            })
            .await
    }

    /// Old content id to newest catalog id, for every id a latest-source
    /// subject may join on: plan and snapshot ids, recorded content rows and
    /// room records.
    pub async fn latest_content_ids(&self) -> ServiceResult<&ById<String>> {
        self.cache
            .latest_content_ids
            .get_or_fetch(&self.cancel, || async {
                let schedules = self.schedules().await?;
                let contents = self.subject_contents().await?;
                let rooms = self.room_infos().await?;

                let mut wanted: Vec<&str> = Vec::new();
                for subject in self.subjects.iter().filter(|s| s.kind != SubjectKind::ReviewStudy) {
                    let Some(schedule) = schedules.get(&subject.schedule_id) else { continue };
                    if self.is_locked_source(subject, schedule) {
                        continue;
                    }
                    match &schedule.locked_content {
                        Some(locked) => wanted.extend(locked.content_ids()),
                        None => wanted.push(schedule.lesson_plan_id.as_str()),
                    }
                    if let Some(rows) = contents.get(&subject.id) {
                        wanted.extend(rows.iter().map(|c| c.content_id.as_str()));
                    }
                    if let Some(room) = rooms.get(&subject.schedule_id) {
                        wanted.extend(
                            room.users.iter().flat_map(|u| &u.scores).map(|r| r.key.content_id.as_str()),
                        );
                    }
                }
                let ids = dedup(wanted);
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.catalog.get_latest_content_ids(&ids).await.map_err(dependency("catalog"))
            })
            .await
    }

    /// Newest catalog versions of the lesson plans of latest-source subjects.
    pub async fn latest_plans(&self) -> ServiceResult<&ById<ContentView>> {
        self.cache
            .latest_plans
            .get_or_fetch(&self.cancel, || async {
                let schedules = self.schedules().await?;
                let latest = self.latest_content_ids().await?;
                let ids = dedup(
                    self.subjects
                        .iter()
                        .filter(|s| s.kind != SubjectKind::ReviewStudy)
                        .filter_map(|s| {
                            let schedule = schedules.get(&s.schedule_id)?;
                            (!self.is_locked_source(s, schedule)).then(|| plan_id(schedule))
                        })
                        .map(|id| latest.get(id).map_or(id, String::as_str)),
                );
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.catalog.batch_get_content(&ids).await.map_err(dependency("catalog"))
            })
            .await
    }

    /// Materials listed by the latest plans.
    pub async fn latest_materials(&self) -> ServiceResult<&ById<ContentView>> {
        self.cache
            .latest_materials
            .get_or_fetch(&self.cancel, || async {
                let plans = self.latest_plans().await?;
                let ids = dedup(plans.values().flat_map(|p| &p.material_ids).map(String::as_str));
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.catalog.batch_get_content(&ids).await.map_err(dependency("catalog"))
            })
            .await
    }

    /// Catalog records of every content assigned in review-study subjects.
    pub async fn review_contents(&self) -> ServiceResult<&ById<ContentView>> {
        self.cache
            .review_contents
            .get_or_fetch(&self.cancel, || async {
                let reviews = self.student_reviews().await?;
                let ids = dedup(reviews.values().flatten().flat_map(|r| &r.content_ids).map(String::as_str));
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.catalog.batch_get_content(&ids).await.map_err(dependency("catalog"))
            })
            .await
    }

    /// Outcomes referenced by the resolved content of every subject.
    pub async fn outcomes(&self) -> ServiceResult<&ById<Outcome>> {
        self.cache
            .outcomes
            .get_or_fetch(&self.cancel, || async {
                let sources = self.content_sources().await?;
                let ids = dedup(
                    sources.values().flat_map(|r| r.contents()).flat_map(|c| &c.outcome_ids).map(String::as_str),
                );
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                self.providers.catalog.batch_get_outcomes(&ids).await.map_err(dependency("catalog"))
            })
            .await
    }

    /// Live-room scores and comments. A provider failure degrades to an
    /// empty map; cancellation still aborts.
    pub async fn room_infos(&self) -> ServiceResult<&ById<RoomInfo>> {
        self.cache
            .room_infos
            .get_or_fetch(&self.cancel, || async {
                let ids = self.schedule_ids(has_room);
                if ids.is_empty() {
                    return Ok(HashMap::new());
                }
                let options = RoomOptions { include_score: true, include_comment: true };
                match self.providers.live.get_scores_and_comments(&ids, options).await {
                    Ok(rooms) => Ok(rooms),
                    Err(e) => {
                        tracing::warn!(error = %e, schedules = ids.len(), "live room data unavailable, continuing without scores");
                        Ok(HashMap::new())
                    },
                }
            })
            .await
    }

    /// Distinct relation targets of one type across the batch.
    async fn relation_ids(&self, relation_type: RelationType) -> ServiceResult<Vec<String>> {
        let relations = self.schedule_relations().await?;
        Ok(dedup(
            relations
                .values()
                .flatten()
                .filter(|r| r.relation_type == relation_type)
                .map(|r| r.relation_id.as_str()),
        ))
    }
}

/// The plan a schedule points at: the snapshot's plan when one exists.
pub(super) fn plan_id(schedule: &Schedule) -> &str {
    schedule.locked_content.as_ref().map_or(schedule.lesson_plan_id.as_str(), |l| l.plan.id.as_str())
}
