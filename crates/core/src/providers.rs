//! Provider collaborator interfaces.
//!
//! Every read is a batch lookup keyed by id and returns a map keyed by the
//! requested id; ids unknown to the provider are simply absent from the map.
//! Implementations must be idempotent and side-effect free for reads.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::catalog::{ContentView, Outcome};
use crate::directory::{ClassInfo, Program, SubjectArea, User};
use crate::error::ProviderResult;
use crate::room::{AddCommentRequest, RoomInfo, RoomOptions, SetScoreRequest};
use crate::schedule::{Schedule, ScheduleRelation, StudentFeedback, StudentReview};

#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn batch_get(&self, ids: &[String]) -> ProviderResult<HashMap<String, Schedule>>;

    /// Relations grouped by schedule id.
    async fn get_relations(
        &self,
        schedule_ids: &[String],
    ) -> ProviderResult<HashMap<String, Vec<ScheduleRelation>>>;

    /// Review content assignments grouped by schedule id.
    async fn get_student_reviews(
        &self,
        schedule_ids: &[String],
    ) -> ProviderResult<HashMap<String, Vec<StudentReview>>>;

    /// Submitted student feedback grouped by schedule id.
    async fn get_student_feedbacks(
        &self,
        schedule_ids: &[String],
    ) -> ProviderResult<HashMap<String, Vec<StudentFeedback>>>;
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn batch_get_content(&self, ids: &[String]) -> ProviderResult<HashMap<String, ContentView>>;

    async fn batch_get_outcomes(&self, ids: &[String]) -> ProviderResult<HashMap<String, Outcome>>;

    /// Maps each requested content id to the id of its newest version.
    async fn get_latest_content_ids(
        &self,
        ids: &[String],
    ) -> ProviderResult<HashMap<String, String>>;
}

#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    async fn batch_get_users(&self, ids: &[String]) -> ProviderResult<HashMap<String, User>>;

    async fn batch_get_programs(&self, ids: &[String]) -> ProviderResult<HashMap<String, Program>>;

    async fn batch_get_subject_areas(
        &self,
        ids: &[String],
    ) -> ProviderResult<HashMap<String, SubjectArea>>;

    async fn batch_get_classes(&self, ids: &[String]) -> ProviderResult<HashMap<String, ClassInfo>>;
}

#[async_trait]
pub trait LiveSessionProvider: Send + Sync {
    /// Room data keyed by schedule id.
    async fn get_scores_and_comments(
        &self,
        schedule_ids: &[String],
        options: RoomOptions,
    ) -> ProviderResult<HashMap<String, RoomInfo>>;

    async fn batch_set_score(&self, requests: &[SetScoreRequest]) -> ProviderResult<()>;

    async fn batch_add_comment(&self, requests: &[AddCommentRequest]) -> ProviderResult<()>;
}
