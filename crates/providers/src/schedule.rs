use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{
    ProviderResult, Schedule, ScheduleProvider, ScheduleRelation, StudentFeedback, StudentReview,
};

use crate::client::ProviderClient;
use crate::wire::{group_by, key_by};

#[derive(Debug, Clone)]
pub struct HttpScheduleProvider {
    client: ProviderClient,
}

impl HttpScheduleProvider {
    #[must_use]
    pub const fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScheduleProvider for HttpScheduleProvider {
    async fn batch_get(&self, ids: &[String]) -> ProviderResult<HashMap<String, Schedule>> {
        let items: Vec<Schedule> = self.client.batch_list("/v1/schedules/batch_get", ids).await?;
        Ok(key_by(items, |s| s.id.as_str()))
    }

    async fn get_relations(
        &self,
        schedule_ids: &[String],
    ) -> ProviderResult<HashMap<String, Vec<ScheduleRelation>>> {
        let items: Vec<ScheduleRelation> =
            self.client.batch_list("/v1/schedules/relations", schedule_ids).await?;
        Ok(group_by(items, |r| r.schedule_id.as_str()))
    }

    async fn get_student_reviews(
        &self,
        schedule_ids: &[String],
    ) -> ProviderResult<HashMap<String, Vec<StudentReview>>> {
        let items: Vec<StudentReview> =
            self.client.batch_list("/v1/schedules/student_reviews", schedule_ids).await?;
        Ok(group_by(items, |r| r.schedule_id.as_str()))
    }

    async fn get_student_feedbacks(
        &self,
        schedule_ids: &[String],
    ) -> ProviderResult<HashMap<String, Vec<StudentFeedback>>> {
        let items: Vec<StudentFeedback> =
            self.client.batch_list("/v1/schedules/student_feedbacks", schedule_ids).await?;
        Ok(group_by(items, |f| f.schedule_id.as_str()))
    }
}
