use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{
    AddCommentRequest, LiveSessionProvider, ProviderResult, RoomInfo, RoomOptions, SetScoreRequest,
};

use crate::client::ProviderClient;
use crate::wire::{CommandRequest, RoomEntry, RoomRequest};

#[derive(Debug, Clone)]
pub struct HttpLiveSessionProvider {
    client: ProviderClient,
}

impl HttpLiveSessionProvider {
    #[must_use]
    pub const fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LiveSessionProvider for HttpLiveSessionProvider {
    async fn get_scores_and_comments(
        &self,
        schedule_ids: &[String],
        options: RoomOptions,
    ) -> ProviderResult<HashMap<String, RoomInfo>> {
        let entries: Vec<RoomEntry> = self
            .client
            .batch_list_with("/v1/rooms/scores_and_comments", schedule_ids, |chunk| RoomRequest {
                schedule_ids: chunk,
                options,
            })
            .await?;
        Ok(entries.into_iter().map(|e| (e.schedule_id, e.info)).collect())
    }

    async fn batch_set_score(&self, requests: &[SetScoreRequest]) -> ProviderResult<()> {
        if requests.is_empty() {
            return Ok(());
        }
        self.client.post_command("/v1/rooms/scores", &CommandRequest { requests }).await
    }

    async fn batch_add_comment(&self, requests: &[AddCommentRequest]) -> ProviderResult<()> {
        if requests.is_empty() {
            return Ok(());
        }
        self.client.post_command("/v1/rooms/comments", &CommandRequest { requests }).await
    }
}
