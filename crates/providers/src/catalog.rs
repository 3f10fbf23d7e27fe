use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{CatalogProvider, ContentView, Outcome, ProviderResult};

use crate::client::ProviderClient;
use crate::wire::{LatestIdEntry, key_by};

#[derive(Debug, Clone)]
pub struct HttpCatalogProvider {
    client: ProviderClient,
}

impl HttpCatalogProvider {
    #[must_use]
    pub const fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn batch_get_content(&self, ids: &[String]) -> ProviderResult<HashMap<String, ContentView>> {
        let items: Vec<ContentView> = self.client.batch_list("/v1/contents/batch_get", ids).await?;
        Ok(key_by(items, |c| c.id.as_str()))
    }

    async fn batch_get_outcomes(&self, ids: &[String]) -> ProviderResult<HashMap<String, Outcome>> {
        let items: Vec<Outcome> = self.client.batch_list("/v1/outcomes/batch_get", ids).await?;
        Ok(key_by(items, |o| o.id.as_str()))
    }

    async fn get_latest_content_ids(
        &self,
        ids: &[String],
    ) -> ProviderResult<HashMap<String, String>> {
        let items: Vec<LatestIdEntry> = self.client.batch_list("/v1/contents/latest_ids", ids).await?;
        Ok(items.into_iter().map(|e| (e.id, e.latest_id)).collect())
    }
}
