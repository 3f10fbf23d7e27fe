use std::collections::HashMap;

use async_trait::async_trait;
use assess_report_core::{ClassInfo, DirectoryProvider, Program, ProviderResult, SubjectArea, User};

use crate::client::ProviderClient;
use crate::wire::key_by;

#[derive(Debug, Clone)]
pub struct HttpDirectoryProvider {
    client: ProviderClient,
}

impl HttpDirectoryProvider {
    #[must_use]
    pub const fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DirectoryProvider for HttpDirectoryProvider {
    async fn batch_get_users(&self, ids: &[String]) -> ProviderResult<HashMap<String, User>> {
        let items: Vec<User> = self.client.batch_list("/v1/users/batch_get", ids).await?;
        Ok(key_by(items, |u| u.id.as_str()))
    }

    async fn batch_get_programs(&self, ids: &[String]) -> ProviderResult<HashMap<String, Program>> {
        let items: Vec<Program> = self.client.batch_list("/v1/programs/batch_get", ids).await?;
        Ok(key_by(items, |p| p.id.as_str()))
    }

    async fn batch_get_subject_areas(
        &self,
        ids: &[String],
    ) -> ProviderResult<HashMap<String, SubjectArea>> {
        let items: Vec<SubjectArea> = self.client.batch_list("/v1/subject_areas/batch_get", ids).await?;
        Ok(key_by(items, |s| s.id.as_str()))
    }

    async fn batch_get_classes(&self, ids: &[String]) -> ProviderResult<HashMap<String, ClassInfo>> {
        let items: Vec<ClassInfo> = self.client.batch_list("/v1/classes/batch_get", ids).await?;
        Ok(key_by(items, |c| c.id.as_str()))
    }
}
