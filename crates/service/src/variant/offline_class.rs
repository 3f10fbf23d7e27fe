use assess_report_core::{Subject, SubjectKind};
use async_trait::async_trait;

use super::{OnlineClass, VariantStrategy};
use crate::error::ServiceResult;
use crate::session::{AggregationSession, ById};

#[derive(Debug, Clone, Copy)]
pub struct OfflineClass;

#[async_trait]
impl VariantStrategy for OfflineClass {
    fn kind(&self) -> SubjectKind {
        SubjectKind::OfflineClass
    }

    async fn complete_rate(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<f64>> {
        OnlineClass.complete_rate(session, subjects).await
    }
}
