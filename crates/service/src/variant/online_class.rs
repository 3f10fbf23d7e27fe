use assess_report_core::{Subject, SubjectKind};
use async_trait::async_trait;

use super::{VariantStrategy, shared};
use crate::error::ServiceResult;
use crate::report::NamedRef;
use crate::session::{AggregationSession, ById};

/// Live class. Teachers who declined the class are not listed.
#[derive(Debug, Clone, Copy)]
pub struct OnlineClass;

#[async_trait]
impl VariantStrategy for OnlineClass {
    fn kind(&self) -> SubjectKind {
        SubjectKind::OnlineClass
    }

    async fn teacher(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<Vec<NamedRef>>> {
        shared::teachers(session, subjects, false).await
    }

    async fn complete_rate(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<f64>> {
        shared::same_content_rate(session, subjects).await
    }
}
