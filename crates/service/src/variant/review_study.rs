use std::collections::HashMap;

use assess_report_core::{Subject, SubjectKind};
use async_trait::async_trait;

use super::{VariantStrategy, shared};
use crate::error::ServiceResult;
use crate::report::StudentContents;
use crate::session::{AggregationSession, ById};

/// Generated review. Every student works on a personal content set, so
/// progress is measured per assigned content tree.
#[derive(Debug, Clone, Copy)]
pub struct ReviewStudy;

#[async_trait]
impl VariantStrategy for ReviewStudy {
    fn kind(&self) -> SubjectKind {
        SubjectKind::ReviewStudy
    }

    async fn complete_rate(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<f64>> {
        shared::distinct_content_rate(session, subjects).await
    }

    async fn diff_content_students(
        &self,
        session: &AggregationSession,
        subjects: &[&Subject],
    ) -> ServiceResult<ById<Vec<StudentContents>>> {
        let sources = session.content_sources().await?;
        let stored = session.subject_contents().await?;
        let rooms = session.room_trees().await?;

        let mut out = HashMap::with_capacity(subjects.len());
        for subject in subjects {
            let Some(resolution) = sources.get(&subject.id) else { continue };
            let stored = stored.get(&subject.id).map_or(&[][..], Vec::as_slice);
            let room = rooms.get(&subject.id);
            let rows = session
                .students(&subject.id)
                .await?
                .into_iter()
                .filter(|student| resolution.has_assignment(&student.user_id))
                .map(|student| StudentContents {
                    student_id: student.user_id.clone(),
                    contents: shared::content_rows(
                        resolution,
                        stored,
                        room,
                        false,
                        resolution.contents_for(&student.user_id),
                    ),
                })
                .collect();
            out.insert(subject.id.clone(), rows);
        }
        Ok(out)
    }
}
