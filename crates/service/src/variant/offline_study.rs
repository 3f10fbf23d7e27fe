//! Home study: students hand in feedback which a teacher reviews. There is
//! no live room, so progress and attempts come from the feedback records.

use std::collections::HashMap;

use assess_report_core::{ScoreSummary, Subject, SubjectKind};
use async_trait::async_trait;

use super::{VariantStrategy, shared};
use crate::error::ServiceResult;
use crate::report::{FeedbackRow, StudentRow};
use crate::session::{AggregationSession, ById};

#[derive(Debug, Clone, Copy)]
pub struct OfflineStudy;

#[async_trait]
impl VariantStrategy for OfflineStudy {
    fn kind(&self) -> SubjectKind {
        SubjectKind::OfflineStudy
    }

    fn uses_room(&self) -> bool {
        false
    }

    /// Students with a submission over every student, declined ones included.
    async fn complete_rate(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<f64>> {
        let schedules = session.schedules().await?;
        let feedbacks = session.student_feedbacks().await?;
        let mut out = HashMap::with_capacity(subjects.len());
        for subject in subjects {
            if !schedules.contains_key(&subject.schedule_id) {
                continue;
            }
            let submitted = feedbacks.get(&subject.schedule_id);
            let students = session.students(&subject.id).await?;
            let handed_in = students
                .iter()
                .filter(|s| submitted.is_some_and(|f| f.iter().any(|fb| fb.student_id == s.user_id)))
                .count();
            out.insert(subject.id.clone(), shared::bounded_rate(&subject.id, handed_in, students.len()));
        }
        Ok(out)
    }

    async fn students(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<Vec<StudentRow>>> {
        let schedules = session.schedules().await?;
        let feedbacks = session.student_feedbacks().await?;
        let reviews = session.reviewer_feedbacks().await?;
        let mut outcomes = shared::student_outcomes(session, subjects).await?;

        let mut out = HashMap::with_capacity(subjects.len());
        for subject in subjects {
            if !schedules.contains_key(&subject.schedule_id) {
                continue;
            }
            let submitted = feedbacks.get(&subject.schedule_id);
            let mut subject_outcomes = outcomes.remove(&subject.id).unwrap_or_default();
            let rows = session
                .students(&subject.id)
                .await?
                .into_iter()
                .map(|student| {
                    let latest = submitted
                        .into_iter()
                        .flatten()
                        .filter(|f| f.student_id == student.user_id)
                        .max_by_key(|f| f.submitted_at);
                    let feedback = latest.map(|f| FeedbackRow {
                        feedback_id: f.id.clone(),
                        attachment_names: f.attachment_names.clone(),
                        submitted_at: f.submitted_at,
                        reviewer_comment: reviews
                            .get(&student.id)
                            .and_then(|r| r.iter().find(|r| r.student_feedback_id == f.id))
                            .map(|r| r.reviewer_comment.clone())
                            .filter(|c| !c.is_empty()),
                    });
                    StudentRow {
                        student_id: student.user_id.clone(),
                        participation: student.status_by_user,
                        attempted: feedback.is_some(),
                        score: ScoreSummary::default(),
                        content_scores: Vec::new(),
                        comments: Vec::new(),
                        outcomes: subject_outcomes.remove(&student.user_id).unwrap_or_default(),
                        feedback,
                    }
                })
                .collect();
            out.insert(subject.id.clone(), rows);
        }
        Ok(out)
    }

    async fn anyone_attempted(&self, session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<bool>> {
        let feedbacks = session.student_feedbacks().await?;
        Ok(subjects
            .iter()
            .map(|s| (s.id.clone(), feedbacks.get(&s.schedule_id).is_some_and(|f| !f.is_empty())))
            .collect())
    }
}
