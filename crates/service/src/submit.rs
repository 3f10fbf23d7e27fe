//! Draft and complete submissions.
//!
//! A submission is fully validated before anything is written. Live-room
//! score and comment edits are pushed next, then every repository change is
//! written in one transaction. Completing a subject freezes the outcome
//! statuses in effect at that moment.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use assess_report_core::{
    AddCommentRequest, ContentKey, ContentStatus, OutcomeKey, OutcomeStatus, ParticipationStatus,
    ReviewerFeedback, SetScoreRequest, Subject, SubjectContent, SubjectContentType, SubjectKind,
    SubjectStatus, SubjectUser, SubjectUserOutcome,
};
use assess_report_storage::traits::UpdateStore;
use assess_report_storage::{SubjectUpdate, SubjectUserUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult, dependency};
use crate::outcome::OutcomeContext;
use crate::report_service::ReportService;
use crate::session::{AggregationSession, ContentResolution, ReportMode};
use crate::variant::strategy_for;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    Draft,
    Complete,
}

impl SubmitAction {
    #[must_use]
    pub const fn target_status(self) -> SubjectStatus {
        match self {
            Self::Draft => SubjectStatus::InDraft,
            Self::Complete => SubjectStatus::Complete,
        }
    }
}

impl FromStr for SubmitAction {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "complete" => Ok(Self::Complete),
            other => Err(ServiceError::invalid(format!("unknown action {other:?}"))),
        }
    }
}

/// Teacher edits. Enum-valued fields arrive as wire names and are checked
/// before anything happens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub students: Vec<StudentEdit>,
    #[serde(default)]
    pub contents: Vec<ContentEdit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentEdit {
    pub student_id: String,
    #[serde(default)]
    pub participation: Option<String>,
    #[serde(default)]
    pub scores: Vec<ScoreEdit>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub outcomes: Vec<OutcomeEdit>,
    /// Reviewer comment on the student's latest feedback (offline study).
    #[serde(default)]
    pub feedback_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEdit {
    pub content_id: String,
    #[serde(default)]
    pub sub_content_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEdit {
    pub content_id: String,
    pub outcome_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEdit {
    pub content_id: String,
    pub status: String,
    #[serde(default)]
    pub reviewer_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub subject_id: String,
    pub status: SubjectStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub scores_pushed: usize,
    pub comments_pushed: usize,
    pub outcomes_written: usize,
}

/// Request with every wire enum parsed.
struct Parsed<'r> {
    participation: Vec<(&'r str, ParticipationStatus)>,
    outcomes: Vec<(&'r str, &'r OutcomeEdit, OutcomeStatus)>,
    contents: Vec<(&'r ContentEdit, ContentStatus)>,
}

fn parse_request(request: &SubmitRequest) -> ServiceResult<Parsed<'_>> {
    let invalid = |e: assess_report_core::CoreError| ServiceError::invalid(e.to_string());
    let mut seen = HashSet::new();
    let mut parsed = Parsed { participation: Vec::new(), outcomes: Vec::new(), contents: Vec::new() };

    for student in &request.students {
        if !seen.insert(student.student_id.as_str()) {
            return Err(ServiceError::invalid(format!("student {} listed twice", student.student_id)));
        }
        if let Some(raw) = &student.participation {
            parsed.participation.push((student.student_id.as_str(), raw.parse().map_err(invalid)?));
        }
        for edit in &student.outcomes {
            parsed.outcomes.push((student.student_id.as_str(), edit, edit.status.parse().map_err(invalid)?));
        }
        if let Some(bad) = student.scores.iter().find(|s| !s.score.is_finite() || s.score < 0.0) {
            return Err(ServiceError::invalid(format!("score {} for {} is not a valid score", bad.score, bad.content_id)));
        }
    }
    for edit in &request.contents {
        parsed.contents.push((edit, edit.status.parse().map_err(invalid)?));
    }
    Ok(parsed)
}

impl ReportService {
    pub async fn submit_draft(
        &self,
        subject_id: &str,
        request: &SubmitRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<SubmitReceipt> {
        self.submit(subject_id, SubmitAction::Draft, request, cancel).await
    }

    pub async fn submit_complete(
        &self,
        subject_id: &str,
        request: &SubmitRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<SubmitReceipt> {
        self.submit(subject_id, SubmitAction::Complete, request, cancel).await
    }

    pub async fn submit(
        &self,
        subject_id: &str,
        action: SubmitAction,
        request: &SubmitRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<SubmitReceipt> {
        let parsed = parse_request(request)?;
        let subject = self.load_subject(subject_id, cancel).await?;
        if subject.status == SubjectStatus::Complete {
            return Err(ServiceError::AlreadyComplete(subject.id));
        }

        let session = self.session(vec![subject.clone()], ReportMode::Detail, cancel);
        session.require_schedule(&subject).await?;
        let strategy = strategy_for(subject.kind);
        let students = session.students(&subject.id).await?;
        let resolution = session.content_sources().await?.get(&subject.id).ok_or_else(|| {
            ServiceError::NotFound { entity: "schedule", id: subject.schedule_id.clone() }
        })?;

        validate_targets(&subject, request, &parsed, &students, resolution, strategy.uses_room())?;
        if action == SubmitAction::Complete && strategy.completion_requires_elapsed_window() {
            let remaining = strategy.remaining_time(&session, &[&subject]).await?;
            let secs = remaining.get(&subject.id).copied().unwrap_or(0);
            if secs > 0 {
                return Err(ServiceError::invalid(format!(
                    "subject {} cannot be completed for another {secs}s",
                    subject.id
                )));
            }
        }
        let update = self.build_update(&session, &subject, action, request, &parsed, &students, resolution).await?;

        let (scores_pushed, comments_pushed) = if strategy.uses_room() {
            self.push_room_edits(&session, &subject, request).await?
        } else {
            (0, 0)
        };

        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        self.storage.update_subjects_tx(&update).await?;
        tracing::info!(
            subject_id = %subject.id,
            action = ?action,
            contents = update.contents.len(),
            outcomes = update.outcomes.len(),
            scores_pushed,
            comments_pushed,
            "submission written"
        );

        Ok(SubmitReceipt {
            subject_id: subject.id,
            status: update.status,
            completed_at: update.completed_at,
            scores_pushed,
            comments_pushed,
            outcomes_written: update.outcomes.len(),
        })
    }

    async fn push_room_edits(
        &self,
        session: &AggregationSession,
        subject: &Subject,
        request: &SubmitRequest,
    ) -> ServiceResult<(usize, usize)> {
        let scores: Vec<SetScoreRequest> = request
            .students
            .iter()
            .flat_map(|student| {
                student.scores.iter().map(|edit| SetScoreRequest {
                    schedule_id: subject.schedule_id.clone(),
                    student_id: student.student_id.clone(),
                    key: ContentKey::new(edit.content_id.as_str(), edit.sub_content_id.as_str()),
                    score: edit.score,
                })
            })
            .collect();
        let comments: Vec<AddCommentRequest> = request
            .students
            .iter()
            .filter_map(|student| {
                let comment = student.comment.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
                Some(AddCommentRequest {
                    schedule_id: subject.schedule_id.clone(),
                    student_id: student.student_id.clone(),
                    comment: comment.to_owned(),
                })
            })
            .collect();

        let live = &session.providers().live;
        if !scores.is_empty() {
            live.batch_set_score(&scores).await.map_err(dependency("live"))?;
        }
        if !comments.is_empty() {
            live.batch_add_comment(&comments).await.map_err(dependency("live"))?;
        }
        Ok((scores.len(), comments.len()))
    }

    #[allow(clippy::too_many_arguments, reason = "one call site, all borrowed state of a submission")]
    async fn build_update(
        &self,
        session: &AggregationSession,
        subject: &Subject,
        action: SubmitAction,
        request: &SubmitRequest,
        parsed: &Parsed<'_>,
        students: &[&SubjectUser],
        resolution: &ContentResolution,
    ) -> ServiceResult<SubjectUpdate> {
        let now = session.now();
        let stored = session.subject_contents().await?;
        let stored = stored.get(&subject.id).map_or(&[][..], Vec::as_slice);
        let by_user: HashMap<&str, &SubjectUser> = students.iter().map(|s| (s.user_id.as_str(), *s)).collect();

        let mut contents = Vec::new();
        for content in resolution.contents() {
            let existing = stored.iter().find(|row| resolution.resolve(&row.content_id) == content.id);
            let edit = parsed.contents.iter().find(|(e, _)| resolution.resolve(&e.content_id) == content.id);
            contents.push(SubjectContent {
                id: existing.map_or_else(|| uuid::Uuid::new_v4().to_string(), |row| row.id.clone()),
                subject_id: subject.id.clone(),
                content_id: existing.map_or_else(|| content.id.clone(), |row| row.content_id.clone()),
                content_type: if resolution.is_plan(&content.id) {
                    SubjectContentType::Plan
                } else {
                    SubjectContentType::Material
                },
                status: edit.map(|(_, s)| *s).or(existing.map(|row| row.status)).unwrap_or_default(),
                reviewer_comment: edit
                    .and_then(|(e, _)| e.reviewer_comment.clone())
                    .or_else(|| existing.map(|row| row.reviewer_comment.clone()))
                    .unwrap_or_default(),
            });
        }

        let row_ids: HashMap<String, &str> = contents
            .iter()
            .map(|row| (resolution.resolve(&row.content_id).to_owned(), row.id.as_str()))
            .collect();
        let context = OutcomeContext {
            status: subject.status,
            resolution,
            content_rows: &contents,
            recorded: session.user_outcomes().await?,
            catalog: session.outcomes().await?,
            threshold: session.config().outcome_score_threshold,
        };
        let scores = session.room_scores().await?.get(&subject.id);

        let mut outcomes: HashMap<OutcomeKey, OutcomeStatus> = HashMap::new();
        for student in students {
            let effective = context.student_outcomes(student, scores.and_then(|s| s.get(&student.user_id)));
            for outcome in effective.into_iter().filter(|o| o.status != OutcomeStatus::Unknown) {
                let Some(row_id) = row_ids.get(&outcome.content_id) else { continue };
                outcomes.insert(OutcomeKey::new(student.id.as_str(), *row_id, outcome.outcome_id), outcome.status);
            }
        }
        for (student_id, edit, status) in &parsed.outcomes {
            let (Some(student), Some(row_id)) =
                (by_user.get(student_id), row_ids.get(resolution.resolve(&edit.content_id)))
            else {
                continue;
            };
            outcomes.insert(OutcomeKey::new(student.id.as_str(), *row_id, edit.outcome_id.as_str()), *status);
        }
        let mut outcomes: Vec<SubjectUserOutcome> =
            outcomes.into_iter().map(|(key, status)| SubjectUserOutcome { key, status }).collect();
        outcomes.sort_by(|a, b| a.key.cmp(&b.key));

        let users = parsed
            .participation
            .iter()
            .filter_map(|(student_id, status)| {
                by_user.get(student_id).map(|s| SubjectUserUpdate { subject_user_id: s.id.clone(), status_by_user: *status })
            })
            .collect();

        let reviewer_feedbacks = if subject.kind == SubjectKind::OfflineStudy {
            let feedbacks = session.student_feedbacks().await?;
            let submitted = feedbacks.get(&subject.schedule_id);
            request
                .students
                .iter()
                .filter_map(|edit| {
                    let comment = edit.feedback_comment.as_ref()?;
                    let student = by_user.get(edit.student_id.as_str())?;
                    let latest = submitted?
                        .iter()
                        .filter(|f| f.student_id == edit.student_id)
                        .max_by_key(|f| f.submitted_at)?;
                    Some(ReviewerFeedback {
                        subject_user_id: student.id.clone(),
                        student_feedback_id: latest.id.clone(),
                        reviewer_comment: comment.clone(),
                        reviewed_at: Some(now),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(SubjectUpdate {
            subject_id: subject.id.clone(),
            status: action.target_status(),
            completed_at: (action == SubmitAction::Complete).then_some(now),
            users,
            contents,
            outcomes,
            reviewer_feedbacks,
        })
    }
}

/// Every student, content and outcome named by the request must exist.
fn validate_targets(
    subject: &Subject,
    request: &SubmitRequest,
    parsed: &Parsed<'_>,
    students: &[&SubjectUser],
    resolution: &ContentResolution,
    uses_room: bool,
) -> ServiceResult<()> {
    let known: HashSet<&str> = students.iter().map(|s| s.user_id.as_str()).collect();
    for edit in &request.students {
        if !known.contains(edit.student_id.as_str()) {
            return Err(ServiceError::invalid(format!(
                "student {} is not in subject {}",
                edit.student_id, subject.id
            )));
        }
        if !uses_room && (!edit.scores.is_empty() || edit.comment.is_some()) {
            return Err(ServiceError::invalid(format!("{} subjects have no live room to score", subject.kind)));
        }
        if edit.feedback_comment.is_some() && subject.kind != SubjectKind::OfflineStudy {
            return Err(ServiceError::invalid("feedback comments only apply to offline study"));
        }
        if let Some(unknown) = edit.scores.iter().find(|s| resolution.content(&s.content_id).is_none()) {
            return Err(ServiceError::invalid(format!("unknown content {}", unknown.content_id)));
        }
    }
    for (_, edit, _) in &parsed.outcomes {
        let valid = resolution.content(&edit.content_id).is_some_and(|c| c.outcome_ids.contains(&edit.outcome_id));
        if !valid {
            return Err(ServiceError::invalid(format!(
                "outcome {} is not attached to content {}",
                edit.outcome_id, edit.content_id
            )));
        }
    }
    if let Some((unknown, _)) = parsed.contents.iter().find(|(e, _)| resolution.content(&e.content_id).is_none()) {
        return Err(ServiceError::invalid(format!("unknown content {}", unknown.content_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_enum_values_are_rejected_before_lookup() {
        let request = SubmitRequest {
            students: vec![StudentEdit {
                student_id: "s1".into(),
                participation: Some("maybe".into()),
                ..StudentEdit::default()
            }],
            contents: Vec::new(),
        };
        assert!(matches!(parse_request(&request), Err(ServiceError::InvalidArgs(_))));

        let request = SubmitRequest {
            students: Vec::new(),
            contents: vec![ContentEdit { content_id: "m1".into(), status: "half".into(), reviewer_comment: None }],
        };
        assert!(matches!(parse_request(&request), Err(ServiceError::InvalidArgs(_))));
    }

    #[test]
    fn duplicate_students_are_rejected() {
        let edit = StudentEdit { student_id: "s1".into(), ..StudentEdit::default() };
        let request = SubmitRequest { students: vec![edit.clone(), edit], contents: Vec::new() };
        assert!(matches!(parse_request(&request), Err(ServiceError::InvalidArgs(_))));
    }

    #[test]
    fn actions_parse_from_path_segments() {
        assert_eq!("Complete".parse::<SubmitAction>().ok(), Some(SubmitAction::Complete));
        assert!(matches!("finish".parse::<SubmitAction>(), Err(ServiceError::InvalidArgs(_))));
        assert_eq!(SubmitAction::Draft.target_status(), SubjectStatus::InDraft);
    }
}
