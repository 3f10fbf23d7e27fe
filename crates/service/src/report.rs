//! Reply records produced by the assembler.

use assess_report_core::{
    ContentStatus, FileType, OutcomeStatus, ParticipationStatus, ScoreSummary, Subject,
    SubjectKind, SubjectStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::ContentSource;

/// Id of a related entity, with its display name when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NamedRef {
    #[must_use]
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self { id: id.into(), name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRef {
    pub id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
}

/// One subject in a page, and the header of a detail reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectReport {
    pub id: String,
    pub title: String,
    pub kind: SubjectKind,
    pub status: SubjectStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub schedule: Option<ScheduleRef>,
    pub teachers: Vec<NamedRef>,
    pub lesson_plan: Option<NamedRef>,
    pub program: Option<NamedRef>,
    pub subject_areas: Vec<NamedRef>,
    pub classes: Vec<NamedRef>,
    pub complete_rate: Option<f64>,
    pub remaining_secs: Option<i64>,
    pub anyone_attempted: bool,
}

impl SubjectReport {
    /// Report carrying only the subject's own fields.
    #[must_use]
    pub fn bare(subject: &Subject) -> Self {
        Self {
            id: subject.id.clone(),
            title: subject.title.clone(),
            kind: subject.kind,
            status: subject.status,
            created_at: subject.created_at,
            completed_at: subject.completed_at,
            schedule: None,
            teachers: Vec::new(),
            lesson_plan: None,
            program: None,
            subject_areas: Vec::new(),
            classes: Vec::new(),
            complete_rate: None,
            remaining_secs: None,
            anyone_attempted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<SubjectReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailReport {
    #[serde(flatten)]
    pub summary: SubjectReport,
    pub content_source: Option<ContentSource>,
    pub contents: Vec<ContentRow>,
    pub outcomes: Vec<OutcomeReport>,
    pub students: Vec<StudentRow>,
    pub diff_content_students: Vec<StudentContents>,
}

/// A numbered lesson row. `"0"` is the plan, `"n"` a material and
/// `"n-i"` the i-th child of a container row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRow {
    pub number: String,
    pub depth: usize,
    pub content_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_content_id: String,
    pub name: String,
    pub file_type: FileType,
    pub is_plan: bool,
    pub status: Option<ContentStatus>,
    pub reviewer_comment: Option<String>,
    pub outcome_ids: Vec<String>,
    pub max_score: Option<f64>,
}

/// Achievement of one outcome across the subject's students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeReport {
    pub outcome_id: String,
    pub name: String,
    pub assumed: bool,
    pub content_ids: Vec<String>,
    pub achieved: usize,
    pub not_achieved: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentOutcome {
    pub outcome_id: String,
    pub content_id: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentScore {
    pub content_id: String,
    #[serde(flatten)]
    pub summary: ScoreSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRow {
    pub feedback_id: String,
    pub attachment_names: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewer_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRow {
    pub student_id: String,
    pub participation: ParticipationStatus,
    pub attempted: bool,
    pub score: ScoreSummary,
    pub content_scores: Vec<ContentScore>,
    pub comments: Vec<String>,
    pub outcomes: Vec<StudentOutcome>,
    pub feedback: Option<FeedbackRow>,
}

/// Numbered rows of a student's personal content set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentContents {
    pub student_id: String,
    pub contents: Vec<ContentRow>,
}
