//! Schedules and the records hanging off them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ContentView;
use crate::macros::wire_enum;

/// Frozen copy of the lesson plan and its materials taken when the schedule
/// was locked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockedContent {
    pub plan: ContentView,
    #[serde(default)]
    pub materials: Vec<ContentView>,
}

impl LockedContent {
    /// Plan id followed by material ids, in lesson order.
    pub fn content_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.plan.id.as_str()).chain(self.materials.iter().map(|m| m.id.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub program_id: String,
    #[serde(default)]
    pub lesson_plan_id: String,
    #[serde(default)]
    pub locked_content: Option<LockedContent>,
    /// `None` (or the epoch sent by some providers) means no explicit due date.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

impl Schedule {
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked_content.is_some()
    }

    /// Explicit due date, treating a zero timestamp as absent.
    #[must_use]
    pub fn explicit_due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at.filter(|due| due.timestamp() > 0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    SubjectCategory,
    Class,
    Teacher,
    Student,
    Other,
}

wire_enum!(RelationType, "relation type", {
    SubjectCategory => "subject_category",
    Class => "class",
    Teacher => "teacher",
    Student => "student",
    Other => "other",
});

/// Typed edge from a schedule to another entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRelation {
    pub schedule_id: String,
    pub relation_type: RelationType,
    pub relation_id: String,
}

/// Personal content set assigned to one student of a review study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentReview {
    pub schedule_id: String,
    pub student_id: String,
    #[serde(default)]
    pub content_ids: Vec<String>,
}

/// Work a student handed in for an offline study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentFeedback {
    pub id: String,
    pub schedule_id: String,
    pub student_id: String,
    #[serde(default)]
    pub attachment_names: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}
