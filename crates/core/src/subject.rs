//! Subjects (assessments) and the rows the repository keeps for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::macros::wire_enum;

/// Subject variant; selects the computation strategy for derived attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Live class held in an online room.
    OnlineClass,
    /// Classroom lesson, scores may still be uploaded from the room.
    OfflineClass,
    /// Self-paced study with live-room content.
    OnlineStudy,
    /// Home study where students submit feedback for teacher review.
    OfflineStudy,
    /// Generated review where every student receives a personal content set.
    ReviewStudy,
}

wire_enum!(SubjectKind, "subject kind", {
    OnlineClass => "online_class",
    OfflineClass => "offline_class",
    OnlineStudy => "online_study",
    OfflineStudy => "offline_study",
    ReviewStudy => "review_study",
});

impl SubjectKind {
    /// Study kinds carry a due window and can only be completed once it elapses.
    #[must_use]
    pub const fn is_study(&self) -> bool {
        matches!(self, Self::OnlineStudy | Self::OfflineStudy | Self::ReviewStudy)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    NotStarted,
    Started,
    InDraft,
    Complete,
}

wire_enum!(SubjectStatus, "subject status", {
    NotStarted => "not_started",
    Started => "started",
    InDraft => "in_draft",
    Complete => "complete",
});

impl SubjectStatus {
    /// Drafted or completed subjects freeze inferred outcome achievement.
    #[must_use]
    pub const fn is_reviewed(&self) -> bool {
        matches!(self, Self::InDraft | Self::Complete)
    }
}

/// Marks subjects carried over from the pre-migration system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MigrationFlag {
    #[default]
    Current,
    Historical,
}

wire_enum!(MigrationFlag, "migration flag", {
    Current => "current",
    Historical => "historical",
});

/// Root record under report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: String,
    pub kind: SubjectKind,
    pub schedule_id: String,
    pub title: String,
    pub status: SubjectStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub migration_flag: MigrationFlag,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Teacher,
    Student,
}

wire_enum!(UserType, "user type", {
    Teacher => "teacher",
    Student => "student",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    #[default]
    Participate,
    NotParticipate,
}

wire_enum!(ParticipationStatus, "participation status", {
    Participate => "participate",
    NotParticipate => "not_participate",
});

/// A teacher or student attached to a subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectUser {
    pub id: String,
    pub subject_id: String,
    pub user_id: String,
    pub user_type: UserType,
    #[serde(default)]
    pub status_by_user: ParticipationStatus,
    #[serde(default)]
    pub status_by_system: ParticipationStatus,
}

impl SubjectUser {
    #[must_use]
    pub fn is_teacher(&self) -> bool {
        self.user_type == UserType::Teacher
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.user_type == UserType::Student
    }

    /// The user declined to take part in the subject.
    #[must_use]
    pub fn declined(&self) -> bool {
        self.status_by_user == ParticipationStatus::NotParticipate
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubjectContentType {
    Plan,
    Material,
}

wire_enum!(SubjectContentType, "content type", {
    Plan => "plan",
    Material => "material",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Covered,
    NotCovered,
}

wire_enum!(ContentStatus, "content status", {
    Covered => "covered",
    NotCovered => "not_covered",
});

/// Teacher-reviewed coverage state of one lesson item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectContent {
    pub id: String,
    pub subject_id: String,
    pub content_id: String,
    pub content_type: SubjectContentType,
    pub status: ContentStatus,
    #[serde(default)]
    pub reviewer_comment: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    #[default]
    Unknown,
    Achieved,
    NotAchieved,
}

wire_enum!(OutcomeStatus, "outcome status", {
    Unknown => "unknown",
    Achieved => "achieved",
    NotAchieved => "not_achieved",
});

/// Identity of a recorded outcome; at most one row exists per key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutcomeKey {
    pub subject_user_id: String,
    pub subject_content_id: String,
    pub outcome_id: String,
}

impl OutcomeKey {
    #[must_use]
    pub fn new(
        subject_user_id: impl Into<String>,
        subject_content_id: impl Into<String>,
        outcome_id: impl Into<String>,
    ) -> Self {
        Self {
            subject_user_id: subject_user_id.into(),
            subject_content_id: subject_content_id.into(),
            outcome_id: outcome_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectUserOutcome {
    #[serde(flatten)]
    pub key: OutcomeKey,
    pub status: OutcomeStatus,
}

/// Teacher's review of a student's submitted feedback (offline study).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewerFeedback {
    pub subject_user_id: String,
    pub student_feedback_id: String,
    #[serde(default)]
    pub reviewer_comment: String,
    pub reviewed_at: Option<DateTime<Utc>>,
}
