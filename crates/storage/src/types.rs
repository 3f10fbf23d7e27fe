//! Storage types shared across modules

use assess_report_core::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use assess_report_core::{
    ParticipationStatus, ReviewerFeedback, SubjectContent, SubjectKind, SubjectStatus,
    SubjectUserOutcome,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic paginated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Filter for the subject page query. Empty lists match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectFilter {
    #[serde(default)]
    pub kinds: Vec<SubjectKind>,
    #[serde(default)]
    pub statuses: Vec<SubjectStatus>,
    /// Restrict to subjects where this user takes part as a teacher.
    #[serde(default)]
    pub teacher_id: Option<String>,
    /// Case-insensitive substring match on the title.
    #[serde(default)]
    pub title: Option<String>,
}

/// One-based page request; oversized pages are clamped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Pager {
    #[must_use]
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page: page.max(1), page_size: page_size.clamp(1, MAX_PAGE_SIZE) }
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectUserUpdate {
    pub subject_user_id: String,
    pub status_by_user: ParticipationStatus,
}

/// Change set written atomically by [`crate::traits::UpdateStore::update_subjects_tx`].
///
/// Contents are upserted on `(subject_id, content_id)`, outcomes on their
/// [`assess_report_core::OutcomeKey`], reviewer feedback on
/// `(subject_user_id, student_feedback_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectUpdate {
    pub subject_id: String,
    pub status: SubjectStatus,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub users: Vec<SubjectUserUpdate>,
    #[serde(default)]
    pub contents: Vec<SubjectContent>,
    #[serde(default)]
    pub outcomes: Vec<SubjectUserOutcome>,
    #[serde(default)]
    pub reviewer_feedbacks: Vec<ReviewerFeedback>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_clamps_and_offsets() {
        let pager = Pager::new(0, 10_000);
        assert_eq!(pager.page, 1);
        assert_eq!(pager.limit(), MAX_PAGE_SIZE);
        assert_eq!(pager.offset(), 0);
        assert_eq!(Pager::new(3, 20).offset(), 40);
    }
}
