//! Outcome achievement.
//!
//! A student's status for one outcome on one content is, in order: the
//! status a teacher recorded, `Achieved` for assumed outcomes, `Achieved`
//! when the score ratio reaches the configured threshold, else `Unknown`.
//! Once a subject is drafted or complete only recorded statuses count.

use std::collections::{BTreeMap, HashMap};

use assess_report_core::{
    ContentView, Outcome, OutcomeKey, OutcomeStatus, ScoreSummary, SubjectContent, SubjectStatus,
    SubjectUser,
};

use crate::report::{OutcomeReport, StudentOutcome};
use crate::session::{ById, ContentResolution};

#[must_use]
pub fn achievement(
    subject_status: SubjectStatus,
    recorded: Option<OutcomeStatus>,
    assumed: bool,
    score_ratio: Option<f64>,
    threshold: Option<f64>,
) -> OutcomeStatus {
    if let Some(status) = recorded.filter(|s| *s != OutcomeStatus::Unknown) {
        return status;
    }
    if subject_status.is_reviewed() {
        return OutcomeStatus::Unknown;
    }
    if assumed {
        return OutcomeStatus::Achieved;
    }
    match (score_ratio, threshold) {
        (Some(ratio), Some(threshold)) if ratio >= threshold => OutcomeStatus::Achieved,
        _ => OutcomeStatus::Unknown,
    }
}

/// Everything one subject's outcome evaluation reads.
pub(crate) struct OutcomeContext<'a> {
    pub status: SubjectStatus,
    pub resolution: &'a ContentResolution,
    pub content_rows: &'a [SubjectContent],
    pub recorded: &'a HashMap<OutcomeKey, OutcomeStatus>,
    pub catalog: &'a ById<Outcome>,
    pub threshold: Option<f64>,
}

impl OutcomeContext<'_> {
    /// Stored content row id for a resolved content id.
    pub(crate) fn row_id(&self, content_id: &str) -> Option<&str> {
        self.content_rows
            .iter()
            .find(|row| self.resolution.resolve(&row.content_id) == content_id)
            .map(|row| row.id.as_str())
    }

    /// Contents whose outcomes a student is evaluated on: the plan (when
    /// present) and the student's materials.
    fn evaluated_contents(&self, student: &SubjectUser) -> Vec<&ContentView> {
        let mut contents: Vec<&ContentView> = self.resolution.plan.iter().collect();
        contents.extend(self.resolution.contents_for(&student.user_id));
        contents
    }

    /// Effective statuses of one student. `scores` maps material ids to the
    /// student's roll-up; the plan uses the total over every material.
    pub(crate) fn student_outcomes(
        &self,
        student: &SubjectUser,
        scores: Option<&HashMap<String, ScoreSummary>>,
    ) -> Vec<StudentOutcome> {
        let total = scores.map(|s| ScoreSummary::merged(s.values()));
        let mut outcomes = Vec::new();
        for content in self.evaluated_contents(student) {
            let is_plan = self.resolution.plan.as_ref().is_some_and(|p| p.id == content.id);
            let ratio = if is_plan {
                total.and_then(|t| t.ratio())
            } else {
                scores.and_then(|s| s.get(&content.id)).and_then(ScoreSummary::ratio)
            };
            let row_id = self.row_id(&content.id);
            for outcome_id in &content.outcome_ids {
                let recorded = row_id.and_then(|row| {
                    self.recorded.get(&OutcomeKey::new(student.id.as_str(), row, outcome_id.as_str())).copied()
                });
                let assumed = self.catalog.get(outcome_id).is_some_and(|o| o.assumed);
                outcomes.push(StudentOutcome {
                    outcome_id: outcome_id.clone(),
                    content_id: content.id.clone(),
                    status: achievement(self.status, recorded, assumed, ratio, self.threshold),
                });
            }
        }
        outcomes
    }
}

/// Per-outcome counts over every student's statuses, in outcome id order.
/// Outcomes missing from the catalog are reported with an empty name.
#[must_use]
pub fn summarize(catalog: &ById<Outcome>, per_student: &[Vec<StudentOutcome>]) -> Vec<OutcomeReport> {
    let mut reports: BTreeMap<&str, OutcomeReport> = BTreeMap::new();
    for outcome in per_student.iter().flatten() {
        let report = reports.entry(outcome.outcome_id.as_str()).or_insert_with(|| {
            let known = catalog.get(&outcome.outcome_id);
            OutcomeReport {
                outcome_id: outcome.outcome_id.clone(),
                name: known.map(|o| o.name.clone()).unwrap_or_default(),
                assumed: known.is_some_and(|o| o.assumed),
                content_ids: Vec::new(),
                achieved: 0,
                not_achieved: 0,
                unknown: 0,
            }
        });
        if !report.content_ids.contains(&outcome.content_id) {
            report.content_ids.push(outcome.content_id.clone());
        }
        match outcome.status {
            OutcomeStatus::Achieved => report.achieved += 1,
            OutcomeStatus::NotAchieved => report.not_achieved += 1,
            OutcomeStatus::Unknown => report.unknown += 1,
        }
    }
    reports.into_values().collect()
}
