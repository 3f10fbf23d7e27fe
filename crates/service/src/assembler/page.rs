use std::collections::{BTreeMap, HashMap};

use assess_report_core::{Subject, SubjectKind};

use crate::error::ServiceResult;
use crate::report::SubjectReport;
use crate::session::AggregationSession;
use crate::variant::strategy_for;

/// One report per subject of the session, in session order.
pub(crate) async fn assemble_page(session: &AggregationSession) -> ServiceResult<Vec<SubjectReport>> {
    let mut groups: BTreeMap<SubjectKind, Vec<&Subject>> = BTreeMap::new();
    for subject in session.subjects() {
        groups.entry(subject.kind).or_default().push(subject);
    }

    let mut reports: HashMap<&str, SubjectReport> = HashMap::with_capacity(session.subjects().len());
    for (kind, group) in groups {
        let strategy = strategy_for(kind);
        let (
            mut schedules,
            mut teachers,
            mut plans,
            mut programs,
            mut areas,
            mut classes,
            rates,
            remaining,
            attempted,
        ) = tokio::try_join!(
            strategy.schedule(session, &group),
            strategy.teacher(session, &group),
            strategy.lesson_plan(session, &group),
            strategy.program(session, &group),
            strategy.subject_area(session, &group),
            strategy.class(session, &group),
            strategy.complete_rate(session, &group),
            strategy.remaining_time(session, &group),
            strategy.anyone_attempted(session, &group),
        )?;
        tracing::debug!(kind = %kind, subjects = group.len(), "kind group assembled");

        for subject in group {
            let id = &subject.id;
            let mut report = SubjectReport::bare(subject);
            report.schedule = schedules.remove(id);
            report.teachers = teachers.remove(id).unwrap_or_default();
            report.lesson_plan = plans.remove(id);
            report.program = programs.remove(id);
            report.subject_areas = areas.remove(id).unwrap_or_default();
            report.classes = classes.remove(id).unwrap_or_default();
            report.complete_rate = rates.get(id).copied();
            report.remaining_secs = remaining.get(id).copied();
            report.anyone_attempted = attempted.get(id).copied().unwrap_or(false);
            reports.insert(id.as_str(), report);
        }
    }

    Ok(session.subjects().iter().filter_map(|s| reports.remove(s.id.as_str())).collect())
}
