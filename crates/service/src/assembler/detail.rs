use assess_report_core::Subject;

use super::levels::warm_detail_caches;
use crate::error::ServiceResult;
use crate::report::{DetailReport, SubjectReport};
use crate::session::AggregationSession;
use crate::variant::strategy_for;

/// Detail reply for the session's single subject. A missing schedule is
/// `NotFound` here, unlike list replies.
pub(crate) async fn assemble_detail(session: &AggregationSession, subject: &Subject) -> ServiceResult<DetailReport> {
    session.require_schedule(subject).await?;
    warm_detail_caches(session).await?;

    let strategy = strategy_for(subject.kind);
    let group = [subject];
    let (
        mut schedule,
        mut teachers,
        mut plan,
        mut program,
        mut areas,
        mut classes,
        rate,
        remaining,
        attempted,
        mut outcomes,
        mut contents,
        mut students,
        mut diff_content_students,
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
        strategy.outcomes(session, &group),
        strategy.contents(session, &group),
        strategy.students(session, &group),
        strategy.diff_content_students(session, &group),
    )?;

    let id = &subject.id;
    let mut summary = SubjectReport::bare(subject);
    summary.schedule = schedule.remove(id);
    summary.teachers = teachers.remove(id).unwrap_or_default();
    summary.lesson_plan = plan.remove(id);
    summary.program = program.remove(id);
    summary.subject_areas = areas.remove(id).unwrap_or_default();
    summary.classes = classes.remove(id).unwrap_or_default();
    summary.complete_rate = rate.get(id).copied();
    summary.remaining_secs = remaining.get(id).copied();
    summary.anyone_attempted = attempted.get(id).copied().unwrap_or(false);

    let content_source = session.content_sources().await?.get(id).map(|r| r.source);
    Ok(DetailReport {
        summary,
        content_source,
        contents: contents.remove(id).unwrap_or_default(),
        outcomes: outcomes.remove(id).unwrap_or_default(),
        students: students.remove(id).unwrap_or_default(),
        diff_content_students: diff_content_students.remove(id).unwrap_or_default(),
    })
}
