//! Attribute rules shared by several kinds.

use std::collections::HashMap;

use assess_report_core::{
    ContentView, RelationType, RoomScoreRecord, Schedule, ScheduleRelation, ScoreSummary, Subject,
    SubjectContent, summarize_subtree,
};
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ServiceResult;
use crate::outcome::{OutcomeContext, summarize};
use crate::report::{
    ContentRow, ContentScore, NamedRef, OutcomeReport, ScheduleRef, StudentOutcome, StudentRow,
};
use crate::session::{AggregationSession, ById, ContentResolution, ReportMode, SubjectRoom};

pub(super) async fn schedule(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<ScheduleRef>> {
    let schedules = session.schedules().await?;
    let mut out = HashMap::with_capacity(subjects.len());
    for subject in subjects {
        match schedules.get(&subject.schedule_id) {
            Some(s) => {
                out.insert(
                    subject.id.clone(),
                    ScheduleRef { id: s.id.clone(), title: s.title.clone(), due_at: s.explicit_due_at() },
                );
            },
            None => tracing::warn!(
                subject_id = %subject.id,
                schedule_id = %subject.schedule_id,
                "schedule not found, attribute omitted"
            ),
        }
    }
    Ok(out)
}

/// Teachers of each subject. Names are only looked up for list replies.
pub(super) async fn teachers(
    session: &AggregationSession,
    subjects: &[&Subject],
    include_declined: bool,
) -> ServiceResult<ById<Vec<NamedRef>>> {
    let users = session.subject_users().await?;
    let names = match session.mode() {
        ReportMode::List => Some(session.users().await?),
        ReportMode::Detail => None,
    };
    Ok(subjects
        .iter()
        .map(|subject| {
            let teachers = users
                .get(&subject.id)
                .into_iter()
                .flatten()
                .filter(|u| u.is_teacher() && (include_declined || !u.declined()))
                .map(|u| {
                    let name = names.and_then(|n| n.get(&u.user_id)).map(|n| n.name.clone());
                    NamedRef::new(u.user_id.clone(), name)
                })
                .collect();
            (subject.id.clone(), teachers)
        })
        .collect())
}

pub(super) async fn lesson_plan(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<NamedRef>> {
    let sources = session.content_sources().await?;
    Ok(subjects
        .iter()
        .filter_map(|subject| {
            let plan = sources.get(&subject.id)?.plan.as_ref()?;
            Some((subject.id.clone(), NamedRef::new(plan.id.clone(), Some(plan.name.clone()))))
        })
        .collect())
}

pub(super) async fn program(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<NamedRef>> {
    let schedules = session.schedules().await?;
    let programs = session.programs().await?;
    Ok(subjects
        .iter()
        .filter_map(|subject| {
            let program_id = schedules.get(&subject.schedule_id)?.program_id.as_str();
            if program_id.is_empty() {
                return None;
            }
            let name = programs.get(program_id).map(|p| p.name.clone());
            Some((subject.id.clone(), NamedRef::new(program_id, name)))
        })
        .collect())
}

pub(super) async fn subject_area(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<Vec<NamedRef>>> {
    let relations = session.schedule_relations().await?;
    let areas = session.subject_areas().await?;
    Ok(related(relations, subjects, RelationType::SubjectCategory, |id| {
        areas.get(id).map(|a| a.name.clone())
    }))
}

pub(super) async fn class(session: &AggregationSession, subjects: &[&Subject]) -> ServiceResult<ById<Vec<NamedRef>>> {
    let relations = session.schedule_relations().await?;
    let classes = session.classes().await?;
    Ok(related(relations, subjects, RelationType::Class, |id| classes.get(id).map(|c| c.name.clone())))
}

fn related(
    relations: &ById<Vec<ScheduleRelation>>,
    subjects: &[&Subject],
    relation_type: RelationType,
    name_of: impl Fn(&str) -> Option<String>,
) -> ById<Vec<NamedRef>> {
    subjects
        .iter()
        .map(|subject| {
            let refs = relations
                .get(&subject.schedule_id)
                .into_iter()
                .flatten()
                .filter(|r| r.relation_type == relation_type)
                .map(|r| NamedRef::new(r.relation_id.clone(), name_of(&r.relation_id)))
                .collect();
            (subject.id.clone(), refs)
        })
        .collect()
}

/// `numerator / denominator`, 0 for an empty denominator and clamped to 1.
pub(super) fn bounded_rate(subject_id: &str, numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss, reason = "item counts stay far below 2^52")]
    let rate = numerator as f64 / denominator as f64;
    if rate > 1.0 {
        tracing::warn!(subject_id, numerator, denominator, "completion rate above 1, clamping");
        return 1.0;
    }
    rate
}

/// Seen live leaf items over `students x materials`.
pub(super) async fn same_content_rate(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<f64>> {
    let sources = session.content_sources().await?;
    let rooms = session.room_trees().await?;
    let mut out = HashMap::with_capacity(subjects.len());
    for subject in subjects {
        let Some(resolution) = sources.get(&subject.id) else { continue };
        let students = session.participating_students(&subject.id).await?;
        let room = rooms.get(&subject.id);
        let counts_as_seen = |record: &&RoomScoreRecord| {
            record.seen
                && !record.file_type.is_container()
                && !record.is_review()
                && resolution.is_material(&record.key.content_id)
        };
        let seen: usize = students
            .iter()
            .map(|student| room.map_or(0, |r| r.records_of(&student.user_id).filter(counts_as_seen).count()))
            .sum();
        let expected = students.len() * resolution.materials.len();
        out.insert(subject.id.clone(), bounded_rate(&subject.id, seen, expected));
    }
    Ok(out)
}

/// Seen tree nodes over the size of every student's assigned content trees.
/// Assigned contents the room never saw count as one unseen node.
pub(super) async fn distinct_content_rate(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<f64>> {
    let sources = session.content_sources().await?;
    let rooms = session.room_trees().await?;
    let mut out = HashMap::with_capacity(subjects.len());
    for subject in subjects {
        let Some(resolution) = sources.get(&subject.id) else { continue };
        let room = rooms.get(&subject.id);
        let (mut seen, mut total) = (0_usize, 0_usize);
        for student in session.participating_students(&subject.id).await? {
            let results = room.map(|r| r.results_of(&student.user_id)).unwrap_or_default();
            for content in resolution.contents_for(&student.user_id) {
                let Some(node) = room.and_then(|r| r.root(&content.id)) else {
                    total += 1;
                    continue;
                };
                total += node.size();
                node.for_each(&mut |item: &RoomScoreRecord| {
                    if results.get(&item.key).is_some_and(|r| r.seen) {
                        seen += 1;
                    }
                });
            }
        }
        out.insert(subject.id.clone(), bounded_rate(&subject.id, seen, total));
    }
    Ok(out)
}

/// Seconds until the schedule's due date, or until the default window after
/// creation closes. Never negative.
#[must_use]
pub fn remaining_secs(subject: &Subject, schedule: &Schedule, window_secs: i64, now: DateTime<Utc>) -> i64 {
    let due = schedule.explicit_due_at().unwrap_or_else(|| {
        TimeDelta::try_seconds(window_secs)
            .and_then(|window| subject.created_at.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    });
    due.signed_duration_since(now).num_seconds().max(0)
}

pub(super) async fn remaining_time(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<i64>> {
    let schedules = session.schedules().await?;
    let window = session.config().default_window_secs;
    Ok(subjects
        .iter()
        .filter_map(|subject| {
            let schedule = schedules.get(&subject.schedule_id)?;
            Some((subject.id.clone(), remaining_secs(subject, schedule, window, session.now())))
        })
        .collect())
}

pub(super) async fn room_attempted(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<bool>> {
    let rooms = session.room_trees().await?;
    Ok(subjects
        .iter()
        .map(|s| (s.id.clone(), rooms.get(&s.id).is_some_and(SubjectRoom::any_attempted)))
        .collect())
}

/// Plan row `"0"` (when asked for), then numbered material rows with the
/// children of container materials taken from the room tree.
pub(crate) fn content_rows<'a>(
    resolution: &ContentResolution,
    stored: &[SubjectContent],
    room: Option<&SubjectRoom>,
    include_plan: bool,
    materials: impl IntoIterator<Item = &'a ContentView>,
) -> Vec<ContentRow> {
    let view_row = |number: String, view: &ContentView, is_plan: bool| {
        let stored = stored.iter().find(|row| resolution.resolve(&row.content_id) == view.id);
        ContentRow {
            number,
            depth: 0,
            content_id: view.id.clone(),
            sub_content_id: String::new(),
            name: view.name.clone(),
            file_type: view.file_type,
            is_plan,
            status: stored.map(|row| row.status),
            reviewer_comment: stored.map(|row| row.reviewer_comment.clone()).filter(|c| !c.is_empty()),
            outcome_ids: view.outcome_ids.clone(),
            max_score: None,
        }
    };

    let mut rows = Vec::new();
    if let Some(plan) = resolution.plan.as_ref().filter(|_| include_plan) {
        rows.push(view_row("0".to_owned(), plan, true));
    }
    for (idx, material) in materials.into_iter().enumerate() {
        let number = (idx + 1).to_string();
        let node = room.and_then(|r| r.root(&material.id));
        let mut row = view_row(number.clone(), material, false);
        row.max_score = node.map(|n| summarize_subtree(n, &HashMap::new()).max_score);
        rows.push(row);

        let Some(node) = node else { continue };
        let expands = |record: &RoomScoreRecord| record.file_type.is_container();
        rows.extend(node.numbered_rows(number, &expands).into_iter().skip(1).map(|numbered| {
            let item = numbered.item;
            ContentRow {
                number: numbered.number,
                depth: numbered.depth,
                content_id: item.key.content_id.clone(),
                sub_content_id: item.key.sub_content_id.clone(),
                name: item.name.clone(),
                file_type: item.file_type,
                is_plan: false,
                status: None,
                reviewer_comment: None,
                outcome_ids: Vec::new(),
                max_score: (!item.file_type.is_container()).then_some(item.max_score),
            }
        }));
    }
    rows
}

pub(super) async fn contents(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<Vec<ContentRow>>> {
    let sources = session.content_sources().await?;
    let stored = session.subject_contents().await?;
    let rooms = session.room_trees().await?;
    Ok(subjects
        .iter()
        .filter_map(|subject| {
            let resolution = sources.get(&subject.id)?;
            let rows = content_rows(
                resolution,
                stored.get(&subject.id).map_or(&[][..], Vec::as_slice),
                rooms.get(&subject.id),
                true,
                &resolution.materials,
            );
            Some((subject.id.clone(), rows))
        })
        .collect())
}

/// Effective outcome statuses, by subject then student user id.
pub(crate) async fn student_outcomes(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<ById<Vec<StudentOutcome>>>> {
    let sources = session.content_sources().await?;
    let stored = session.subject_contents().await?;
    let recorded = session.user_outcomes().await?;
    let catalog = session.outcomes().await?;
    let scores = session.room_scores().await?;

    let mut out = HashMap::with_capacity(subjects.len());
    for subject in subjects {
        let Some(resolution) = sources.get(&subject.id) else { continue };
        let context = OutcomeContext {
            status: subject.status,
            resolution,
            content_rows: stored.get(&subject.id).map_or(&[][..], Vec::as_slice),
            recorded,
            catalog,
            threshold: session.config().outcome_score_threshold,
        };
        let per_student = session
            .students(&subject.id)
            .await?
            .into_iter()
            .map(|student| {
                let student_scores = scores.get(&subject.id).and_then(|s| s.get(&student.user_id));
                (student.user_id.clone(), context.student_outcomes(student, student_scores))
            })
            .collect();
        out.insert(subject.id.clone(), per_student);
    }
    Ok(out)
}

pub(super) async fn outcomes(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<Vec<OutcomeReport>>> {
    let per_subject = student_outcomes(session, subjects).await?;
    let catalog = session.outcomes().await?;
    Ok(per_subject
        .into_iter()
        .map(|(subject_id, per_student)| {
            let rows: Vec<Vec<StudentOutcome>> = per_student.into_values().collect();
            (subject_id, summarize(catalog, &rows))
        })
        .collect())
}

/// Student rows built from live-room scores and comments.
pub(super) async fn room_students(
    session: &AggregationSession,
    subjects: &[&Subject],
) -> ServiceResult<ById<Vec<StudentRow>>> {
    let sources = session.content_sources().await?;
    let scores = session.room_scores().await?;
    let comments = session.room_comments().await?;
    let mut outcomes = student_outcomes(session, subjects).await?;

    let mut out = HashMap::with_capacity(subjects.len());
    for subject in subjects {
        let Some(resolution) = sources.get(&subject.id) else { continue };
        let mut subject_outcomes = outcomes.remove(&subject.id).unwrap_or_default();
        let rows = session
            .students(&subject.id)
            .await?
            .into_iter()
            .map(|student| {
                let per_material = scores.get(&subject.id).and_then(|s| s.get(&student.user_id));
                let content_scores: Vec<ContentScore> = resolution
                    .contents_for(&student.user_id)
                    .into_iter()
                    .map(|content| ContentScore {
                        content_id: content.id.clone(),
                        summary: per_material.and_then(|m| m.get(&content.id)).copied().unwrap_or_default(),
                    })
                    .collect();
                let score = ScoreSummary::merged(content_scores.iter().map(|c| &c.summary));
                StudentRow {
                    student_id: student.user_id.clone(),
                    participation: student.status_by_user,
                    attempted: score.attempted(),
                    score,
                    content_scores,
                    comments: comments
                        .get(&subject.id)
                        .and_then(|c| c.get(&student.user_id))
                        .cloned()
                        .unwrap_or_default(),
                    outcomes: subject_outcomes.remove(&student.user_id).unwrap_or_default(),
                    feedback: None,
                }
            })
            .collect();
        out.insert(subject.id.clone(), rows);
    }
    Ok(out)
}
