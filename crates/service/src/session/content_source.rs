//! Per-subject content resolution.
//!
//! Decides once per subject whether its lesson content comes from the locked
//! snapshot, the latest catalog or the students' review assignments, and
//! carries the old-to-latest id remap every later join must go through.

use std::collections::{HashMap, HashSet};

use assess_report_core::{ContentView, MigrationFlag, Schedule, Subject, SubjectKind, SubjectStatus};
use serde::Serialize;

use super::raw::plan_id;
use super::{AggregationSession, ById};
use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Snapshot stored on the schedule when it was locked.
    Locked,
    /// Newest catalog versions, reached through the id remap.
    Latest,
    /// Union of the contents assigned to each student.
    Review,
}

#[derive(Debug, Clone)]
pub struct ContentResolution {
    pub source: ContentSource,
    pub plan: Option<ContentView>,
    /// Lesson materials in lesson order, or the assigned review contents.
    pub materials: Vec<ContentView>,
    id_map: HashMap<String, String>,
    assignments: HashMap<String, Vec<String>>,
}

impl ContentResolution {
    fn new(source: ContentSource, plan: Option<ContentView>, materials: Vec<ContentView>) -> Self {
        Self { source, plan, materials, id_map: HashMap::new(), assignments: HashMap::new() }
    }

    /// The id a stored or recorded content id joins on.
    #[must_use]
    pub fn resolve<'a>(&'a self, content_id: &'a str) -> &'a str {
        self.id_map.get(content_id).map_or(content_id, String::as_str)
    }

    /// Plan first, then materials.
    pub fn contents(&self) -> impl Iterator<Item = &ContentView> {
        self.plan.iter().chain(&self.materials)
    }

    #[must_use]
    pub fn content(&self, content_id: &str) -> Option<&ContentView> {
        let id = self.resolve(content_id);
        self.contents().find(|c| c.id == id)
    }

    #[must_use]
    pub fn is_plan(&self, content_id: &str) -> bool {
        self.plan.as_ref().is_some_and(|p| p.id == self.resolve(content_id))
    }

    #[must_use]
    pub fn is_material(&self, content_id: &str) -> bool {
        let id = self.resolve(content_id);
        self.materials.iter().any(|m| m.id == id)
    }

    /// Contents a student works on: their assignment for review subjects,
    /// every material otherwise.
    #[must_use]
    pub fn contents_for(&self, student_id: &str) -> Vec<&ContentView> {
        if self.source != ContentSource::Review {
            return self.materials.iter().collect();
        }
        self.assignments
            .get(student_id)
            .map(|ids| ids.iter().filter_map(|id| self.materials.iter().find(|m| &m.id == id)).collect())
            .unwrap_or_default()
    }

    /// Whether the student was assigned a content set (review subjects only).
    #[must_use]
    pub fn has_assignment(&self, student_id: &str) -> bool {
        self.assignments.contains_key(student_id)
    }
}

impl AggregationSession {
    /// Historical subjects that already started keep the snapshot taken when
    /// their schedule was locked.
    pub(super) fn is_locked_source(&self, subject: &Subject, schedule: &Schedule) -> bool {
        schedule.is_locked()
            && subject.migration_flag == MigrationFlag::Historical
            && subject.status != SubjectStatus::NotStarted
    }

    /// Content resolution of every subject whose schedule is known.
    pub async fn content_sources(&self) -> ServiceResult<&ById<ContentResolution>> {
        self.cache
            .content_sources
            .get_or_fetch(&self.cancel, || async {
                let schedules = self.schedules().await?;
                let mut resolved = HashMap::with_capacity(self.subjects.len());

                for subject in &self.subjects {
                    let Some(schedule) = schedules.get(&subject.schedule_id) else {
                        tracing::warn!(
                            subject_id = %subject.id,
                            schedule_id = %subject.schedule_id,
                            "schedule not found, content unresolved"
                        );
                        continue;
                    };
                    let resolution = if subject.kind == SubjectKind::ReviewStudy {
                        self.review_resolution(subject).await?
                    } else if self.is_locked_source(subject, schedule) {
                        locked_resolution(schedule)
                    } else {
                        self.latest_resolution(subject, schedule).await?
                    };
                    resolved.insert(subject.id.clone(), resolution);
                }
                Ok(resolved)
            })
            .await
    }

    async fn latest_resolution(&self, subject: &Subject, schedule: &Schedule) -> ServiceResult<ContentResolution> {
        let latest = self.latest_content_ids().await?;
        let plans = self.latest_plans().await?;
        let materials = self.latest_materials().await?;
        let contents = self.subject_contents().await?;
        let rooms = self.room_infos().await?;

        let old_plan = plan_id(schedule);
        let plan_id = latest.get(old_plan).map_or(old_plan, String::as_str);
        let plan = plans.get(plan_id).cloned();
        if plan.is_none() {
            tracing::warn!(subject_id = %subject.id, plan_id, "lesson plan missing from catalog");
        }
        let lesson = plan
            .iter()
            .flat_map(|p| &p.material_ids)
            .filter_map(|id| materials.get(id.as_str()).cloned())
            .collect();

        let mut resolution = ContentResolution::new(ContentSource::Latest, plan, lesson);
        let known = schedule
            .locked_content
            .iter()
            .flat_map(|l| l.content_ids())
            .chain(std::iter::once(schedule.lesson_plan_id.as_str()))
            .chain(contents.get(&subject.id).into_iter().flatten().map(|c| c.content_id.as_str()))
            .chain(
                rooms
                    .get(&subject.schedule_id)
                    .into_iter()
                    .flat_map(|r| &r.users)
                    .flat_map(|u| &u.scores)
                    .map(|r| r.key.content_id.as_str()),
            );
        for old in known {
            if let Some(new) = latest.get(old).filter(|new| new.as_str() != old) {
                resolution.id_map.insert(old.to_owned(), new.clone());
            }
        }
        Ok(resolution)
    }

    async fn review_resolution(&self, subject: &Subject) -> ServiceResult<ContentResolution> {
        let reviews = self.student_reviews().await?;
        let catalog = self.review_contents().await?;

        let mut seen = HashSet::new();
        let mut materials = Vec::new();
        let mut assignments: HashMap<String, Vec<String>> = HashMap::new();
        for review in reviews.get(&subject.schedule_id).into_iter().flatten() {
            let assigned = assignments.entry(review.student_id.clone()).or_default();
            for id in &review.content_ids {
                let Some(content) = catalog.get(id) else {
                    tracing::debug!(subject_id = %subject.id, content_id = %id, "assigned review content not in catalog");
                    continue;
                };
                assigned.push(content.id.clone());
                if seen.insert(content.id.as_str()) {
                    materials.push(content.clone());
                }
            }
        }

        let mut resolution = ContentResolution::new(ContentSource::Review, None, materials);
        resolution.assignments = assignments;
        Ok(resolution)
    }
}

fn locked_resolution(schedule: &Schedule) -> ContentResolution {
    let (plan, materials) = schedule
        .locked_content
        .as_ref()
        .map(|l| (Some(l.plan.clone()), l.materials.clone()))
        .unwrap_or_default();
    ContentResolution::new(ContentSource::Locked, plan, materials)
}
