//! In-process storage backend.
//!
//! Keeps every table in a `HashMap` behind one async `RwLock`. Updates are
//! applied to a copy of the tables and swapped in only when every step
//! succeeded, which gives the same all-or-nothing behaviour as a database
//! transaction. Used by the CLI demo mode and by the service test-suite.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use assess_report_core::{
    OutcomeKey, OutcomeStatus, ReviewerFeedback, Subject, SubjectContent, SubjectUser,
    SubjectUserOutcome, UserType,
};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::{AssessmentStore, SubjectStore, UpdateStore};
use crate::types::{PaginatedResult, Pager, SubjectFilter, SubjectUpdate};

#[derive(Debug, Default, Clone)]
struct Tables {
    subjects: HashMap<String, Subject>,
    users: Vec<SubjectUser>,
    contents: Vec<SubjectContent>,
    outcomes: BTreeMap<OutcomeKey, OutcomeStatus>,
    feedbacks: Vec<ReviewerFeedback>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the named trait operation has been invoked.
    #[must_use]
    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().map(|calls| calls.get(op).copied().unwrap_or(0)).unwrap_or(0)
    }

    fn record_call(&self, op: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(op).or_insert(0) += 1;
        }
    }

    pub async fn insert_subject(&self, subject: Subject) {
        self.tables.write().await.subjects.insert(subject.id.clone(), subject);
    }

    pub async fn insert_subject_user(&self, user: SubjectUser) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let clash = tables.users.iter().any(|u| {
            u.id == user.id
                || (u.subject_id == user.subject_id
                    && u.user_id == user.user_id
                    && u.user_type == user.user_type)
        });
        if clash {
            return Err(StorageError::Duplicate(format!(
                "subject user {} ({}) in subject {}",
                user.user_id, user.user_type, user.subject_id
            )));
        }
        tables.users.push(user);
        Ok(())
    }

    pub async fn insert_subject_content(&self, content: SubjectContent) {
        upsert_content(&mut self.tables.write().await.contents, content);
    }

    pub async fn insert_outcome(&self, outcome: SubjectUserOutcome) {
        self.tables.write().await.outcomes.insert(outcome.key, outcome.status);
    }

    pub async fn insert_reviewer_feedback(&self, feedback: ReviewerFeedback) {
        upsert_feedback(&mut self.tables.write().await.feedbacks, feedback);
    }

    /// Number of recorded outcome rows, for uniqueness checks.
    pub async fn outcome_row_count(&self) -> usize {
        self.tables.read().await.outcomes.len()
    }
}

fn upsert_content(contents: &mut Vec<SubjectContent>, content: SubjectContent) {
    match contents
        .iter_mut()
        .find(|c| c.subject_id == content.subject_id && c.content_id == content.content_id)
    {
        Some(existing) => {
            existing.status = content.status;
            existing.reviewer_comment = content.reviewer_comment;
            existing.content_type = content.content_type;
        },
        None => contents.push(content),
    }
}

fn upsert_feedback(feedbacks: &mut Vec<ReviewerFeedback>, feedback: ReviewerFeedback) {
    match feedbacks.iter_mut().find(|f| {
        f.subject_user_id == feedback.subject_user_id
            && f.student_feedback_id == feedback.student_feedback_id
    }) {
        Some(existing) => *existing = feedback,
        None => feedbacks.push(feedback),
    }
}

fn matches_filter(subject: &Subject, filter: &SubjectFilter, teacher_subjects: &HashSet<&str>) -> bool {
    if !filter.kinds.is_empty() && !filter.kinds.contains(&subject.kind) {
        return false;
    }
    if !filter.statuses.is_empty() && !filter.statuses.contains(&subject.status) {
        return false;
    }
    if filter.teacher_id.is_some() && !teacher_subjects.contains(subject.id.as_str()) {
        return false;
    }
    match filter.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(needle) => subject.title.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

fn apply_update(tables: &mut Tables, update: &SubjectUpdate) -> Result<(), StorageError> {
    let subject = tables.subjects.get_mut(&update.subject_id).ok_or_else(|| {
        StorageError::NotFound { entity: "subject", id: update.subject_id.clone() }
    })?;
    subject.status = update.status;
    subject.completed_at = update.completed_at;

    for change in &update.users {
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == change.subject_user_id && u.subject_id == update.subject_id)
            .ok_or_else(|| StorageError::NotFound {
                entity: "subject_user",
                id: change.subject_user_id.clone(),
            })?;
        user.status_by_user = change.status_by_user;
    }

    for content in &update.contents {
        upsert_content(&mut tables.contents, content.clone());
    }
    for outcome in &update.outcomes {
        tables.outcomes.insert(outcome.key.clone(), outcome.status);
    }
    for feedback in &update.reviewer_feedbacks {
        upsert_feedback(&mut tables.feedbacks, feedback.clone());
    }
    Ok(())
}

#[async_trait]
impl SubjectStore for MemoryStorage {
    async fn query_subjects(
        &self,
        filter: &SubjectFilter,
        pager: Pager,
    ) -> Result<PaginatedResult<Subject>, StorageError> {
        self.record_call("query_subjects");
        let tables = self.tables.read().await;
        let teacher_subjects: HashSet<&str> = match filter.teacher_id.as_deref() {
            Some(teacher) => tables
                .users
                .iter()
                .filter(|u| u.user_type == UserType::Teacher && u.user_id == teacher)
                .map(|u| u.subject_id.as_str())
                .collect(),
            None => HashSet::new(),
        };

        let mut matched: Vec<&Subject> = tables
            .subjects
            .values()
            .filter(|s| matches_filter(s, filter, &teacher_subjects))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matched.len() as u64;
        let items =
            matched.into_iter().skip(pager.offset()).take(pager.limit()).cloned().collect();
        Ok(PaginatedResult {
            items,
            total,
            offset: pager.offset() as u64,
            limit: pager.limit() as u64,
        })
    }

    async fn get_subject(&self, id: &str) -> Result<Option<Subject>, StorageError> {
        self.record_call("get_subject");
        Ok(self.tables.read().await.subjects.get(id).cloned())
    }
}

#[async_trait]
impl AssessmentStore for MemoryStorage {
    async fn get_subject_users(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectUser>>, StorageError> {
        self.record_call("get_subject_users");
        let wanted: HashSet<&str> = subject_ids.iter().map(String::as_str).collect();
        let mut grouped: HashMap<String, Vec<SubjectUser>> = HashMap::new();
        for user in &self.tables.read().await.users {
            if wanted.contains(user.subject_id.as_str()) {
                grouped.entry(user.subject_id.clone()).or_default().push(user.clone());
            }
        }
        Ok(grouped)
    }

    async fn get_subject_contents(
        &self,
        subject_ids: &[String],
    ) -> Result<HashMap<String, Vec<SubjectContent>>, StorageError> {
        self.record_call("get_subject_contents");
        let wanted: HashSet<&str> = subject_ids.iter().map(String::as_str).collect();
        let mut grouped: HashMap<String, Vec<SubjectContent>> = HashMap::new();
        for content in &self.tables.read().await.contents {
            if wanted.contains(content.subject_id.as_str()) {
                grouped.entry(content.subject_id.clone()).or_default().push(content.clone());
            }
        }
        Ok(grouped)
    }

    async fn get_user_outcomes(
        &self,
        subject_user_ids: &[String],
    ) -> Result<Vec<SubjectUserOutcome>, StorageError> {
        self.record_call("get_user_outcomes");
        let wanted: HashSet<&str> = subject_user_ids.iter().map(String::as_str).collect();
        Ok(self
            .tables
            .read()
            .await
            .outcomes
            .iter()
            .filter(|(key, _)| wanted.contains(key.subject_user_id.as_str()))
            .map(|(key, status)| SubjectUserOutcome { key: key.clone(), status: *status })
            .collect())
    }

    async fn get_reviewer_feedbacks(
        &self,
        subject_user_ids: &[String],
    ) -> Result<HashMap<String, Vec<ReviewerFeedback>>, StorageError> {
        self.record_call("get_reviewer_feedbacks");
        let wanted: HashSet<&str> = subject_user_ids.iter().map(String::as_str).collect();
        let mut grouped: HashMap<String, Vec<ReviewerFeedback>> = HashMap::new();
        for feedback in &self.tables.read().await.feedbacks {
            if wanted.contains(feedback.subject_user_id.as_str()) {
                grouped.entry(feedback.subject_user_id.clone()).or_default().push(feedback.clone());
            }
        }
        Ok(grouped)
    }
}

#[async_trait]
impl UpdateStore for MemoryStorage {
    async fn update_subjects_tx(&self, update: &SubjectUpdate) -> Result<(), StorageError> {
        self.record_call("update_subjects_tx");
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        apply_update(&mut next, update)?;
        *tables = next;
        tracing::debug!(
            subject_id = %update.subject_id,
            status = %update.status,
            contents = update.contents.len(),
            outcomes = update.outcomes.len(),
            "applied subject update"
        );
        Ok(())
    }
}
