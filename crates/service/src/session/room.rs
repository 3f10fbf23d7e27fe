//! Live-room views derived from the raw room data: content trees with ids
//! remapped to the subject's content source, per-student score roll-ups and
//! teacher comments.

use std::collections::{HashMap, HashSet};

use assess_report_core::{
    ContentKey, ContentNode, RoomInfo, RoomScoreRecord, ScoreSummary, SubjectKind, build_forest,
    roll_up,
};

use super::content_source::ContentResolution;
use super::{AggregationSession, ById};
use crate::error::ServiceResult;

/// Student id to material id to rolled-up score.
pub type StudentScores = HashMap<String, HashMap<String, ScoreSummary>>;

/// Room content structure of one subject plus every student's results.
#[derive(Debug, Clone, Default)]
pub struct SubjectRoom {
    forest: Vec<ContentNode<RoomScoreRecord>>,
    results: HashMap<String, HashMap<ContentKey, RoomScoreRecord>>,
}

impl SubjectRoom {
    /// Builds the structure from the first occurrence of every item across
    /// students, after remapping content ids through `resolution`.
    #[must_use]
    pub fn build(info: &RoomInfo, resolution: Option<&ContentResolution>) -> Self {
        let remap = |record: &RoomScoreRecord| {
            let mut record = record.clone();
            if let Some(resolution) = resolution {
                record.key.content_id = resolution.resolve(&record.key.content_id).to_owned();
            }
            record
        };

        let mut structure = Vec::new();
        let mut seen: HashSet<ContentKey> = HashSet::new();
        let mut results: HashMap<String, HashMap<ContentKey, RoomScoreRecord>> = HashMap::new();
        for user in &info.users {
            let per_user = results.entry(user.user_id.clone()).or_default();
            for record in user.scores.iter().map(remap) {
                if seen.insert(record.key.clone()) {
                    structure.push(record.clone());
                }
                per_user.insert(record.key.clone(), record);
            }
        }
        Self { forest: build_forest(structure), results }
    }

    #[must_use]
    pub fn forest(&self) -> &[ContentNode<RoomScoreRecord>] {
        &self.forest
    }

    /// Top-level node of a content, if the room saw it.
    #[must_use]
    pub fn root(&self, content_id: &str) -> Option<&ContentNode<RoomScoreRecord>> {
        let key = ContentKey::root(content_id);
        self.forest.iter().find(|node| node.item.key == key)
    }

    /// One student's results, shaped for [`assess_report_core::summarize_subtree`].
    #[must_use]
    pub fn results_of(&self, student_id: &str) -> HashMap<&ContentKey, &RoomScoreRecord> {
        self.results
            .get(student_id)
            .map(|records| records.iter().collect())
            .unwrap_or_default()
    }

    pub fn records_of(&self, student_id: &str) -> impl Iterator<Item = &RoomScoreRecord> {
        self.results.get(student_id).into_iter().flat_map(HashMap::values)
    }

    /// Whether any student attempted any item.
    #[must_use]
    pub fn any_attempted(&self) -> bool {
        self.results.values().flat_map(HashMap::values).any(RoomScoreRecord::attempted)
    }
}

impl AggregationSession {
    /// Room structure and results of every subject held in a live room.
    pub async fn room_trees(&self) -> ServiceResult<&ById<SubjectRoom>> {
        self.cache
            .room_trees
            .get_or_fetch(&self.cancel, || async {
                let rooms = self.room_infos().await?;
                let sources = self.content_sources().await?;
                Ok(self
                    .subjects
                    .iter()
                    .filter(|s| s.kind != SubjectKind::OfflineStudy)
                    .map(|s| {
                        let room = rooms
                            .get(&s.schedule_id)
                            .map(|info| SubjectRoom::build(info, sources.get(&s.id)))
                            .unwrap_or_default();
                        (s.id.clone(), room)
                    })
                    .collect())
            })
            .await
    }

    /// Per-student, per-material score roll-up of every room subject.
    pub async fn room_scores(&self) -> ServiceResult<&ById<StudentScores>> {
        self.cache
            .room_scores
            .get_or_fetch(&self.cancel, || async {
                let trees = self.room_trees().await?;
                Ok(trees
                    .iter()
                    .map(|(subject_id, room)| {
                        let scores = room
                            .results
                            .iter()
                            .map(|(student, records)| (student.clone(), roll_up(records.values())))
                            .collect();
                        (subject_id.clone(), scores)
                    })
                    .collect())
            })
            .await
    }

    /// Teacher comments from the live room, by subject then student.
    pub async fn room_comments(&self) -> ServiceResult<&ById<ById<Vec<String>>>> {
        self.cache
            .room_comments
            .get_or_fetch(&self.cancel, || async {
                let rooms = self.room_infos().await?;
                let mut comments: ById<ById<Vec<String>>> = HashMap::new();
                for subject in &self.subjects {
                    let Some(info) = rooms.get(&subject.schedule_id) else { continue };
                    let per_student = comments.entry(subject.id.clone()).or_default();
                    for comment in &info.comments {
                        per_student.entry(comment.student_id.clone()).or_default().push(comment.comment.clone());
                    }
                }
                Ok(comments)
            })
            .await
    }
}
