//! Live-session ("room") score and comment records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::FileType;
use crate::macros::wire_enum;

/// Identity of a scored item inside a room. Nested sub-items share the
/// `content_id` of the material that embeds them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentKey {
    pub content_id: String,
    #[serde(default)]
    pub sub_content_id: String,
}

impl ContentKey {
    #[must_use]
    pub fn new(content_id: impl Into<String>, sub_content_id: impl Into<String>) -> Self {
        Self { content_id: content_id.into(), sub_content_id: sub_content_id.into() }
    }

    #[must_use]
    pub fn root(content_id: impl Into<String>) -> Self {
        Self::new(content_id, String::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content_id.is_empty() && self.sub_content_id.is_empty()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.sub_content_id.is_empty()
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sub_content_id.is_empty() {
            f.write_str(&self.content_id)
        } else {
            write!(f, "{}/{}", self.content_id, self.sub_content_id)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomContentType {
    /// Top-level lesson material played in the room.
    Material,
    /// Child row of a material; its identity only makes sense under a parent.
    #[default]
    Unknown,
    /// Provider-specific review content, not part of the live lesson.
    Review,
}

wire_enum!(RoomContentType, "room content type", {
    Material => "material",
    Unknown => "unknown",
    Review => "review",
});

/// One student's result for one room item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomScoreRecord {
    #[serde(flatten)]
    pub key: ContentKey,
    /// Sub-content id of the parent; empty when the parent is the material itself.
    #[serde(default)]
    pub parent_sub_content_id: String,
    #[serde(default)]
    pub content_type: RoomContentType,
    #[serde(default)]
    pub file_type: FileType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub max_score: f64,
    /// Present once the student attempted the item.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub answer: Option<String>,
}

impl RoomScoreRecord {
    /// Parent identity inferred from the key structure.
    #[must_use]
    pub fn parent_key(&self) -> Option<ContentKey> {
        if self.key.is_root() {
            None
        } else {
            Some(ContentKey::new(self.key.content_id.clone(), self.parent_sub_content_id.clone()))
        }
    }

    #[must_use]
    pub const fn attempted(&self) -> bool {
        self.score.is_some()
    }

    #[must_use]
    pub fn is_review(&self) -> bool {
        self.content_type == RoomContentType::Review
    }

    /// Key that score aggregation is attributed to: child rows roll into
    /// their material's key.
    #[must_use]
    pub fn aggregate_key(&self) -> &str {
        &self.key.content_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomUserScores {
    pub user_id: String,
    #[serde(default)]
    pub scores: Vec<RoomScoreRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomComment {
    pub student_id: String,
    pub teacher_id: String,
    pub comment: String,
}

/// Scores and comments gathered by the live-session provider for a schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RoomInfo {
    #[serde(default)]
    pub users: Vec<RoomUserScores>,
    #[serde(default)]
    pub comments: Vec<RoomComment>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RoomOptions {
    pub include_score: bool,
    pub include_comment: bool,
}

/// Score edit pushed back to the live-session provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetScoreRequest {
    pub schedule_id: String,
    pub student_id: String,
    #[serde(flatten)]
    pub key: ContentKey,
    pub score: f64,
}

/// Teacher comment pushed back to the live-session provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddCommentRequest {
    pub schedule_id: String,
    pub student_id: String,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, sub: &str, parent: &str) -> RoomScoreRecord {
        RoomScoreRecord {
            key: ContentKey::new(content, sub),
            parent_sub_content_id: parent.into(),
            content_type: RoomContentType::Unknown,
            file_type: FileType::H5p,
            name: String::new(),
            max_score: 1.0,
            score: None,
            seen: false,
            answer: None,
        }
    }

    #[test]
    fn material_row_has_no_parent() {
        assert_eq!(record("m1", "", "").parent_key(), None);
    }

    #[test]
    fn child_without_parent_sub_id_hangs_off_material() {
        assert_eq!(record("m1", "q1", "").parent_key(), Some(ContentKey::root("m1")));
        assert_eq!(record("m1", "q2", "q1").parent_key(), Some(ContentKey::new("m1", "q1")));
    }

    #[test]
    fn record_deserializes_flattened_key() {
        let json = r#"{"content_id":"m1","sub_content_id":"q1","score":3.0,"max_score":5.0}"#;
        let rec: RoomScoreRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.key, ContentKey::new("m1", "q1"));
        assert!(rec.attempted());
        assert_eq!(rec.content_type, RoomContentType::Unknown);
    }
}
