//! Content and outcome catalog projections.

use serde::{Deserialize, Serialize};

use crate::macros::wire_enum;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Plan,
    Material,
    #[default]
    Unknown,
}

wire_enum!(ContentType, "content type", {
    Plan => "plan",
    Material => "material",
    Unknown => "unknown",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Interactive item that embeds scored sub-items.
    HasChildren,
    H5p,
    Video,
    Audio,
    Image,
    Document,
    #[default]
    Other,
}

wire_enum!(FileType, "file type", {
    HasChildren => "has_children",
    H5p => "h5p",
    Video => "video",
    Audio => "audio",
    Image => "image",
    Document => "document",
    Other => "other",
});

impl FileType {
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::HasChildren)
    }
}

/// Denormalized catalog item: either the locked snapshot stored on a schedule
/// or the latest catalog version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentView {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub outcome_ids: Vec<String>,
    pub content_type: ContentType,
    /// Id of the newest catalog version of this item; equals `id` when current.
    #[serde(default)]
    pub latest_id: String,
    #[serde(default)]
    pub file_type: FileType,
    /// Materials referenced by a lesson plan, in lesson order.
    #[serde(default)]
    pub material_ids: Vec<String>,
}

/// Learning outcome from the outcome catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub id: String,
    pub name: String,
    /// Assumed outcomes count as achieved unless a teacher records otherwise.
    #[serde(default)]
    pub assumed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_has_children_is_a_container() {
        assert!(FileType::HasChildren.is_container());
        assert!(!FileType::H5p.is_container());
    }
}
