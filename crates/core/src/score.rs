//! Rolls room score records up to per-content totals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::content_tree::ContentNode;
use crate::room::{ContentKey, RoomScoreRecord};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Sum of attempted scores.
    pub score: f64,
    /// Sum of max scores of scored (non-container) items.
    pub max_score: f64,
    pub attempted_items: usize,
    pub scored_items: usize,
    pub seen: bool,
}

impl ScoreSummary {
    #[must_use]
    pub const fn attempted(&self) -> bool {
        self.attempted_items > 0
    }

    /// `score / max_score`, or `None` when nothing carries a max score.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        (self.max_score > 0.0).then(|| self.score / self.max_score)
    }

    /// Sum of several summaries, e.g. a student's total over every material.
    #[must_use]
    pub fn merged<'a>(parts: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut total = Self::default();
        for part in parts {
            total.absorb(part);
        }
        total
    }

    fn add_record(&mut self, record: &RoomScoreRecord) {
        self.seen |= record.seen;
        if record.file_type.is_container() {
            return;
        }
        self.max_score += record.max_score;
        self.scored_items += 1;
        if let Some(score) = record.score {
            self.score += score;
            self.attempted_items += 1;
        }
    }

    fn absorb(&mut self, other: &Self) {
        self.score += other.score;
        self.max_score += other.max_score;
        self.attempted_items += other.attempted_items;
        self.scored_items += other.scored_items;
        self.seen |= other.seen;
    }
}

/// Flat roll-up of one student's records, keyed by the material each record
/// aggregates into. Child rows land on their material's key; container rows
/// only contribute whether they were seen.
#[must_use]
pub fn roll_up<'a>(records: impl IntoIterator<Item = &'a RoomScoreRecord>) -> HashMap<String, ScoreSummary> {
    let mut totals: HashMap<String, ScoreSummary> = HashMap::new();
    for record in records {
        totals.entry(record.aggregate_key().to_owned()).or_default().add_record(record);
    }
    totals
}

/// Rolls up one student's results over a room content subtree. Structure and
/// max scores come from the tree, attempts from `results`.
#[must_use]
pub fn summarize_subtree(
    node: &ContentNode<RoomScoreRecord>,
    results: &HashMap<&ContentKey, &RoomScoreRecord>,
) -> ScoreSummary {
    let mut summary = ScoreSummary::default();
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        let own = results.get(&node.item.key).copied();
        summary.seen |= own.is_some_and(|r| r.seen);
        if node.item.file_type.is_container() && !node.children.is_empty() {
            stack.extend(node.children.iter().rev());
            continue;
        }
        summary.max_score += node.item.max_score;
        summary.scored_items += 1;
        if let Some(score) = own.and_then(|r| r.score) {
            summary.score += score;
            summary.attempted_items += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FileType;
    use crate::content_tree::build_forest;
    use crate::room::RoomContentType;

    fn rec(sub: &str, file_type: FileType, max: f64, score: Option<f64>) -> RoomScoreRecord {
        RoomScoreRecord {
            key: ContentKey::new("m1", sub),
            parent_sub_content_id: String::new(),
            content_type: if sub.is_empty() {
                RoomContentType::Material
            } else {
                RoomContentType::Unknown
            },
            file_type,
            name: String::new(),
            max_score: max,
            score,
            seen: score.is_some(),
            answer: None,
        }
    }

    #[test]
    fn container_rows_do_not_count_towards_max() {
        let records = vec![
            rec("", FileType::HasChildren, 10.0, None),
            rec("q1", FileType::H5p, 5.0, Some(3.0)),
            rec("q2", FileType::H5p, 5.0, Some(5.0)),
        ];
        let totals = roll_up(&records);
        let m1 = totals["m1"];
        assert_eq!(m1.max_score, 10.0);
        assert_eq!(m1.score, 8.0);
        assert_eq!(m1.ratio(), Some(0.8));
        assert_eq!(m1.attempted_items, 2);
    }

    #[test]
    fn unattempted_children_still_count_in_denominator() {
        let records =
            vec![rec("q1", FileType::H5p, 5.0, Some(5.0)), rec("q2", FileType::H5p, 5.0, None)];
        assert_eq!(roll_up(&records)["m1"].ratio(), Some(0.5));
    }

    #[test]
    fn subtree_summary_uses_tree_max_scores() {
        let structure = vec![
            rec("", FileType::HasChildren, 0.0, None),
            rec("q1", FileType::H5p, 5.0, None),
            rec("q2", FileType::H5p, 5.0, None),
        ];
        let forest = build_forest(structure);
        assert_eq!(forest.len(), 1);

        let answer = rec("q1", FileType::H5p, 5.0, Some(3.0));
        let results: HashMap<&ContentKey, &RoomScoreRecord> = [(&answer.key, &answer)].into();
        let summary = summarize_subtree(&forest[0], &results);
        assert_eq!(summary.max_score, 10.0);
        assert_eq!(summary.score, 3.0);
        assert!(summary.seen);
        assert_eq!(summary.scored_items, 2);
    }

    #[test]
    fn deeply_nested_groups_roll_up_to_their_leaf() {
        const DEPTH: usize = 100_000;
        let mut records: Vec<RoomScoreRecord> = (1..DEPTH)
            .map(|i| {
                let mut group = rec(&format!("g{i}"), FileType::HasChildren, 0.0, None);
                group.parent_sub_content_id = if i == 1 { String::new() } else { format!("g{}", i - 1) };
                group
            })
            .collect();
        records.insert(0, rec("", FileType::HasChildren, 0.0, None));
        let mut leaf = rec("q", FileType::H5p, 4.0, None);
        leaf.parent_sub_content_id = format!("g{}", DEPTH - 1);
        records.push(leaf);

        let forest = build_forest(records);
        assert_eq!(forest.len(), 1);
        let answer = rec("q", FileType::H5p, 4.0, Some(1.0));
        let results: HashMap<&ContentKey, &RoomScoreRecord> = [(&answer.key, &answer)].into();
        let summary = summarize_subtree(&forest[0], &results);
        assert_eq!(summary.max_score, 4.0);
        assert_eq!(summary.ratio(), Some(0.25));
    }

    #[test]
    fn merged_adds_parts() {
        let a = ScoreSummary { score: 2.0, max_score: 4.0, attempted_items: 1, scored_items: 2, seen: false };
        let b = ScoreSummary { score: 1.0, max_score: 1.0, attempted_items: 1, scored_items: 1, seen: true };
        let total = ScoreSummary::merged([&a, &b]);
        assert_eq!(total.ratio(), Some(0.6));
        assert_eq!(total.scored_items, 3);
        assert!(total.seen);
    }

    #[test]
    fn empty_roll_up_has_no_ratio() {
        assert_eq!(ScoreSummary::default().ratio(), None);
    }
}
