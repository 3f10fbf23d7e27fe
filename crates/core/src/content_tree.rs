//! Builds a parent/child forest out of flat content identities and numbers
//! its rows for presentation.

use std::collections::HashMap;

use crate::room::{ContentKey, RoomScoreRecord};

/// Anything that carries its own identity and, optionally, its parent's.
pub trait TreeItem {
    fn identity(&self) -> &ContentKey;
    fn parent_identity(&self) -> Option<ContentKey>;
}

impl TreeItem for RoomScoreRecord {
    fn identity(&self) -> &ContentKey {
        &self.key
    }

    fn parent_identity(&self) -> Option<ContentKey> {
        self.parent_key()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode<T> {
    pub item: T,
    pub children: Vec<ContentNode<T>>,
}

impl<T> Drop for ContentNode<T> {
    // Unlinks descendants onto a heap stack so deep chains drop without recursion.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl<T> ContentNode<T> {
    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn size(&self) -> usize {
        let mut count = 0;
        self.for_each(&mut |_| count += 1);
        count
    }

    /// Pre-order traversal of the subtree.
    pub fn for_each<'a>(&'a self, f: &mut impl FnMut(&'a T)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            f(&node.item);
            stack.extend(node.children.iter().rev());
        }
    }

    /// Flattens the subtree into numbered rows. Container items are emitted and
    /// then descended into with `"<number>-<i>"`; other items are emitted once.
    #[must_use]
    pub fn numbered_rows(
        &self,
        number: String,
        is_container: &impl Fn(&T) -> bool,
    ) -> Vec<NumberedRow<'_, T>> {
        let mut rows = Vec::new();
        let mut stack = vec![(self, number, 0_usize)];
        while let Some((node, number, depth)) = stack.pop() {
            if is_container(&node.item) {
                stack.extend(
                    node.children
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(idx, child)| (child, format!("{number}-{}", idx + 1), depth + 1)),
                );
            }
            rows.push(NumberedRow { number, depth, item: &node.item });
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberedRow<'a, T> {
    pub number: String,
    pub depth: usize,
    pub item: &'a T,
}

/// Assembles a forest from flat items.
///
/// Each item is attached to the first item whose identity equals its parent
/// identity; items never claimed as a child become roots. Roots and siblings
/// keep input order. Items with an empty identity are dropped. A parent chain
/// that loops back on itself is cut at its earliest item, which becomes a root.
#[must_use]
pub fn build_forest<T: TreeItem>(items: Vec<T>) -> Vec<ContentNode<T>> {
    let items: Vec<T> = items
        .into_iter()
        .filter(|item| {
            let empty = item.identity().is_empty();
            if empty {
                tracing::warn!(
                    parent = ?item.parent_identity(),
                    "skipping content item with empty identity"
                );
            }
            !empty
        })
        .collect();

    let mut first_by_key: HashMap<&ContentKey, usize> = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        first_by_key.entry(item.identity()).or_insert(idx);
    }

    let mut parent: Vec<Option<usize>> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.parent_identity()
                .and_then(|key| first_by_key.get(&key).copied())
                .filter(|&p| p != idx)
        })
        .collect();
    drop(first_by_key);

    break_cycles(&mut parent, &items);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut roots = Vec::new();
    for (idx, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(idx),
            None => roots.push(idx),
        }
    }

    assemble(items, &roots, &children)
}

fn break_cycles<T: TreeItem>(parent: &mut [Option<usize>], items: &[T]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parent.len()];
    for start in 0..parent.len() {
        if state[start] != UNSEEN {
            continue;
        }
        let mut path: Vec<usize> = Vec::new();
        let mut cur = start;
        loop {
            if state[cur] == DONE {
                break;
            }
            if state[cur] == ON_PATH {
                if let Some(pos) = path.iter().position(|&p| p == cur) {
                    if let Some(&head) = path[pos..].iter().min() {
                        tracing::warn!(
                            content = %items[head].identity(),
                            cycle_len = path.len() - pos,
                            "content parent chain forms a cycle, promoting item to root"
                        );
                        parent[head] = None;
                    }
                }
                break;
            }
            state[cur] = ON_PATH;
            path.push(cur);
            match parent[cur] {
                Some(p) => cur = p,
                None => break,
            }
        }
        for idx in path {
            state[idx] = DONE;
        }
    }
}

/// Builds nodes in post-order so every child exists before its parent.
fn assemble<T>(items: Vec<T>, roots: &[usize], children: &[Vec<usize>]) -> Vec<ContentNode<T>> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut built: Vec<Option<ContentNode<T>>> = std::iter::repeat_with(|| None).take(slots.len()).collect();
    let mut forest = Vec::with_capacity(roots.len());
    for &root in roots {
        let mut stack = vec![(root, false)];
        while let Some((idx, expanded)) = stack.pop() {
            if !expanded {
                stack.push((idx, true));
                stack.extend(children[idx].iter().rev().map(|&c| (c, false)));
                continue;
            }
            let Some(item) = slots[idx].take() else { continue };
            let kids = children[idx].iter().filter_map(|&c| built[c].take()).collect();
            built[idx] = Some(ContentNode { item, children: kids });
        }
        forest.extend(built[root].take());
    }
    forest
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        key: ContentKey,
        parent: Option<ContentKey>,
    }

    impl TreeItem for Pair {
        fn identity(&self) -> &ContentKey {
            &self.key
        }

        fn parent_identity(&self) -> Option<ContentKey> {
            self.parent.clone()
        }
    }

    fn pair(id: &str, parent: Option<&str>) -> Pair {
        Pair { key: ContentKey::root(id), parent: parent.map(ContentKey::root) }
    }

    fn ids(nodes: &[ContentNode<Pair>]) -> Vec<&str> {
        nodes.iter().map(|n| n.item.key.content_id.as_str()).collect()
    }

    fn linked(node: &ContentNode<Pair>) -> bool {
        node.children
            .iter()
            .all(|c| c.item.parent.as_ref() == Some(&node.item.key) && linked(c))
    }

    #[test]
    fn children_attach_to_first_matching_parent() {
        let forest = build_forest(vec![
            pair("a", None),
            pair("b", Some("a")),
            pair("c", Some("b")),
            pair("d", None),
            pair("e", Some("a")),
        ]);
        assert_eq!(ids(&forest), vec!["a", "d"]);
        assert_eq!(ids(&forest[0].children), vec!["b", "e"]);
        assert_eq!(ids(&forest[0].children[0].children), vec!["c"]);
    }

    #[test]
    fn child_listed_before_parent_still_attaches() {
        let forest = build_forest(vec![pair("q1", Some("m1")), pair("m1", None)]);
        assert_eq!(ids(&forest), vec!["m1"]);
        assert_eq!(ids(&forest[0].children), vec!["q1"]);
    }

    #[test]
    fn missing_parent_becomes_root() {
        let forest = build_forest(vec![pair("q1", Some("gone")), pair("q2", Some(""))]);
        assert_eq!(ids(&forest), vec!["q1", "q2"]);
    }

    #[test]
    fn empty_identity_is_skipped() {
        let forest = build_forest(vec![pair("m1", None), pair("", Some("m1"))]);
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn cycle_is_broken_at_earliest_item() {
        let forest =
            build_forest(vec![pair("a", Some("c")), pair("b", Some("a")), pair("c", Some("b"))]);
        assert_eq!(ids(&forest), vec!["a"]);
        assert_eq!(forest[0].size(), 3);
    }

    #[test]
    fn self_parent_is_root() {
        let forest = build_forest(vec![pair("a", Some("a"))]);
        assert_eq!(ids(&forest), vec!["a"]);
    }

    #[test]
    fn numbering_recurses_into_containers_only() {
        let forest = build_forest(vec![
            pair("m1", None),
            pair("q1", Some("m1")),
            pair("q2", Some("m1")),
            pair("m2", None),
            pair("x", Some("m2")),
        ]);
        let is_container = |p: &Pair| p.key.content_id == "m1";
        let rows: Vec<_> = forest
            .iter()
            .enumerate()
            .flat_map(|(idx, root)| root.numbered_rows((idx + 1).to_string(), &is_container))
            .collect();
        let numbers: Vec<_> =
            rows.iter().map(|r| (r.number.as_str(), r.item.key.content_id.as_str())).collect();
        assert_eq!(numbers, vec![("1", "m1"), ("1-1", "q1"), ("1-2", "q2"), ("2", "m2")]);
    }

    #[test]
    fn nested_containers_get_dashed_numbers() {
        let forest =
            build_forest(vec![pair("m1", None), pair("g1", Some("m1")), pair("q1", Some("g1"))]);
        let rows = forest[0].numbered_rows("3".into(), &|_: &Pair| true);
        let numbers: Vec<_> = rows.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["3", "3-1", "3-1-1"]);
        assert_eq!(rows[2].depth, 2);
    }

    #[test]
    fn deep_parent_chain_does_not_recurse() {
        const DEPTH: usize = 200_000;
        let items: Vec<Pair> = (0..DEPTH)
            .map(|i| Pair {
                key: ContentKey::root(i.to_string()),
                parent: i.checked_sub(1).map(|p| ContentKey::root(p.to_string())),
            })
            .collect();
        let forest = build_forest(items);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].size(), DEPTH);
        let mut last = None;
        forest[0].for_each(&mut |p| last = Some(p.key.content_id.clone()));
        assert_eq!(last.as_deref(), Some("199999"));
    }

    proptest! {
        #[test]
        fn forest_contains_every_item_once(
            raw in proptest::collection::vec((0u8..12, proptest::option::of(0u8..14)), 0..40)
        ) {
            let items: Vec<Pair> = raw
                .iter()
                .map(|(id, parent)| Pair {
                    key: ContentKey::root(if *id == 0 { String::new() } else { id.to_string() }),
                    parent: parent.map(|p| ContentKey::root(p.to_string())),
                })
                .collect();
            let expected = items.iter().filter(|p| !p.key.is_empty()).count();
            let forest = build_forest(items);

            let mut seen = 0usize;
            for root in &forest {
                root.for_each(&mut |_| seen += 1);
                prop_assert!(linked(root));
            }
            prop_assert_eq!(seen, expected);
        }
    }
}
