//! Snapshot diffing.
//!
//! Two `SceneState`s share every untouched node, child list and table by
//! `Rc`, so the diff is pointer comparison over the id maps rather than a
//! deep structural compare.

use std::collections::HashSet;
use std::rc::Rc;
use weft_core::id::NodeId;
use weft_core::scene::SceneState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDiff {
    /// Ids only in the next snapshot, in its pre-order walk order.
    pub added: Vec<NodeId>,
    /// Ids only in the previous snapshot, in its pre-order walk order.
    pub removed: Vec<NodeId>,
    /// Ids in both whose node reference differs.
    pub updated: Vec<NodeId>,
    /// Parents whose child list reference differs (`None` = root list).
    pub children_changed: Vec<Option<NodeId>>,
    /// Some frame's theme override changed between the two versions.
    pub theme_override_changed: bool,
}

impl SceneDiff {
    pub fn between(prev: &SceneState, next: &SceneState) -> Self {
        let mut diff = SceneDiff::default();
        if prev.same_as(next) {
            return diff;
        }

        for id in next.walk() {
            match (prev.node_rc(id), next.node_rc(id)) {
                (None, Some(_)) => diff.added.push(id),
                (Some(a), Some(b)) if !Rc::ptr_eq(a, b) => {
                    if a.theme_override() != b.theme_override() {
                        diff.theme_override_changed = true;
                    }
                    diff.updated.push(id);
                }
                _ => {}
            }
        }
        // Detached nodes the walk cannot reach still count.
        let walked: HashSet<NodeId> = diff.added.iter().chain(&diff.updated).copied().collect();
        let mut stray: Vec<NodeId> = next
            .nodes_by_id
            .iter()
            .filter(|(id, n)| {
                !walked.contains(*id) && prev.node_rc(**id).is_none_or(|p| !Rc::ptr_eq(p, *n))
            })
            .map(|(id, _)| *id)
            .collect();
        stray.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for id in stray {
            if prev.contains(id) {
                diff.updated.push(id);
            } else {
                diff.added.push(id);
            }
        }

        let mut removed: Vec<NodeId> = prev.walk().into_iter().filter(|id| !next.contains(*id)).collect();
        let seen: HashSet<NodeId> = removed.iter().copied().collect();
        let mut unreachable: Vec<NodeId> = prev
            .nodes_by_id
            .keys()
            .filter(|id| !seen.contains(*id) && !next.contains(**id))
            .copied()
            .collect();
        unreachable.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        removed.extend(unreachable);
        diff.removed = removed;

        if !Rc::ptr_eq(&prev.root_ids, &next.root_ids) && prev.root_ids != next.root_ids {
            diff.children_changed.push(None);
        }
        if !Rc::ptr_eq(&prev.children_by_id, &next.children_by_id) {
            let mut parents: Vec<NodeId> = next
                .children_by_id
                .iter()
                .filter(|(id, list)| {
                    prev.children_rc(**id)
                        .is_none_or(|p| !Rc::ptr_eq(p, *list) && p.as_slice() != list.as_slice())
                })
                .map(|(id, _)| *id)
                .chain(
                    prev.children_by_id
                        .keys()
                        .filter(|id| next.contains(**id) && next.children_rc(**id).is_none())
                        .copied(),
                )
                .collect();
            parents.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            parents.dedup();
            diff.children_changed.extend(parents.into_iter().map(Some));
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && self.children_changed.is_empty()
    }

    /// Every id the diff touches, for layout and dependency invalidation.
    pub fn changed_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(&self.updated)
            .copied()
            .chain(self.children_changed.iter().flatten().copied())
    }
}
