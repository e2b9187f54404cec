//! Flattened, immutable scene snapshots.
//!
//! A `SceneState` is the normalized tree the reconciliation engine consumes:
//! nodes by id, children by id, parent by id, and the ordered root list.
//! Every map sits behind an `Rc` and every node behind its own `Rc`, so a
//! mutation helper produces a new snapshot that shares all untouched nodes
//! with the previous one. Change detection is then a matter of pointer
//! comparison.

use crate::id::NodeId;
use crate::model::{NodeKind, SceneNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

/// One immutable version of the document tree.
#[derive(Debug, Clone, Default)]
pub struct SceneState {
    pub nodes_by_id: Rc<HashMap<NodeId, Rc<SceneNode>>>,
    pub children_by_id: Rc<HashMap<NodeId, Rc<Vec<NodeId>>>>,
    pub parent_by_id: Rc<HashMap<NodeId, Option<NodeId>>>,
    pub root_ids: Rc<Vec<NodeId>>,
}

impl SceneState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when both snapshots share the same node, children and root tables.
    pub fn same_as(&self, other: &SceneState) -> bool {
        Rc::ptr_eq(&self.nodes_by_id, &other.nodes_by_id)
            && Rc::ptr_eq(&self.root_ids, &other.root_ids)
            && Rc::ptr_eq(&self.children_by_id, &other.children_by_id)
    }

    pub fn len(&self) -> usize {
        self.nodes_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_id.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes_by_id.get(&id).map(|n| n.as_ref())
    }

    pub fn node_rc(&self, id: NodeId) -> Option<&Rc<SceneNode>> {
        self.nodes_by_id.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes_by_id.contains_key(&id)
    }

    /// Children of `id` in z-order (empty for leaves and unknown ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children_by_id
            .get(&id)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    pub fn children_rc(&self, id: NodeId) -> Option<&Rc<Vec<NodeId>>> {
        self.children_by_id.get(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent_by_id.get(&id).copied().flatten()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            scene: self,
            next: self.parent(id),
        }
    }

    /// Check if `ancestor_id` is a parent/grandparent/etc. of `descendant_id`.
    pub fn is_ancestor_of(&self, ancestor_id: NodeId, descendant_id: NodeId) -> bool {
        self.ancestors(descendant_id).any(|a| a == ancestor_id)
    }

    /// Whether the node's parent lays it out (positions come from the layout pass).
    pub fn is_auto_layout_child(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|p| self.node(p))
            .is_some_and(|p| p.auto_layout().is_some())
    }

    /// Pre-order walk over the whole document, roots first in z-order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        for &root in self.root_ids.iter() {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    /// Pre-order walk over `id` and its descendants.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if !self.contains(id) {
            return;
        }
        out.push(id);
        for &child in self.children(id) {
            self.collect_subtree(child, out);
        }
    }

    /// The nearest enclosing component definitions of `id` (including itself),
    /// innermost first.
    pub fn enclosing_components(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|a| self.node(*a).is_some_and(|n| n.is_component()))
            .collect()
    }

    // ─── Mutation helpers (produce new snapshots) ────────────────────────

    /// Insert `node` under `parent` (or as a root) at `index` (clamped).
    /// Replaces an existing node with the same id in place.
    #[must_use]
    pub fn insert(&self, parent: Option<NodeId>, index: usize, node: SceneNode) -> Self {
        let id = node.id;
        if self.contains(id) {
            return self.update_node(id, |n| *n = node);
        }
        let mut next = self.clone();
        Rc::make_mut(&mut next.nodes_by_id).insert(id, Rc::new(node));
        Rc::make_mut(&mut next.parent_by_id).insert(id, parent);
        match parent {
            Some(p) => {
                let children = Rc::make_mut(&mut next.children_by_id)
                    .entry(p)
                    .or_insert_with(|| Rc::new(Vec::new()));
                let list = Rc::make_mut(children);
                list.insert(index.min(list.len()), id);
            }
            None => {
                let roots = Rc::make_mut(&mut next.root_ids);
                roots.insert(index.min(roots.len()), id);
            }
        }
        next
    }

    /// Append `node` as the last child of `parent` (or as the last root).
    #[must_use]
    pub fn push(&self, parent: Option<NodeId>, node: SceneNode) -> Self {
        self.insert(parent, usize::MAX, node)
    }

    /// Replace one node through `f`; only that node gets a new `Rc`.
    #[must_use]
    pub fn update_node(&self, id: NodeId, f: impl FnOnce(&mut SceneNode)) -> Self {
        let Some(current) = self.nodes_by_id.get(&id) else {
            return self.clone();
        };
        let mut node = SceneNode::clone(current);
        f(&mut node);
        let mut next = self.clone();
        Rc::make_mut(&mut next.nodes_by_id).insert(id, Rc::new(node));
        next
    }

    /// Remove `id` and its whole subtree.
    #[must_use]
    pub fn remove(&self, id: NodeId) -> Self {
        if !self.contains(id) {
            return self.clone();
        }
        let doomed = self.subtree(id);
        let mut next = self.clone();
        self.detach_into(&mut next, id);
        let nodes = Rc::make_mut(&mut next.nodes_by_id);
        for d in &doomed {
            nodes.remove(d);
        }
        let parents = Rc::make_mut(&mut next.parent_by_id);
        for d in &doomed {
            parents.remove(d);
        }
        let children = Rc::make_mut(&mut next.children_by_id);
        for d in &doomed {
            children.remove(d);
        }
        next
    }

    /// Reparent `id` under `new_parent` at `index` (clamped).
    #[must_use]
    pub fn move_node(&self, id: NodeId, new_parent: Option<NodeId>, index: usize) -> Self {
        if !self.contains(id) || new_parent.is_some_and(|p| p == id || self.is_ancestor_of(id, p))
        {
            return self.clone();
        }
        let mut next = self.clone();
        self.detach_into(&mut next, id);
        Rc::make_mut(&mut next.parent_by_id).insert(id, new_parent);
        match new_parent {
            Some(p) => {
                let children = Rc::make_mut(&mut next.children_by_id)
                    .entry(p)
                    .or_insert_with(|| Rc::new(Vec::new()));
                let list = Rc::make_mut(children);
                list.insert(index.min(list.len()), id);
            }
            None => {
                let roots = Rc::make_mut(&mut next.root_ids);
                roots.insert(index.min(roots.len()), id);
            }
        }
        next
    }

    fn detach_into(&self, next: &mut SceneState, id: NodeId) {
        match self.parent(id) {
            Some(p) => {
                if let Some(children) = Rc::make_mut(&mut next.children_by_id).get_mut(&p) {
                    Rc::make_mut(children).retain(|c| *c != id);
                }
            }
            None => Rc::make_mut(&mut next.root_ids).retain(|c| *c != id),
        }
    }

    /// Build a snapshot from a nested document.
    pub fn from_document(doc: &SceneDocument) -> Self {
        let mut nodes = HashMap::new();
        let mut children = HashMap::new();
        let mut parents = HashMap::new();
        let mut roots = Vec::with_capacity(doc.nodes.len());
        for root in &doc.nodes {
            roots.push(root.node.id);
            flatten(root, None, &mut nodes, &mut children, &mut parents);
        }
        Self {
            nodes_by_id: Rc::new(nodes),
            children_by_id: Rc::new(children),
            parent_by_id: Rc::new(parents),
            root_ids: Rc::new(roots),
        }
    }

    /// Parse a JSON `SceneDocument`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: SceneDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(&doc))
    }
}

fn flatten(
    doc: &DocumentNode,
    parent: Option<NodeId>,
    nodes: &mut HashMap<NodeId, Rc<SceneNode>>,
    children: &mut HashMap<NodeId, Rc<Vec<NodeId>>>,
    parents: &mut HashMap<NodeId, Option<NodeId>>,
) {
    let id = doc.node.id;
    nodes.insert(id, Rc::new(doc.node.clone()));
    parents.insert(id, parent);
    if !doc.children.is_empty() || matches!(doc.node.kind, NodeKind::Frame(_) | NodeKind::Group) {
        children.insert(
            id,
            Rc::new(doc.children.iter().map(|c| c.node.id).collect()),
        );
    }
    for child in &doc.children {
        flatten(child, Some(id), nodes, children, parents);
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    scene: &'a SceneState,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.scene.parent(current);
        Some(current)
    }
}

/// Nested (serde) form of a document, used for fixtures and host hand-off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    pub nodes: Vec<DocumentNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentNode {
    pub node: SceneNode,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;

    fn sample() -> SceneState {
        let root = NodeId::intern("page");
        SceneState::new()
            .push(None, SceneNode::frame("page", 400.0, 300.0))
            .push(Some(root), SceneNode::rect("a", 10.0, 10.0))
            .push(Some(root), SceneNode::rect("b", 20.0, 20.0))
    }

    #[test]
    fn update_keeps_sibling_identity() {
        let s1 = sample();
        let a = NodeId::intern("a");
        let b = NodeId::intern("b");
        let s2 = s1.update_node(a, |n| n.fill = Some(crate::model::Paint::solid(Color::WHITE)));

        assert!(!Rc::ptr_eq(s1.node_rc(a).unwrap(), s2.node_rc(a).unwrap()));
        assert!(Rc::ptr_eq(s1.node_rc(b).unwrap(), s2.node_rc(b).unwrap()));
        assert!(Rc::ptr_eq(&s1.children_by_id, &s2.children_by_id));
        assert!(!s1.same_as(&s2));
        assert!(s1.same_as(&s1.clone()));
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let s = sample().remove(NodeId::intern("page"));
        assert!(s.is_empty());
        assert!(s.root_ids.is_empty());
        assert!(s.parent_by_id.is_empty());
    }

    #[test]
    fn move_node_reparents_and_orders() {
        let page = NodeId::intern("page");
        let a = NodeId::intern("a");
        let s = sample()
            .push(Some(page), SceneNode::frame("holder", 50.0, 50.0))
            .move_node(a, Some(NodeId::intern("holder")), 0);

        assert_eq!(s.parent(a), Some(NodeId::intern("holder")));
        assert_eq!(s.children(page), &[NodeId::intern("b"), NodeId::intern("holder")]);
        assert!(s.is_ancestor_of(page, a));
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let s = sample();
        let page = NodeId::intern("page");
        let moved = s.move_node(page, Some(NodeId::intern("a")), 0);
        assert_eq!(moved.parent(page), None);
        assert_eq!(moved.children(page).len(), 2);
    }

    #[test]
    fn walk_is_preorder() {
        let names: Vec<_> = sample().walk().iter().map(|id| id.as_str().to_string()).collect();
        assert_eq!(names, vec!["page", "a", "b"]);
    }
}
