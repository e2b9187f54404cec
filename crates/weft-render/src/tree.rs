//! Retained render tree.
//!
//! Containers live in a `StableDiGraph` arena (edges parent → child) so
//! `ContainerId`s of live containers stay valid across removals. Child
//! order is kept explicitly on each container; the graph edges answer
//! parent lookups.
//! Every mutating call bumps `MutationStats`, and setters whose value is
//! unchanged are no-ops that count nothing.

use crate::draw::{DrawCmd, Geometry};
use kurbo::{Affine, Rect};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use weft_core::id::NodeId;

/// Handle to a container in the arena.
///
/// Indices of destroyed containers are reused by later `create` calls, so a
/// handle kept past `destroy` may name a different container. Look handles up
/// through the `Registry` instead of caching them across passes.
pub type ContainerId = NodeIndex;

/// Role of a container that only holds structural children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostRole {
    Children,
    InstanceChildren,
}

/// Local transform: translate, rotate about the origin, then scale about
/// `pivot` (flips use a negative scale with the pivot at the far edge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    /// Radians, clockwise.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub pivot_x: f64,
    pub pivot_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            pivot_x: 0.0,
            pivot_y: 0.0,
        }
    }
}

impl Transform {
    pub fn to_affine(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation)
            * Affine::translate((self.pivot_x, self.pivot_y))
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }
}

/// One node of the retained tree.
#[derive(Debug, Clone)]
pub struct Container {
    pub render_id: NodeId,
    /// Logical (unqualified) id used for lookup and hit testing.
    pub label: Option<NodeId>,
    pub role: Option<HostRole>,
    pub transform: Transform,
    pub alpha: f32,
    pub visible: bool,
    /// Clip applied to this container's children, in local coordinates.
    pub mask: Option<Geometry>,
    pub display: Vec<DrawCmd>,
    /// Local box `(0, 0)–(width, height)`.
    pub size: (f64, f64),
    pub text_resolution: Option<f32>,
    children: Vec<ContainerId>,
}

impl Container {
    fn new(render_id: NodeId, label: Option<NodeId>, role: Option<HostRole>) -> Self {
        Self {
            render_id,
            label,
            role,
            transform: Transform::default(),
            alpha: 1.0,
            visible: true,
            mask: None,
            display: Vec::new(),
            size: (0.0, 0.0),
            text_resolution: None,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[ContainerId] {
        &self.children
    }

    pub fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size.0, self.size.1)
    }

    pub fn has_text(&self) -> bool {
        self.display.iter().any(|c| matches!(c, DrawCmd::Text(_)))
    }
}

/// Counters of container mutations, for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationStats {
    pub created: usize,
    pub destroyed: usize,
    pub redraws: usize,
    pub attached: usize,
    pub detached: usize,
    pub property_changes: usize,
}

impl MutationStats {
    pub fn total(&self) -> usize {
        self.created
            + self.destroyed
            + self.redraws
            + self.attached
            + self.detached
            + self.property_changes
    }
}

#[derive(Debug)]
pub struct RenderTree {
    graph: StableDiGraph<Container, ()>,
    root: ContainerId,
    stats: MutationStats,
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Container::new(
            NodeId::intern("root"),
            None,
            Some(HostRole::Children),
        ));
        Self {
            graph,
            root,
            stats: MutationStats::default(),
        }
    }

    pub fn root(&self) -> ContainerId {
        self.root
    }

    /// Number of containers, root and hosts included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.graph.contains_node(id)
    }

    pub fn get(&self, id: ContainerId) -> Option<&Container> {
        self.graph.node_weight(id)
    }

    pub fn children(&self, id: ContainerId) -> &[ContainerId] {
        self.get(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: ContainerId) -> Option<ContainerId> {
        self.graph.neighbors_directed(id, Direction::Incoming).next()
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    /// Return and reset the counters.
    pub fn take_stats(&mut self) -> MutationStats {
        std::mem::take(&mut self.stats)
    }

    /// Create a detached container.
    pub fn create(&mut self, render_id: NodeId, label: Option<NodeId>) -> ContainerId {
        self.stats.created += 1;
        self.graph.add_node(Container::new(render_id, label, None))
    }

    /// Create a child-host with `role` and append it to `parent`.
    pub fn create_host(&mut self, parent: ContainerId, role: HostRole) -> ContainerId {
        let render_id = self
            .get(parent)
            .map(|c| c.render_id)
            .unwrap_or_default();
        self.stats.created += 1;
        let host = self.graph.add_node(Container::new(render_id, None, Some(role)));
        self.attach(parent, host, None);
        host
    }

    /// The child-host of `parent` with `role`, if any.
    pub fn host(&self, parent: ContainerId, role: HostRole) -> Option<ContainerId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.get(*c).is_some_and(|c| c.role == Some(role)))
    }

    /// Attach `child` under `parent` at `index` (end when `None`), moving it
    /// out of any previous parent.
    pub fn attach(&mut self, parent: ContainerId, child: ContainerId, index: Option<usize>) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        if self.parent(child) == Some(parent) {
            let list = &self.graph[parent].children;
            let current = list.iter().position(|c| *c == child);
            let target = index.unwrap_or(list.len() - 1).min(list.len() - 1);
            if current == Some(target) {
                return;
            }
        }
        self.detach(child);
        self.graph.add_edge(parent, child, ());
        let list = &mut self.graph[parent].children;
        let at = index.unwrap_or(list.len()).min(list.len());
        list.insert(at, child);
        self.stats.attached += 1;
    }

    /// Remove `child` from its parent (no-op when detached).
    pub fn detach(&mut self, child: ContainerId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(parent, child) {
            self.graph.remove_edge(edge);
        }
        self.graph[parent].children.retain(|c| *c != child);
        self.stats.detached += 1;
    }

    /// Make `parent`'s children exactly `ordered` (child-hosts of `parent`
    /// stay in front of the list). Returns the containers evicted as strays.
    pub fn set_children(&mut self, parent: ContainerId, ordered: &[ContainerId]) -> Vec<ContainerId> {
        if !self.contains(parent) {
            return Vec::new();
        }
        let hosts: Vec<ContainerId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(|c| c.role.is_some()))
            .collect();
        let strays: Vec<ContainerId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|c| !hosts.contains(c) && !ordered.contains(c))
            .collect();
        for stray in &strays {
            self.detach(*stray);
        }
        for (i, &child) in ordered.iter().enumerate() {
            self.attach(parent, child, Some(hosts.len() + i));
        }
        strays
    }

    /// Destroy `id` and its subtree, children first. Returns the render ids
    /// of every destroyed container that carried a label. Idempotent.
    pub fn destroy(&mut self, id: ContainerId) -> Vec<NodeId> {
        if !self.contains(id) || id == self.root {
            return Vec::new();
        }
        self.detach(id);
        let mut order = Vec::new();
        self.post_order(id, &mut order);
        let mut removed = Vec::new();
        for c in order {
            if let Some(container) = self.graph.remove_node(c) {
                self.stats.destroyed += 1;
                if container.label.is_some() {
                    removed.push(container.render_id);
                }
            }
        }
        removed
    }

    /// Destroy every container below the root.
    pub fn clear(&mut self) -> Vec<NodeId> {
        let top: Vec<ContainerId> = self.children(self.root).to_vec();
        top.into_iter().flat_map(|c| self.destroy(c)).collect()
    }

    fn post_order(&self, id: ContainerId, out: &mut Vec<ContainerId>) {
        for &child in self.children(id) {
            self.post_order(child, out);
        }
        out.push(id);
    }

    /// Pre-order walk from `id`.
    pub fn walk(&self, id: ContainerId) -> Vec<ContainerId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            if !self.contains(c) {
                continue;
            }
            out.push(c);
            stack.extend(self.children(c).iter().rev().copied());
        }
        out
    }

    /// Composite transform from the root down to `id`.
    pub fn world_transform(&self, id: ContainerId) -> Affine {
        let mut xf = Affine::IDENTITY;
        let mut current = Some(id);
        while let Some(c) = current {
            if let Some(container) = self.get(c) {
                xf = container.transform.to_affine() * xf;
            }
            current = self.parent(c);
        }
        xf
    }

    // ─── Setters (no-ops when unchanged) ─────────────────────────────────

    pub fn set_transform(&mut self, id: ContainerId, transform: Transform) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.transform != transform
        {
            c.transform = transform;
            self.stats.property_changes += 1;
        }
    }

    pub fn set_alpha(&mut self, id: ContainerId, alpha: f32) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.alpha != alpha
        {
            c.alpha = alpha;
            self.stats.property_changes += 1;
        }
    }

    pub fn set_visible(&mut self, id: ContainerId, visible: bool) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.visible != visible
        {
            c.visible = visible;
            self.stats.property_changes += 1;
        }
    }

    pub fn set_mask(&mut self, id: ContainerId, mask: Option<Geometry>) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.mask != mask
        {
            c.mask = mask;
            self.stats.property_changes += 1;
        }
    }

    pub fn set_size(&mut self, id: ContainerId, width: f64, height: f64) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.size != (width, height)
        {
            c.size = (width, height);
            self.stats.property_changes += 1;
        }
    }

    pub fn set_label(&mut self, id: ContainerId, label: Option<NodeId>) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.label != label
        {
            c.label = label;
            self.stats.property_changes += 1;
        }
    }

    pub fn set_text_resolution(&mut self, id: ContainerId, resolution: f32) {
        if let Some(c) = self.graph.node_weight_mut(id)
            && c.text_resolution != Some(resolution)
        {
            c.text_resolution = Some(resolution);
            self.stats.property_changes += 1;
        }
    }

    /// Replace the display list.
    pub fn redraw(&mut self, id: ContainerId, display: Vec<DrawCmd>) {
        if let Some(c) = self.graph.node_weight_mut(id) {
            c.display = display;
            self.stats.redraws += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    #[test]
    fn attach_orders_and_moves() {
        let mut tree = RenderTree::new();
        let root = tree.root();
        let a = tree.create(id("a"), Some(id("a")));
        let b = tree.create(id("b"), Some(id("b")));
        tree.attach(root, a, None);
        tree.attach(root, b, Some(0));
        assert_eq!(tree.children(root), &[b, a]);

        let host = tree.create_host(a, HostRole::Children);
        tree.attach(host, b, None);
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.parent(b), Some(host));
    }

    #[test]
    fn destroy_is_recursive_and_idempotent() {
        let mut tree = RenderTree::new();
        let root = tree.root();
        let frame = tree.create(id("f"), Some(id("f")));
        tree.attach(root, frame, None);
        let host = tree.create_host(frame, HostRole::Children);
        let leaf = tree.create(id("leaf"), Some(id("leaf")));
        tree.attach(host, leaf, None);

        let removed = tree.destroy(frame);
        assert_eq!(removed, vec![id("leaf"), id("f")]);
        assert!(tree.is_empty());
        assert!(tree.destroy(frame).is_empty());
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn set_children_reorders_and_evicts_strays() {
        let mut tree = RenderTree::new();
        let root = tree.root();
        let [a, b, ghost] = ["a", "b", "ghost"].map(|s| {
            let c = tree.create(id(s), Some(id(s)));
            tree.attach(root, c, None);
            c
        });
        let strays = tree.set_children(root, &[b, a]);
        assert_eq!(strays, vec![ghost]);
        assert_eq!(tree.children(root), &[b, a]);
    }

    #[test]
    fn unchanged_setters_count_nothing() {
        let mut tree = RenderTree::new();
        let c = tree.create(id("c"), None);
        tree.take_stats();
        tree.set_alpha(c, 1.0);
        tree.set_visible(c, true);
        tree.set_transform(c, Transform::default());
        assert_eq!(tree.stats().total(), 0);
        tree.set_alpha(c, 0.5);
        assert_eq!(tree.stats().property_changes, 1);
    }

    #[test]
    fn flip_maps_box_onto_itself() {
        let t = Transform {
            scale_x: -1.0,
            pivot_x: 40.0,
            ..Default::default()
        };
        let p = t.to_affine() * kurbo::Point::new(0.0, 5.0);
        assert!((p.x - 40.0).abs() < 1e-9);
        assert!((p.y - 5.0).abs() < 1e-9);
    }
}
