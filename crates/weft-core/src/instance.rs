//! Component instance resolution.
//!
//! Expands an `InstanceRef` into the component's descendant tree with the
//! instance's overrides and slot content applied. Every expanded node gets a
//! render id namespaced under the expanding instance (`<instance>:<i>/<id>`)
//! so two instances of one component never collide, while its logical id
//! stays the unqualified component child id for overrides and editing.
//!
//! Resolution is read-only: it clones nodes out of the snapshot and never
//! writes back.

use crate::id::NodeId;
use crate::layout::{apply_fit, compute_layout, fit_extent, LayoutNode};
use crate::model::*;
use crate::scene::SceneState;
use crate::text::TextMetricsCache;
use std::collections::{HashMap, HashSet};

/// Bounds on instance expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceLimits {
    /// Nested instance depth at which expansion stops with a placeholder.
    pub max_depth: usize,
    /// Placeholder size when the ref itself has no size.
    pub placeholder_size: (f32, f32),
}

impl Default for InstanceLimits {
    fn default() -> Self {
        Self {
            max_depth: 16,
            placeholder_size: (100.0, 100.0),
        }
    }
}

/// One expanded instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstance {
    pub component_id: NodeId,
    /// The container node: the component frame placed and sized by the ref.
    pub frame: SceneNode,
    pub children: Vec<ResolvedNode>,
    pub width: f32,
    pub height: f32,
    /// The component could not be resolved; render a neutral box.
    pub placeholder: bool,
    /// Every component this expansion read, nested ones included.
    pub dependencies: HashSet<NodeId>,
    /// Logical descendant id → render id, first occurrence in tree order.
    pub index: HashMap<NodeId, NodeId>,
}

impl ResolvedInstance {
    pub fn render_id_of(&self, logical: NodeId) -> Option<NodeId> {
        self.index.get(&logical).copied()
    }

    /// Find a resolved descendant (nested instances included) by logical id.
    pub fn find(&self, logical: NodeId) -> Option<&ResolvedNode> {
        fn search(nodes: &[ResolvedNode], logical: NodeId) -> Option<&ResolvedNode> {
            for n in nodes {
                if n.logical_id == logical {
                    return Some(n);
                }
                let nested = n
                    .instance
                    .as_deref()
                    .and_then(|i| search(&i.children, logical));
                if let Some(found) = nested.or_else(|| search(&n.children, logical)) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.children, logical)
    }
}

/// One node of an expanded instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    pub render_id: NodeId,
    /// Unqualified component (or slot) id.
    pub logical_id: NodeId,
    /// Overrides applied, `id` set to `render_id`, geometry laid out.
    pub node: SceneNode,
    pub children: Vec<ResolvedNode>,
    /// Set when this node is itself an instance ref.
    pub instance: Option<Box<ResolvedInstance>>,
}

/// Resolve with default limits.
pub fn resolve_instance(node: &SceneNode, scene: &SceneState, text: &TextMetricsCache) -> ResolvedInstance {
    InstanceResolver::new(scene, text, InstanceLimits::default()).resolve(node)
}

pub struct InstanceResolver<'a> {
    scene: &'a SceneState,
    text: &'a TextMetricsCache,
    limits: InstanceLimits,
}

/// Per-expansion accumulator.
struct Expansion<'s> {
    slot_ids: &'s [NodeId],
    slots: &'s HashMap<NodeId, Vec<SlotNode>>,
    dependencies: HashSet<NodeId>,
    index: HashMap<NodeId, NodeId>,
}

impl<'a> InstanceResolver<'a> {
    pub fn new(scene: &'a SceneState, text: &'a TextMetricsCache, limits: InstanceLimits) -> Self {
        Self { scene, text, limits }
    }

    pub fn resolve(&self, instance: &SceneNode) -> ResolvedInstance {
        let mut stack = Vec::new();
        self.resolve_at(instance, &mut stack)
    }

    fn resolve_at(&self, instance: &SceneNode, stack: &mut Vec<NodeId>) -> ResolvedInstance {
        let Some(props) = instance.as_instance() else {
            return self.placeholder(instance, NodeId::default());
        };
        let component_id = props.component_id;
        let component = match self.scene.node(component_id) {
            Some(c) if c.is_component() => c,
            _ => {
                log::warn!("instance {}: component {component_id} not found", instance.id);
                return self.placeholder(instance, component_id);
            }
        };
        if stack.contains(&component_id) || stack.len() >= self.limits.max_depth {
            log::warn!(
                "instance {}: component {component_id} nests into itself or too deep ({})",
                instance.id,
                stack.len()
            );
            return self.placeholder(instance, component_id);
        }

        stack.push(component_id);
        let mut cx = Expansion {
            slot_ids: component.as_frame().map(|f| f.slots.as_slice()).unwrap_or(&[]),
            slots: &props.slots,
            dependencies: HashSet::from([component_id]),
            index: HashMap::new(),
        };
        let mut children = Vec::new();
        for (i, &child) in self.scene.children(component_id).iter().enumerate() {
            let ov = props.descendants.get(&child);
            children.extend(self.expand_child(child, i, instance.id, ov, &mut cx, stack));
        }
        stack.pop();

        let mut frame = placed_frame(instance, component);
        let (width, height) = arrange(&frame, &mut children);
        frame.width = width;
        frame.height = height;

        ResolvedInstance {
            component_id,
            frame,
            children,
            width,
            height,
            placeholder: false,
            dependencies: cx.dependencies,
            index: cx.index,
        }
    }

    fn placeholder(&self, instance: &SceneNode, component_id: NodeId) -> ResolvedInstance {
        let (pw, ph) = self.limits.placeholder_size;
        let width = if instance.width > 0.0 { instance.width } else { pw };
        let height = if instance.height > 0.0 { instance.height } else { ph };
        let frame = instance.clone().sized(width, height);
        ResolvedInstance {
            component_id,
            frame,
            children: Vec::new(),
            width,
            height,
            placeholder: true,
            // Depend on the missing id so its later creation refreshes us.
            dependencies: HashSet::from([component_id]),
            index: HashMap::new(),
        }
    }

    fn expand_child(
        &self,
        id: NodeId,
        index: usize,
        prefix: NodeId,
        ov: Option<&NodeOverride>,
        cx: &mut Expansion<'_>,
        stack: &mut Vec<NodeId>,
    ) -> Vec<ResolvedNode> {
        let render_id = NodeId::qualified(prefix, index, id);

        // Slot content wins over any property override.
        if cx.slot_ids.contains(&id) {
            if let Some(content) = cx.slots.get(&id) {
                return content
                    .iter()
                    .enumerate()
                    .filter_map(|(j, slot)| self.expand_slot(slot, j, render_id, cx, stack))
                    .collect();
            }
        }

        let Some(base) = self.scene.node(id) else {
            return Vec::new();
        };
        let mut node = base.clone();
        if let Some(ov) = ov {
            ov.apply(&mut node);
        }
        if !node.is_shown() {
            return Vec::new();
        }
        node.id = render_id;
        cx.index.entry(id).or_insert(render_id);

        if let (NodeKind::InstanceRef(inner), Some(ov)) = (&mut node.kind, ov) {
            for (k, outer) in &ov.descendants {
                let merged = match inner.descendants.get(k) {
                    Some(existing) => existing.layered(outer),
                    None => outer.clone(),
                };
                inner.descendants.insert(*k, merged);
            }
        }

        let mut children = Vec::new();
        if node.as_instance().is_none() {
            let nested = ov.map(|o| &o.descendants);
            for (j, &child) in self.scene.children(id).iter().enumerate() {
                let child_ov = nested.and_then(|m| m.get(&child));
                children.extend(self.expand_child(child, j, render_id, child_ov, cx, stack));
            }
        }
        vec![self.finish(node, id, children, cx, stack)]
    }

    fn expand_slot(
        &self,
        slot: &SlotNode,
        index: usize,
        prefix: NodeId,
        cx: &mut Expansion<'_>,
        stack: &mut Vec<NodeId>,
    ) -> Option<ResolvedNode> {
        if !slot.node.is_shown() {
            return None;
        }
        let logical = slot.node.id;
        let render_id = NodeId::qualified(prefix, index, logical);
        let mut node = slot.node.clone();
        node.id = render_id;
        cx.index.entry(logical).or_insert(render_id);

        let children = slot
            .children
            .iter()
            .enumerate()
            .filter_map(|(j, c)| self.expand_slot(c, j, render_id, cx, stack))
            .collect();
        Some(self.finish(node, logical, children, cx, stack))
    }

    /// Nested instance expansion and text re-measurement.
    fn finish(
        &self,
        mut node: SceneNode,
        logical_id: NodeId,
        children: Vec<ResolvedNode>,
        cx: &mut Expansion<'_>,
        stack: &mut Vec<NodeId>,
    ) -> ResolvedNode {
        let render_id = node.id;
        let mut instance = None;
        if node.as_instance().is_some() {
            let nested = self.resolve_at(&node, stack);
            cx.dependencies.extend(nested.dependencies.iter().copied());
            for (k, v) in &nested.index {
                cx.index.entry(*k).or_insert(*v);
            }
            node.width = nested.width;
            node.height = nested.height;
            instance = Some(Box::new(nested));
        } else if let Some((w, h)) = self.text.node_size(&node) {
            node.width = w;
            node.height = h;
        }
        ResolvedNode {
            render_id,
            logical_id,
            node,
            children,
            instance,
        }
    }
}

/// The component frame as the instance container: the ref decides placement,
/// visibility and size; the component decides everything else unless the ref
/// carries its own paint.
fn placed_frame(instance: &SceneNode, component: &SceneNode) -> SceneNode {
    let mut frame = component.clone();
    frame.id = instance.id;
    frame.x = instance.x;
    frame.y = instance.y;
    frame.rotation = instance.rotation;
    frame.opacity = instance.opacity;
    frame.visible = instance.visible;
    frame.enabled = instance.enabled;
    frame.flip_x = instance.flip_x;
    frame.flip_y = instance.flip_y;
    if instance.fill.is_some() {
        frame.fill = instance.fill.clone();
    }
    if instance.stroke.is_some() {
        frame.stroke = instance.stroke.clone();
    }
    if instance.shadow.is_some() {
        frame.shadow = instance.shadow.clone();
    }
    if instance.gradient.is_some() {
        frame.gradient = instance.gradient.clone();
    }
    if instance.image.is_some() {
        frame.image = instance.image.clone();
    }
    frame.width = if instance.width > 0.0 { instance.width } else { component.width };
    frame.height = if instance.height > 0.0 { instance.height } else { component.height };
    if let NodeKind::Frame(props) = &mut frame.kind {
        props.reusable = false;
    }
    frame
}

/// Lay out `children` inside `frame` and return the frame's effective size.
/// Children are arranged bottom-up first so fit-content sizes are known.
fn arrange(frame: &SceneNode, children: &mut [ResolvedNode]) -> (f32, f32) {
    for child in children.iter_mut() {
        arrange_subtree(child);
    }
    let stored = (frame.width, frame.height);
    let Some(al) = frame.auto_layout() else {
        let extent = fit_extent(
            children
                .iter()
                .map(|c| (c.node.x, c.node.y, c.node.width, c.node.height)),
        );
        return apply_fit(frame.sizing(), stored, extent);
    };

    let tree = LayoutNode {
        id: frame.id,
        width: frame.width,
        height: frame.height,
        sizing: frame.sizing(),
        auto_layout: Some(al.clone()),
        children: children
            .iter()
            .map(|c| LayoutNode::leaf(c.render_id, c.node.width, c.node.height, c.node.sizing()))
            .collect(),
    };
    match compute_layout(&tree) {
        Ok(result) => {
            for child in children.iter_mut() {
                let Some(b) = result.boxes.get(&child.render_id) else {
                    continue;
                };
                let resized = b.width != child.node.width || b.height != child.node.height;
                child.node.x = b.x;
                child.node.y = b.y;
                child.node.width = b.width;
                child.node.height = b.height;
                if resized && child.node.has_children_host() {
                    arrange(&child.node, &mut child.children);
                }
            }
            result.root_size
        }
        Err(e) => {
            log::warn!("layout of instance frame {} failed: {e}", frame.id);
            stored
        }
    }
}

fn arrange_subtree(node: &mut ResolvedNode) {
    if node.instance.is_some() || !node.node.has_children_host() {
        return;
    }
    let (w, h) = arrange(&node.node, &mut node.children);
    node.node.width = w;
    node.node.height = h;
}
