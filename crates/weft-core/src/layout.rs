//! Auto-layout adapter.
//!
//! Converts the flattened scene into the nested `LayoutNode` shape the flex
//! engine (taffy) consumes, runs it, and maps the resulting boxes back by
//! node id. Sizes resolve bottom-up (fit-content frames, measured text and
//! resolved instances become fixed leaf sizes before their parent is laid
//! out); positions resolve top-down inside the flex pass.
//!
//! Only children of auto-layout frames get positions from here. Children of
//! free frames keep their stored x/y.

use crate::id::NodeId;
use crate::instance::{InstanceLimits, InstanceResolver};
use crate::model::*;
use crate::scene::SceneState;
use crate::text::TextMetricsCache;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use taffy::geometry::{Rect, Size};
use taffy::prelude::TaffyMaxContent;
use taffy::style::{AlignItems as FlexAlign, Display, FlexDirection, JustifyContent, Style};
use taffy::style_helpers::{auto, length};
use taffy::TaffyTree;
use thiserror::Error;

/// Layout-pass errors. Callers recover by keeping stored geometry.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout engine failed: {0}")]
    Engine(#[from] taffy::TaffyError),
    #[error("node {0} is not an auto-layout frame")]
    NotAutoLayout(NodeId),
}

/// Nested, layout-relevant view of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    /// Stored size for fixed axes; intrinsic size for leaves.
    pub width: f32,
    pub height: f32,
    pub sizing: AxisSizing,
    /// `Some` for frames whose children this pass positions.
    pub auto_layout: Option<AutoLayout>,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    pub fn leaf(id: NodeId, width: f32, height: f32, sizing: AxisSizing) -> Self {
        Self {
            id,
            width,
            height,
            sizing,
            auto_layout: None,
            children: Vec::new(),
        }
    }
}

/// Output of one layout run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    /// Resolved size of the root frame.
    pub root_size: (f32, f32),
    /// Boxes of every laid-out descendant, relative to its parent.
    pub boxes: HashMap<NodeId, ResolvedBounds>,
}

/// One positioned child, as returned by `LayoutContext::layout_children`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildLayout {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Run the flex engine over a nested layout tree.
pub fn compute_layout(root: &LayoutNode) -> Result<LayoutResult, LayoutError> {
    let mut tree: TaffyTree<()> = TaffyTree::new();
    tree.disable_rounding();
    let mut handles = Vec::new();
    let root_handle = build_taffy(&mut tree, root, None, &mut handles)?;
    tree.compute_layout(root_handle, Size::MAX_CONTENT)?;

    let root_layout = tree.layout(root_handle)?;
    let mut result = LayoutResult {
        root_size: (root_layout.size.width, root_layout.size.height),
        boxes: HashMap::with_capacity(handles.len()),
    };
    for (handle, id) in handles {
        let l = tree.layout(handle)?;
        result.boxes.insert(
            id,
            ResolvedBounds {
                x: l.location.x,
                y: l.location.y,
                width: l.size.width,
                height: l.size.height,
            },
        );
    }
    Ok(result)
}

fn build_taffy(
    tree: &mut TaffyTree<()>,
    node: &LayoutNode,
    parent: Option<&AutoLayout>,
    handles: &mut Vec<(taffy::NodeId, NodeId)>,
) -> Result<taffy::NodeId, LayoutError> {
    let mut style = Style {
        display: Display::Flex,
        flex_shrink: 0.0,
        ..Default::default()
    };

    let grows_auto = node.auto_layout.is_some();
    let parent_row = parent.map(|p| p.direction == LayoutDirection::Row);

    // Horizontal axis
    style.size.width = match (node.sizing.horizontal, parent_row) {
        (Sizing::Fill, Some(true)) => {
            style.flex_grow = 1.0;
            style.flex_shrink = 1.0;
            style.flex_basis = length(0.0);
            auto()
        }
        (Sizing::Fill, Some(false)) => {
            style.align_self = Some(FlexAlign::Stretch);
            auto()
        }
        (Sizing::FitContent, _) if grows_auto => auto(),
        _ => length(node.width),
    };

    // Vertical axis
    style.size.height = match (node.sizing.vertical, parent_row) {
        (Sizing::Fill, Some(false)) => {
            style.flex_grow = 1.0;
            style.flex_shrink = 1.0;
            style.flex_basis = length(0.0);
            auto()
        }
        (Sizing::Fill, Some(true)) => {
            style.align_self = Some(FlexAlign::Stretch);
            auto()
        }
        (Sizing::FitContent, _) if grows_auto => auto(),
        _ => length(node.height),
    };

    let handle = match &node.auto_layout {
        Some(al) => {
            style.flex_direction = match al.direction {
                LayoutDirection::Row => FlexDirection::Row,
                LayoutDirection::Column => FlexDirection::Column,
            };
            style.gap = Size {
                width: length(al.gap.max(0.0)),
                height: length(al.gap.max(0.0)),
            };
            style.padding = Rect {
                left: length(al.padding.left),
                right: length(al.padding.right),
                top: length(al.padding.top),
                bottom: length(al.padding.bottom),
            };
            style.align_items = Some(match al.align {
                AlignItems::Start => FlexAlign::FlexStart,
                AlignItems::Center => FlexAlign::Center,
                AlignItems::End => FlexAlign::FlexEnd,
                AlignItems::Stretch => FlexAlign::Stretch,
            });
            style.justify_content = Some(match al.justify {
                Justify::Start => JustifyContent::FlexStart,
                Justify::Center => JustifyContent::Center,
                Justify::End => JustifyContent::FlexEnd,
                Justify::SpaceBetween => JustifyContent::SpaceBetween,
            });

            let mut kids = Vec::with_capacity(node.children.len());
            for child in &node.children {
                let h = build_taffy(tree, child, Some(al), handles)?;
                handles.push((h, child.id));
                kids.push(h);
            }
            tree.new_with_children(style, &kids)?
        }
        None => tree.new_leaf(style)?,
    };
    Ok(handle)
}

/// Bounding size of children boxes `(x, y, w, h)` measured from the origin.
pub fn fit_extent(children: impl IntoIterator<Item = (f32, f32, f32, f32)>) -> (f32, f32) {
    children
        .into_iter()
        .fold((0.0f32, 0.0f32), |(w, h), (x, y, cw, ch)| {
            (w.max(x + cw), h.max(y + ch))
        })
}

/// Apply per-axis fit-content: take `fit` on fitting axes, `stored` elsewhere.
pub fn apply_fit(sizing: AxisSizing, stored: (f32, f32), fit: (f32, f32)) -> (f32, f32) {
    (
        if sizing.horizontal == Sizing::FitContent { fit.0 } else { stored.0 },
        if sizing.vertical == Sizing::FitContent { fit.1 } else { stored.1 },
    )
}

// ─── Scene adapter ───────────────────────────────────────────────────────

/// One layout pass over a scene snapshot. Memoizes intrinsic sizes so a
/// fit-content frame is measured once per pass however many ancestors ask.
pub struct LayoutContext<'a> {
    pub scene: &'a SceneState,
    pub text: &'a TextMetricsCache,
    limits: InstanceLimits,
    sizes: RefCell<HashMap<NodeId, (f32, f32)>>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(scene: &'a SceneState, text: &'a TextMetricsCache) -> Self {
        Self {
            scene,
            text,
            limits: InstanceLimits::default(),
            sizes: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_limits(mut self, limits: InstanceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The size a node contributes to its parent's layout.
    pub fn effective_size(&self, id: NodeId) -> (f32, f32) {
        if let Some(size) = self.sizes.borrow().get(&id) {
            return *size;
        }
        let Some(node) = self.scene.node(id) else {
            return (0.0, 0.0);
        };
        let size = match &node.kind {
            NodeKind::Text(_) => self.text.node_size(node).unwrap_or((node.width, node.height)),
            NodeKind::InstanceRef(_) => {
                let resolved = InstanceResolver::new(self.scene, self.text, self.limits).resolve(node);
                (resolved.width, resolved.height)
            }
            NodeKind::Frame(frame) => {
                let fits = frame.sizing.horizontal == Sizing::FitContent
                    || frame.sizing.vertical == Sizing::FitContent;
                if fits {
                    self.intrinsic_size(id)
                } else {
                    (node.width, node.height)
                }
            }
            _ => (node.width, node.height),
        };
        self.sizes.borrow_mut().insert(id, size);
        size
    }

    /// Intrinsic size of a frame from its children (fit axes only; fixed
    /// axes keep the stored size).
    pub fn intrinsic_size(&self, id: NodeId) -> (f32, f32) {
        let Some(node) = self.scene.node(id) else {
            return (0.0, 0.0);
        };
        let stored = (node.width, node.height);
        if node.auto_layout().is_some() {
            return match self.layout_tree(id).map(|t| compute_layout(&t)) {
                Some(Ok(result)) => result.root_size,
                Some(Err(e)) => {
                    log::warn!("fit-content layout of {id} failed: {e}");
                    stored
                }
                None => stored,
            };
        }
        let extent = fit_extent(
            self.shown_children(id)
                .map(|c| {
                    let (w, h) = self.effective_size(c);
                    let child = self.scene.node(c);
                    let (x, y) = child.map(|n| (n.x, n.y)).unwrap_or_default();
                    (x, y, w, h)
                }),
        );
        apply_fit(node.sizing(), stored, extent)
    }

    fn shown_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.scene
            .children(id)
            .iter()
            .copied()
            .filter(|c| self.scene.node(*c).is_some_and(SceneNode::is_shown))
    }

    /// Nested layout tree rooted at an auto-layout frame.
    pub fn layout_tree(&self, frame_id: NodeId) -> Option<LayoutNode> {
        let node = self.scene.node(frame_id)?;
        let al = node.auto_layout()?.clone();
        let children = self
            .shown_children(frame_id)
            .map(|c| self.child_layout_node(c))
            .collect();
        Some(LayoutNode {
            id: frame_id,
            width: node.width,
            height: node.height,
            sizing: node.sizing(),
            auto_layout: Some(al),
            children,
        })
    }

    fn child_layout_node(&self, id: NodeId) -> LayoutNode {
        if let Some(tree) = self.layout_tree(id) {
            return tree;
        }
        let sizing = self
            .scene
            .node(id)
            .map(SceneNode::sizing)
            .unwrap_or_default();
        let (w, h) = self.effective_size(id);
        LayoutNode::leaf(id, w, h, sizing)
    }

    /// Lay out an auto-layout frame and its nested auto-layout descendants.
    pub fn run(&self, frame_id: NodeId) -> Result<LayoutResult, LayoutError> {
        let tree = self
            .layout_tree(frame_id)
            .ok_or(LayoutError::NotAutoLayout(frame_id))?;
        let result = compute_layout(&tree)?;
        self.sizes.borrow_mut().insert(frame_id, result.root_size);
        Ok(result)
    }

    /// Positions and sizes of the frame's direct children.
    pub fn layout_children(&self, frame_id: NodeId) -> Result<Vec<ChildLayout>, LayoutError> {
        let result = self.run(frame_id)?;
        Ok(self
            .shown_children(frame_id)
            .filter_map(|c| {
                result.boxes.get(&c).map(|b| ChildLayout {
                    id: c,
                    x: b.x,
                    y: b.y,
                    width: b.width,
                    height: b.height,
                })
            })
            .collect())
    }
}

/// The minimal set of auto-layout frames to recompute after `changed` ids
/// were touched: every auto-layout frame at or above a changed id, minus the
/// ones already covered by a dirty auto-layout parent.
pub fn layout_roots(scene: &SceneState, changed: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
    let mut dirty = HashSet::new();
    for id in changed {
        for candidate in std::iter::once(id).chain(scene.ancestors(id)) {
            if scene.node(candidate).is_some_and(|n| n.auto_layout().is_some()) {
                dirty.insert(candidate);
            }
        }
    }
    let mut roots: Vec<NodeId> = dirty
        .iter()
        .copied()
        .filter(|f| !scene.parent(*f).is_some_and(|p| dirty.contains(&p)))
        .collect();
    roots.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    roots
}
