//! Read-only inputs of one render pass.

use smallvec::SmallVec;
use std::collections::HashMap;
use weft_core::id::NodeId;
use weft_core::instance::InstanceLimits;
use weft_core::layout::LayoutContext;
use weft_core::model::{Color, NodeKind, ResolvedBounds, SceneNode, Sizing};
use weft_core::scene::SceneState;
use weft_core::store::{SelectionState, ThemeState};
use weft_core::text::TextMetricsCache;
use weft_core::theme::ThemeScope;

/// Renderer settings derived from the engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub placeholder_size: (f32, f32),
    pub placeholder_fill: Color,
    pub placeholder_stroke: Color,
    pub fallback_font_family: String,
    pub max_instance_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            placeholder_size: (100.0, 100.0),
            placeholder_fill: Color::rgba(0.9, 0.9, 0.92, 1.0),
            placeholder_stroke: Color::rgba(0.6, 0.6, 0.65, 1.0),
            fallback_font_family: "sans-serif".into(),
            max_instance_depth: 16,
        }
    }
}

impl RenderConfig {
    pub fn instance_limits(&self) -> InstanceLimits {
        InstanceLimits {
            max_depth: self.max_instance_depth,
            placeholder_size: self.placeholder_size,
        }
    }
}

pub struct RenderEnv<'a> {
    pub scene: &'a SceneState,
    pub theme: &'a ThemeState,
    pub selection: &'a SelectionState,
    pub text: &'a TextMetricsCache,
    pub layout: &'a LayoutContext<'a>,
    /// Auto-layout boxes by node id.
    pub boxes: &'a HashMap<NodeId, ResolvedBounds>,
    pub config: &'a RenderConfig,
    pub text_resolution: f32,
}

impl RenderEnv<'_> {
    /// Theme scope for `id`'s own paints: the active theme plus every
    /// ancestor frame override, outermost first.
    pub fn scope_for(&self, id: NodeId) -> ThemeScope {
        let mut overrides: SmallVec<[&str; 4]> = self
            .scene
            .ancestors(id)
            .filter_map(|a| self.scene.node(a).and_then(SceneNode::theme_override))
            .collect();
        overrides.reverse();
        overrides
            .into_iter()
            .fold(ThemeScope::root(&self.theme.active_theme), |scope, t| {
                scope.enter(Some(t))
            })
    }

    /// Size the node draws at: its layout box, measured text, or the
    /// intrinsic size of a fit-content frame; otherwise the stored size.
    pub fn effective_size(&self, node: &SceneNode) -> (f32, f32) {
        if self.scene.is_auto_layout_child(node.id)
            && let Some(b) = self.boxes.get(&node.id)
        {
            return b.size();
        }
        match &node.kind {
            NodeKind::Text(_) => self.text.node_size(node).unwrap_or((node.width, node.height)),
            NodeKind::Frame(f)
                if f.sizing.horizontal == Sizing::FitContent
                    || f.sizing.vertical == Sizing::FitContent =>
            {
                self.layout.effective_size(node.id)
            }
            _ => (node.width, node.height),
        }
    }

    /// Position to apply: the layout box of an auto-layout child, the
    /// stored position otherwise (or when layout produced no box).
    pub fn position(&self, node: &SceneNode) -> (f32, f32) {
        if self.scene.is_auto_layout_child(node.id)
            && let Some(b) = self.boxes.get(&node.id)
        {
            return (b.x, b.y);
        }
        (node.x, node.y)
    }

    /// visible ∧ enabled ∧ not being edited inline.
    pub fn node_visible(&self, node: &SceneNode) -> bool {
        let editing = self.selection.editing_node() == Some(node.id)
            && self.selection.editing_descendant().is_none();
        node.is_shown() && !editing
    }

    /// An instance descendant hidden because its inline editor is open.
    pub fn descendant_hidden(&self, instance: NodeId, logical: NodeId) -> bool {
        self.selection
            .editing_descendant()
            .is_some_and(|ctx| ctx.instance_id == instance && ctx.descendant_id == logical)
    }
}
