//! Rect, ellipse, line and polygon nodes, plus the shared paint stack
//! (shadow, fill, image, stroke) every filled kind draws.

use super::Renderer;
use crate::draw::{
    Brush, DrawCmd, Geometry, StrokeSpec, gradient_brush, image_placement, shadow_cmd, side_strokes,
};
use crate::tree::ContainerId;
use kurbo::Point;
use weft_core::id::NodeId;
use weft_core::model::{FillRule, NodeKind, SceneNode, StrokeWidth};
use weft_core::theme::{ThemeScope, resolve_paint};

/// What to paint for a node: its geometry plus how fills and strokes apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub geometry: Geometry,
    pub rule: FillRule,
    pub filled: bool,
    /// Explicit stroke; `None` strokes at the node's own width.
    pub stroke: Option<StrokeSpec>,
    /// Per-side widths draw four edges instead of one outline.
    pub sides: bool,
}

impl Outline {
    pub fn closed(geometry: Geometry) -> Self {
        Self {
            geometry,
            rule: FillRule::NonZero,
            filled: true,
            stroke: None,
            sides: false,
        }
    }

    /// A rectangular box that honors per-side stroke widths.
    pub fn boxed(width: f32, height: f32, radius: f32) -> Self {
        Self {
            sides: true,
            ..Self::closed(Geometry::rect(width, height, radius))
        }
    }
}

impl Renderer<'_, '_> {
    pub(super) fn draw_shape(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        size: (f32, f32),
        scope: &ThemeScope,
        waiter: NodeId,
    ) {
        let (w, h) = size;
        let outline = match &node.kind {
            NodeKind::Ellipse => Outline::closed(Geometry::ellipse(w, h)),
            NodeKind::Line => Outline {
                filled: false,
                ..Outline::closed(Geometry::Line {
                    to: Point::new(w as f64, h as f64),
                })
            },
            NodeKind::Polygon(p) => Outline::closed(Geometry::polygon(p.sides, w, h)),
            _ => Outline::boxed(w, h, node.corner_radius),
        };
        let cmds = self.decorate(node, &outline, size, scope, waiter);
        self.tree.redraw(container, cmds);
    }

    /// Shadow, then gradient or solid fill, then image, then stroke.
    pub(super) fn decorate(
        &mut self,
        node: &SceneNode,
        outline: &Outline,
        size: (f32, f32),
        scope: &ThemeScope,
        waiter: NodeId,
    ) -> Vec<DrawCmd> {
        let env = self.env;
        let vars = &env.theme.variables;
        let mut cmds = Vec::new();
        if let Some(shadow) = &node.shadow {
            cmds.push(shadow_cmd(shadow, &outline.geometry));
        }
        if outline.filled {
            let brush = node
                .gradient
                .as_ref()
                .and_then(|g| gradient_brush(g, size.0, size.1))
                .or_else(|| {
                    node.fill
                        .as_ref()
                        .and_then(|p| resolve_paint(p, vars, scope))
                        .map(Brush::Solid)
                });
            if let Some(brush) = brush {
                cmds.push(DrawCmd::Fill {
                    geometry: outline.geometry.clone(),
                    brush,
                    rule: outline.rule,
                });
            }
            if let Some(image) = &node.image
                && let Some(asset) = self.assets.image(&image.url, waiter, self.loader)
            {
                cmds.push(DrawCmd::Image {
                    url: image.url.clone(),
                    placement: image_placement(image.mode, size.0, size.1, (asset.width, asset.height)),
                    clip: outline.geometry.clone(),
                });
            }
        }
        if let Some(color) = node.stroke.as_ref().and_then(|p| resolve_paint(p, vars, scope)) {
            match node.stroke_width {
                StrokeWidth::Sides(sides) if outline.sides => {
                    cmds.extend(side_strokes(sides, size.0, size.1, color));
                }
                width => {
                    let stroke = outline.stroke.unwrap_or_else(|| StrokeSpec::new(width.max()));
                    if stroke.width > 0.0 {
                        cmds.push(DrawCmd::Stroke {
                            geometry: outline.geometry.clone(),
                            brush: Brush::Solid(color),
                            stroke,
                        });
                    }
                }
            }
        }
        cmds
    }
}
