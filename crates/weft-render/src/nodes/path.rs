//! SVG path nodes.

use super::{Outline, Renderer};
use crate::draw::{Geometry, StrokeSpec};
use crate::error::{GeometryError, RenderError};
use crate::tree::ContainerId;
use kurbo::{Affine, BezPath, PathEl, Shape};
use weft_core::id::NodeId;
use weft_core::model::{FillRule, PathProps, SceneNode};
use weft_core::theme::ThemeScope;

/// Parse the path data and scale it into a `width × height` box. Multiple
/// subpaths default to even-odd so holes stay open.
pub fn path_outline(props: &PathProps, width: f32, height: f32) -> Result<Outline, GeometryError> {
    let mut path = BezPath::from_svg(&props.data)?;
    let bounds = path.bounding_box();
    if path.elements().is_empty() || (bounds.width() <= 0.0 && bounds.height() <= 0.0) {
        return Err(GeometryError::Empty);
    }
    let sx = if bounds.width() > 0.0 { width as f64 / bounds.width() } else { 1.0 };
    let sy = if bounds.height() > 0.0 { height as f64 / bounds.height() } else { 1.0 };
    path.apply_affine(Affine::scale_non_uniform(sx, sy) * Affine::translate((-bounds.x0, -bounds.y0)));

    let subpaths = path
        .elements()
        .iter()
        .filter(|el| matches!(el, PathEl::MoveTo(_)))
        .count();
    let rule = props.fill_rule.unwrap_or(if subpaths > 1 {
        FillRule::EvenOdd
    } else {
        FillRule::NonZero
    });
    Ok(Outline {
        rule,
        ..Outline::closed(Geometry::Path(path))
    })
}

impl Renderer<'_, '_> {
    pub(super) fn draw_path(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        props: &PathProps,
        size: (f32, f32),
        scope: &ThemeScope,
        waiter: NodeId,
    ) {
        let mut outline = match path_outline(props, size.0, size.1) {
            Ok(outline) => outline,
            Err(source) => {
                log::warn!("path `{}` falls back to its bounds: {source}", node.id);
                self.errors.push(RenderError::Geometry {
                    node: node.id,
                    source,
                });
                Outline::closed(Geometry::rect(size.0, size.1, 0.0))
            }
        };
        outline.stroke = Some(StrokeSpec {
            width: props.thickness.unwrap_or_else(|| node.stroke_width.max()) as f64,
            cap: props.cap.unwrap_or_default(),
            join: props.join.unwrap_or_default(),
        });
        let cmds = self.decorate(node, &outline, size, scope, waiter);
        self.tree.redraw(container, cmds);
    }
}
