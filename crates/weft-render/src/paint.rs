//! Render tree → Vello drawing commands.
//!
//! Walks the retained tree depth-first and encodes each container's display
//! list: alpha layers for translucent containers, clip layers for masks,
//! blurred rounded rects for shadows, gradient brushes and image sprites.
//! Text runs go to a host `TextPainter`; without one they are only traced.

use crate::assets::AssetCache;
use crate::draw::{Brush, DrawCmd, Geometry, StrokeSpec};
use crate::text::TextRun;
use crate::tree::{ContainerId, RenderTree};
use kurbo::{Affine, Cap, Join, Rect, Stroke as KurboStroke};
use peniko::{Color, Fill, Gradient, Mix};
use vello::Scene;
use weft_core::model::{self, FillRule, StrokeCap, StrokeJoin};

/// Host text rasterizer.
pub trait TextPainter {
    /// Draw `run` with its top-left at the origin of `transform`,
    /// oversampled by `resolution`.
    fn paint_text(&self, scene: &mut Scene, transform: Affine, run: &TextRun, resolution: f32);
}

const UNBOUNDED: Rect = Rect::new(-1.0e9, -1.0e9, 1.0e9, 1.0e9);

/// Paint the whole render tree into `scene` under the `view` transform.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_tree(
    scene: &mut Scene,
    tree: &RenderTree,
    assets: &AssetCache,
    text: Option<&dyn TextPainter>,
    view: Affine,
) {
    let painter = Painter { tree, assets, text };
    painter.paint(scene, tree.root(), view);
}

struct Painter<'a> {
    tree: &'a RenderTree,
    assets: &'a AssetCache,
    text: Option<&'a dyn TextPainter>,
}

impl Painter<'_> {
    fn paint(&self, scene: &mut Scene, id: ContainerId, parent: Affine) {
        let Some(container) = self.tree.get(id) else {
            return;
        };
        if !container.visible || container.alpha <= 0.0 {
            return;
        }
        let transform = parent * container.transform.to_affine();
        let translucent = container.alpha < 1.0;
        if translucent {
            scene.push_layer(Mix::Normal, container.alpha, Affine::IDENTITY, &UNBOUNDED);
        }

        for cmd in &container.display {
            self.paint_cmd(scene, cmd, transform, container.text_resolution.unwrap_or(1.0));
        }

        if let Some(mask) = &container.mask {
            scene.push_layer(Mix::Clip, 1.0, transform, &mask.to_path());
        }
        for &child in container.children() {
            self.paint(scene, child, transform);
        }
        if container.mask.is_some() {
            scene.pop_layer();
        }

        if translucent {
            scene.pop_layer();
        }
    }

    fn paint_cmd(&self, scene: &mut Scene, cmd: &DrawCmd, transform: Affine, resolution: f32) {
        match cmd {
            DrawCmd::Shadow {
                rect,
                radius,
                blur,
                color,
            } => {
                scene.draw_blurred_rounded_rect(transform, *rect, to_color(*color), *radius, blur / 2.0);
            }
            DrawCmd::Fill {
                geometry,
                brush,
                rule,
            } => {
                let fill = match rule {
                    FillRule::NonZero => Fill::NonZero,
                    FillRule::EvenOdd => Fill::EvenOdd,
                };
                scene.fill(fill, transform, &to_brush(brush), None, &geometry.to_path());
            }
            DrawCmd::Stroke {
                geometry,
                brush,
                stroke,
            } => {
                scene.stroke(&to_stroke(stroke), transform, &to_brush(brush), None, &geometry.to_path());
            }
            DrawCmd::Image {
                url,
                placement,
                clip,
            } => self.paint_image(scene, url, *placement, clip, transform),
            DrawCmd::Text(run) => match self.text {
                Some(painter) => painter.paint_text(scene, transform, run, resolution),
                None => log::trace!(
                    "text {:?} ({} lines) without a text painter",
                    run.lines.first().map(|l| l.text.as_str()),
                    run.lines.len()
                ),
            },
        }
    }

    fn paint_image(&self, scene: &mut Scene, url: &str, placement: Rect, clip: &Geometry, transform: Affine) {
        let Some(image) = self
            .assets
            .image_data(url)
            .and_then(|asset| asset.data.as_ref())
        else {
            return;
        };
        let (iw, ih) = (image.width.max(1) as f64, image.height.max(1) as f64);
        let placed = transform
            * Affine::translate((placement.x0, placement.y0))
            * Affine::scale_non_uniform(placement.width() / iw, placement.height() / ih);
        scene.push_layer(Mix::Clip, 1.0, transform, &clip.to_path());
        scene.draw_image(image, placed);
        scene.pop_layer();
    }
}

fn to_color(c: model::Color) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}

fn to_brush(brush: &Brush) -> peniko::Brush {
    let stops = |stops: &[(f32, model::Color)]| -> Vec<(f32, Color)> {
        stops.iter().map(|(o, c)| (*o, to_color(*c))).collect()
    };
    match brush {
        Brush::Solid(c) => peniko::Brush::Solid(to_color(*c)),
        Brush::Linear { start, end, stops: s } => {
            Gradient::new_linear(*start, *end).with_stops(stops(s).as_slice()).into()
        }
        Brush::Radial {
            center,
            radius,
            stops: s,
        } => Gradient::new_radial(*center, *radius as f32)
            .with_stops(stops(s).as_slice())
            .into(),
    }
}

fn to_stroke(spec: &StrokeSpec) -> KurboStroke {
    let cap = match spec.cap {
        StrokeCap::Butt => Cap::Butt,
        StrokeCap::Round => Cap::Round,
        StrokeCap::Square => Cap::Square,
    };
    let join = match spec.join {
        StrokeJoin::Miter => Join::Miter,
        StrokeJoin::Round => Join::Round,
        StrokeJoin::Bevel => Join::Bevel,
    };
    KurboStroke::new(spec.width).with_caps(cap).with_join(join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use weft_core::id::NodeId;

    #[derive(Default)]
    struct CountingText {
        runs: Cell<usize>,
    }

    impl TextPainter for CountingText {
        fn paint_text(&self, _scene: &mut Scene, _transform: Affine, _run: &TextRun, _resolution: f32) {
            self.runs.set(self.runs.get() + 1);
        }
    }

    fn text_run(label: &str) -> DrawCmd {
        let props = model::TextProps {
            content: label.into(),
            ..Default::default()
        };
        let metrics = weft_core::text::TextMetricsCache::default().measure(&props, None);
        DrawCmd::Text(TextRun::layout(&props, &metrics, 100.0, model::Color::BLACK, "Inter", None))
    }

    #[test]
    fn hidden_containers_are_skipped() {
        let mut tree = RenderTree::new();
        let root = tree.root();
        let shown = tree.create(NodeId::intern("paint_shown"), None);
        let hidden = tree.create(NodeId::intern("paint_hidden"), None);
        tree.attach(root, shown, None);
        tree.attach(root, hidden, None);
        tree.redraw(shown, vec![text_run("a")]);
        tree.redraw(hidden, vec![text_run("b")]);
        tree.set_visible(hidden, false);

        let painter = CountingText::default();
        let mut scene = Scene::new();
        paint_tree(&mut scene, &tree, &AssetCache::new(), Some(&painter), Affine::IDENTITY);
        assert_eq!(painter.runs.get(), 1);
    }

    #[test]
    fn stroke_spec_maps_caps_and_joins() {
        let stroke = to_stroke(&StrokeSpec {
            width: 3.0,
            cap: StrokeCap::Round,
            join: StrokeJoin::Bevel,
        });
        assert_eq!(stroke.width, 3.0);
        assert_eq!(stroke.start_cap, Cap::Round);
        assert_eq!(stroke.join, Join::Bevel);
    }

    #[test]
    fn colors_convert_through_rgba8() {
        let c = to_color(model::Color::rgba(1.0, 0.0, 0.0, 0.5));
        assert_eq!(c.components[0], 1.0);
        assert!((c.components[3] - 128.0 / 255.0).abs() < 1e-6);
    }
}
