//! Drawing primitives.
//!
//! Geometry, brushes and the display-list commands a container holds. The
//! commands are plain data; `paint.rs` encodes them into a Vello scene.
//! Colors stay in the document's `Color` type until paint time.

use crate::text::TextRun;
use kurbo::{BezPath, Ellipse, Line, Point, Rect, Shape};
use std::f64::consts::{FRAC_PI_2, TAU};
use weft_core::model::{
    Color, FillRule, Gradient, GradientKind, ImageScaleMode, Shadow, Sides, StrokeCap, StrokeJoin,
};

const TOLERANCE: f64 = 0.1;

/// Shape of a fill, stroke, clip or shadow, in container-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rect { width: f64, height: f64, radius: f64 },
    Ellipse { width: f64, height: f64 },
    Line { to: Point },
    Polygon(Vec<Point>),
    Path(BezPath),
}

impl Geometry {
    pub fn rect(width: f32, height: f32, radius: f32) -> Self {
        Geometry::Rect {
            width: width as f64,
            height: height as f64,
            radius: radius.max(0.0) as f64,
        }
    }

    pub fn ellipse(width: f32, height: f32) -> Self {
        Geometry::Ellipse {
            width: width as f64,
            height: height as f64,
        }
    }

    /// Regular polygon inscribed in the box, first vertex at the top.
    pub fn polygon(sides: u32, width: f32, height: f32) -> Self {
        let n = sides.max(3);
        let (rx, ry) = (width as f64 / 2.0, height as f64 / 2.0);
        let points = (0..n)
            .map(|i| {
                let a = -FRAC_PI_2 + TAU * i as f64 / n as f64;
                Point::new(rx + rx * a.cos(), ry + ry * a.sin())
            })
            .collect();
        Geometry::Polygon(points)
    }

    pub fn to_path(&self) -> BezPath {
        match self {
            Geometry::Rect {
                width,
                height,
                radius,
            } => {
                let rect = Rect::new(0.0, 0.0, *width, *height);
                if *radius > 0.0 {
                    rect.to_rounded_rect(*radius).to_path(TOLERANCE)
                } else {
                    rect.to_path(TOLERANCE)
                }
            }
            Geometry::Ellipse { width, height } => {
                Ellipse::from_rect(Rect::new(0.0, 0.0, *width, *height)).to_path(TOLERANCE)
            }
            Geometry::Line { to } => Line::new(Point::ZERO, *to).to_path(TOLERANCE),
            Geometry::Polygon(points) => {
                let mut path = BezPath::new();
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        path.move_to(*p);
                    } else {
                        path.line_to(*p);
                    }
                }
                if !points.is_empty() {
                    path.close_path();
                }
                path
            }
            Geometry::Path(path) => path.clone(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Geometry::Rect { width, height, .. } | Geometry::Ellipse { width, height } => {
                Rect::new(0.0, 0.0, *width, *height)
            }
            _ => self.to_path().bounding_box(),
        }
    }

    /// Corner radius a shadow of this shape should use.
    pub fn shadow_radius(&self) -> f64 {
        match self {
            Geometry::Rect { radius, .. } => *radius,
            Geometry::Ellipse { width, height } => width.min(*height) / 2.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    Linear {
        start: Point,
        end: Point,
        stops: Vec<(f32, Color)>,
    },
    Radial {
        center: Point,
        radius: f64,
        stops: Vec<(f32, Color)>,
    },
}

/// Gradient brush spanning a `width × height` box. A single stop degrades
/// to a solid brush; no stops draw nothing.
pub fn gradient_brush(gradient: &Gradient, width: f32, height: f32) -> Option<Brush> {
    let mut stops: Vec<(f32, Color)> = gradient
        .stops
        .iter()
        .map(|s| (s.offset.clamp(0.0, 1.0), s.color))
        .collect();
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));
    match stops.len() {
        0 => return None,
        1 => return Some(Brush::Solid(stops[0].1)),
        _ => {}
    }
    let (w, h) = (width as f64, height as f64);
    let center = Point::new(w / 2.0, h / 2.0);
    Some(match gradient.kind {
        GradientKind::Linear { angle } => {
            let rad = (angle as f64).to_radians();
            let (dx, dy) = (rad.cos(), rad.sin());
            let half = (w * dx.abs() + h * dy.abs()) / 2.0;
            Brush::Linear {
                start: Point::new(center.x - dx * half, center.y - dy * half),
                end: Point::new(center.x + dx * half, center.y + dy * half),
                stops,
            }
        }
        GradientKind::Radial => Brush::Radial {
            center,
            radius: w.max(h) / 2.0,
            stops,
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSpec {
    pub width: f64,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

impl StrokeSpec {
    pub fn new(width: f32) -> Self {
        Self {
            width: width as f64,
            cap: StrokeCap::default(),
            join: StrokeJoin::default(),
        }
    }
}

/// One display-list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Blurred shape behind the node.
    Shadow {
        rect: Rect,
        radius: f64,
        blur: f64,
        color: Color,
    },
    Fill {
        geometry: Geometry,
        brush: Brush,
        rule: FillRule,
    },
    Stroke {
        geometry: Geometry,
        brush: Brush,
        stroke: StrokeSpec,
    },
    /// Image sprite at `placement`, clipped to `clip`.
    Image {
        url: String,
        placement: Rect,
        clip: Geometry,
    },
    Text(TextRun),
}

/// Shadow of `geometry` offset by the effect and blurred by its radius.
pub fn shadow_cmd(shadow: &Shadow, geometry: &Geometry) -> DrawCmd {
    let rect = geometry
        .bounds()
        .with_origin((shadow.offset_x as f64, shadow.offset_y as f64));
    DrawCmd::Shadow {
        rect,
        radius: geometry.shadow_radius(),
        blur: shadow.blur.max(0.0) as f64,
        color: shadow.color,
    }
}

/// Where an image of `image` size lands inside a `width × height` box.
pub fn image_placement(mode: ImageScaleMode, width: f32, height: f32, image: (u32, u32)) -> Rect {
    let (bw, bh) = (width as f64, height as f64);
    let (iw, ih) = (image.0.max(1) as f64, image.1.max(1) as f64);
    let scale = match mode {
        ImageScaleMode::Stretch => return Rect::new(0.0, 0.0, bw, bh),
        ImageScaleMode::Fill => (bw / iw).max(bh / ih),
        ImageScaleMode::Fit => (bw / iw).min(bh / ih),
    };
    let (w, h) = (iw * scale, ih * scale);
    let (x, y) = ((bw - w) / 2.0, (bh - h) / 2.0);
    Rect::new(x, y, x + w, y + h)
}

/// Four independent side strokes for a box, each centered on its edge
/// inset by half its width. Zero-width sides are skipped.
pub fn side_strokes(sides: Sides, width: f32, height: f32, color: Color) -> Vec<DrawCmd> {
    let (w, h) = (width as f64, height as f64);
    let edge = |from: Point, to: Point, thickness: f32| DrawCmd::Stroke {
        geometry: Geometry::Path({
            let mut p = BezPath::new();
            p.move_to(from);
            p.line_to(to);
            p
        }),
        brush: Brush::Solid(color),
        stroke: StrokeSpec::new(thickness),
    };
    let mut out = Vec::new();
    if sides.top > 0.0 {
        let y = sides.top as f64 / 2.0;
        out.push(edge(Point::new(0.0, y), Point::new(w, y), sides.top));
    }
    if sides.right > 0.0 {
        let x = w - sides.right as f64 / 2.0;
        out.push(edge(Point::new(x, 0.0), Point::new(x, h), sides.right));
    }
    if sides.bottom > 0.0 {
        let y = h - sides.bottom as f64 / 2.0;
        out.push(edge(Point::new(0.0, y), Point::new(w, y), sides.bottom));
    }
    if sides.left > 0.0 {
        let x = sides.left as f64 / 2.0;
        out.push(edge(Point::new(x, 0.0), Point::new(x, h), sides.left));
    }
    out
}
