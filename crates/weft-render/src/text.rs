//! Text styles and positioned line runs.

use weft_core::model::{Color, FontStyle, TextAlign, TextProps};
use weft_core::text::TextMetrics;

/// Style object handed to the host text rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
    pub color: Color,
    pub align: TextAlign,
    /// Line height in px.
    pub line_height: f32,
    pub letter_spacing: f32,
    /// Set only for fixed-width text.
    pub wrap_width: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// A laid-out text block: style plus one entry per line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub style: TextStyle,
    pub lines: Vec<TextLine>,
}

impl TextRun {
    /// Position measured lines inside a box of `box_width`.
    pub fn layout(
        props: &TextProps,
        metrics: &TextMetrics,
        box_width: f32,
        color: Color,
        family: &str,
        wrap_width: Option<f32>,
    ) -> Self {
        let lines = metrics
            .lines
            .iter()
            .zip(&metrics.line_widths)
            .enumerate()
            .map(|(i, (text, &width))| {
                let x = match props.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => (box_width - width) / 2.0,
                    TextAlign::Right => box_width - width,
                };
                TextLine {
                    text: text.clone(),
                    x,
                    y: i as f32 * metrics.line_height,
                    width,
                }
            })
            .collect();
        Self {
            style: TextStyle {
                family: family.to_string(),
                size: props.font.size,
                weight: props.font.weight,
                italic: props.font.style == FontStyle::Italic,
                color,
                align: props.align,
                line_height: metrics.line_height,
                letter_spacing: props.letter_spacing,
                wrap_width,
            },
            lines,
        }
    }
}

/// Rasterization oversampling for the current zoom: `ceil(scale × dpr)`
/// clamped to `[1, max]`.
pub fn text_resolution(scale: f32, device_pixel_ratio: f32, max: f32) -> f32 {
    let raw = (scale * device_pixel_ratio).ceil();
    if raw.is_finite() {
        raw.clamp(1.0, max.max(1.0))
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::text::TextMetricsCache;

    #[test]
    fn resolution_rounds_up_and_clamps() {
        assert_eq!(text_resolution(1.0, 1.0, 4.0), 1.0);
        assert_eq!(text_resolution(1.3, 1.0, 4.0), 2.0);
        assert_eq!(text_resolution(0.1, 1.0, 4.0), 1.0);
        assert_eq!(text_resolution(3.0, 2.0, 4.0), 4.0);
        assert_eq!(text_resolution(f32::NAN, 1.0, 4.0), 1.0);
    }

    #[test]
    fn centered_lines_share_a_midline() {
        let props = TextProps {
            content: "ab\nabcd".into(),
            align: TextAlign::Center,
            ..Default::default()
        };
        let metrics = TextMetricsCache::default().measure(&props, None);
        let run = TextRun::layout(&props, &metrics, 100.0, Color::BLACK, "Inter", None);
        let mid = |l: &TextLine| l.x + l.width / 2.0;
        assert!((mid(&run.lines[0]) - 50.0).abs() < 1e-4);
        assert!((mid(&run.lines[1]) - 50.0).abs() < 1e-4);
        assert_eq!(run.lines[1].y, metrics.line_height);
        assert_eq!(run.style.size, 14.0);
    }
}
