//! Text measurement and wrapping.
//!
//! Glyph advances come from a `TextMeasurer` supplied by the host (a real
//! shaper in the editor, `ApproxMeasurer` in tests and headless use).
//! Line breaking, line height and the measurement cache live here so that
//! layout, instance resolution and text rendering all agree on sizes.

use crate::model::{FontSpec, FontStyle, SceneNode, TextProps, WidthMode};
use std::cell::RefCell;
use std::collections::HashMap;

/// Per-line advance measurement.
pub trait TextMeasurer {
    /// Width of a single line of `text` (no line breaks) in px.
    fn line_width(&self, text: &str, font: &FontSpec, letter_spacing: f32) -> f32;
}

/// Advance estimate proportional to font size, heavier weights slightly wider.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasurer;

impl TextMeasurer for ApproxMeasurer {
    fn line_width(&self, text: &str, font: &FontSpec, letter_spacing: f32) -> f32 {
        let weight_factor = 1.0 + (font.weight.saturating_sub(400) as f32 / 100.0) * 0.03;
        let italic_factor = if font.style == FontStyle::Italic { 1.02 } else { 1.0 };
        let mut width = 0.0;
        let mut count = 0usize;
        for ch in text.chars() {
            let advance = if ch == ' ' { 0.3 } else { 0.55 };
            width += advance * font.size * weight_factor * italic_factor;
            count += 1;
        }
        width + letter_spacing * count.saturating_sub(1) as f32
    }
}

/// Result of measuring one text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    /// Line height in px (font size × multiplier).
    pub line_height: f32,
    pub lines: Vec<String>,
    pub line_widths: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeasureKey {
    content: String,
    family: String,
    weight: u16,
    style: FontStyle,
    size_bits: u32,
    spacing_bits: u32,
    line_height_bits: u32,
    wrap_bits: Option<u32>,
}

/// Entries kept before the cache is flushed.
pub const DEFAULT_TEXT_CACHE_CAPACITY: usize = 4096;

/// Engine-owned measurement cache in front of a `TextMeasurer`.
///
/// Holds at most `capacity` entries; inserting past that flushes the map.
pub struct TextMetricsCache {
    measurer: Box<dyn TextMeasurer>,
    cache: RefCell<HashMap<MeasureKey, TextMetrics>>,
    capacity: usize,
}

impl TextMetricsCache {
    pub fn new(measurer: Box<dyn TextMeasurer>) -> Self {
        Self::with_capacity(measurer, DEFAULT_TEXT_CACHE_CAPACITY)
    }

    pub fn with_capacity(measurer: Box<dyn TextMeasurer>, capacity: usize) -> Self {
        Self {
            measurer,
            cache: RefCell::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Measure `props`; wraps at `max_width` when given.
    pub fn measure(&self, props: &TextProps, max_width: Option<f32>) -> TextMetrics {
        let key = MeasureKey {
            content: props.content.clone(),
            family: props.font.family.clone(),
            weight: props.font.weight,
            style: props.font.style,
            size_bits: props.font.size.to_bits(),
            spacing_bits: props.letter_spacing.to_bits(),
            line_height_bits: props.line_height.to_bits(),
            wrap_bits: max_width.map(f32::to_bits),
        };
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }
        let metrics = layout_lines(self.measurer.as_ref(), props, max_width);
        let mut cache = self.cache.borrow_mut();
        if cache.len() >= self.capacity {
            log::debug!("text metrics cache full ({} entries), flushing", cache.len());
            cache.clear();
        }
        cache.insert(key, metrics.clone());
        metrics
    }

    /// Measure a text node the way it renders: wrapped at its stored width
    /// only in fixed width mode.
    pub fn measure_node(&self, node: &SceneNode) -> Option<TextMetrics> {
        let props = node.as_text()?;
        let wrap = match props.width_mode {
            WidthMode::Fixed => Some(node.width),
            WidthMode::Auto => None,
        };
        Some(self.measure(props, wrap))
    }

    /// The node's rendered box: measured for auto width, stored width with
    /// measured height for fixed width.
    pub fn node_size(&self, node: &SceneNode) -> Option<(f32, f32)> {
        let props = node.as_text()?;
        let metrics = self.measure_node(node)?;
        Some(match props.width_mode {
            WidthMode::Auto => (metrics.width, metrics.height),
            WidthMode::Fixed => (node.width, metrics.height),
        })
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl Default for TextMetricsCache {
    fn default() -> Self {
        Self::new(Box::new(ApproxMeasurer))
    }
}

fn layout_lines(measurer: &dyn TextMeasurer, props: &TextProps, max_width: Option<f32>) -> TextMetrics {
    let line_height = props.font.size * props.line_height;
    let width_of = |s: &str| measurer.line_width(s, &props.font, props.letter_spacing);

    let mut lines = Vec::new();
    for paragraph in props.content.split('\n') {
        match max_width {
            Some(limit) => wrap_paragraph(paragraph, limit, &width_of, &mut lines),
            None => lines.push(paragraph.to_string()),
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    let line_widths: Vec<f32> = lines.iter().map(|l| width_of(l)).collect();
    let width = line_widths.iter().copied().fold(0.0f32, f32::max);
    TextMetrics {
        width,
        height: line_height * lines.len() as f32,
        line_height,
        lines,
        line_widths,
    }
}

/// Greedy word wrap. A single word wider than `limit` gets its own line.
fn wrap_paragraph(paragraph: &str, limit: f32, width_of: &dyn Fn(&str) -> f32, out: &mut Vec<String>) {
    let mut current = String::new();
    for word in paragraph.split(' ') {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if width_of(&candidate) <= limit {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    out.push(current);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(content: &str) -> TextProps {
        TextProps {
            content: content.to_string(),
            font: FontSpec {
                size: 10.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn cache_stays_within_capacity() {
        let cache = TextMetricsCache::with_capacity(Box::new(ApproxMeasurer), 3);
        for typed in ["H", "He", "Hel", "Hell", "Hello"] {
            cache.measure(&props(typed), None);
            assert!(cache.len() <= 3);
        }
        let again = cache.measure(&props("Hello"), None);
        assert_eq!(again.lines, vec!["Hello"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn auto_width_is_single_line() {
        let cache = TextMetricsCache::default();
        let m = cache.measure(&props("hello world"), None);
        assert_eq!(m.lines, vec!["hello world"]);
        assert!((m.height - 12.0).abs() < 1e-4); // 10 × 1.2
    }

    #[test]
    fn fixed_width_wraps_words() {
        let cache = TextMetricsCache::default();
        // "hello" = 5 × 5.5 = 27.5px
        let m = cache.measure(&props("hello hello hello"), Some(40.0));
        assert_eq!(m.lines, vec!["hello", "hello", "hello"]);
        assert!((m.height - 36.0).abs() < 1e-4);
    }

    #[test]
    fn explicit_newlines_always_split() {
        let cache = TextMetricsCache::default();
        let m = cache.measure(&props("a\nb"), None);
        assert_eq!(m.lines.len(), 2);
    }

    #[test]
    fn empty_text_has_one_line() {
        let cache = TextMetricsCache::default();
        let m = cache.measure(&props(""), None);
        assert_eq!(m.lines, vec![String::new()]);
        assert_eq!(m.width, 0.0);
        assert!(m.height > 0.0);
    }

    #[test]
    fn cache_memoizes_requests() {
        let cache = TextMetricsCache::default();
        cache.measure(&props("abc"), None);
        cache.measure(&props("abc"), None);
        assert_eq!(cache.len(), 1);
        cache.measure(&props("abc"), Some(100.0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn fixed_width_node_keeps_stored_width() {
        let cache = TextMetricsCache::default();
        let node = SceneNode::text("t", "some words here")
            .sized(60.0, 0.0)
            .with_text(|t| t.width_mode = WidthMode::Fixed);
        let (w, h) = cache.node_size(&node).unwrap();
        assert_eq!(w, 60.0);
        assert!(h > 0.0);
    }
}
