//! Engine configuration.

use serde::Deserialize;
use std::time::Duration;
use weft_core::model::Color;
use weft_core::text::DEFAULT_TEXT_CACHE_CAPACITY;
use weft_render::RenderConfig;

/// Configuration for `Engine`. Every field has a default, so a partial
/// (or empty) JSON/TOML table deserializes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Settle window after the last viewport scale change before text is
    /// re-rasterized at the new resolution. Default: **150 ms**.
    pub zoom_settle_ms: u64,

    /// Physical pixels per canvas pixel at zoom 1. Default: **1.0**.
    pub device_pixel_ratio: f32,

    /// Upper bound of the text oversampling factor. Default: **4.0**.
    pub max_text_resolution: f32,

    /// Size of the box drawn for an unresolvable component when the
    /// instance has no size of its own. Default: **100 × 100**.
    pub placeholder_size: (f32, f32),

    pub placeholder_fill: Color,

    pub placeholder_stroke: Color,

    /// Family drawn while a text node's own font is loading or failed.
    /// Default: **"sans-serif"**.
    pub fallback_font_family: String,

    /// Font families requested at mount. Default: **["Inter", "sans-serif"]**.
    pub preloaded_fonts: Vec<String>,

    /// Nested instance depth before expansion stops with a placeholder.
    /// Default: **16**.
    pub max_instance_depth: usize,

    /// Text measurements memoized before the cache is flushed.
    /// Default: **4096**.
    pub text_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let render = RenderConfig::default();
        Self {
            zoom_settle_ms: 150,
            device_pixel_ratio: 1.0,
            max_text_resolution: 4.0,
            placeholder_size: render.placeholder_size,
            placeholder_fill: render.placeholder_fill,
            placeholder_stroke: render.placeholder_stroke,
            fallback_font_family: render.fallback_font_family,
            preloaded_fonts: vec!["Inter".into(), "sans-serif".into()],
            max_instance_depth: render.max_instance_depth,
            text_cache_capacity: DEFAULT_TEXT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn zoom_settle(&self) -> Duration {
        Duration::from_millis(self.zoom_settle_ms)
    }

    /// The subset handed to node renderers.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            placeholder_size: self.placeholder_size,
            placeholder_fill: self.placeholder_fill,
            placeholder_stroke: self.placeholder_stroke,
            fallback_font_family: self.fallback_font_family.clone(),
            max_instance_depth: self.max_instance_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "zoom_settle_ms": 40, "device_pixel_ratio": 2.0 }"#).unwrap();
        assert_eq!(config.zoom_settle(), Duration::from_millis(40));
        assert_eq!(config.device_pixel_ratio, 2.0);
        assert_eq!(config.max_text_resolution, 4.0);
        assert_eq!(config.preloaded_fonts, vec!["Inter", "sans-serif"]);
        assert_eq!(config.render_config().placeholder_size, (100.0, 100.0));
        assert_eq!(config.text_cache_capacity, DEFAULT_TEXT_CACHE_CAPACITY);
    }
}
