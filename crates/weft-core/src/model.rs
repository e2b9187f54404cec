//! Core scene data model.
//!
//! A document is a normalized tree of `SceneNode` values (see `scene.rs`
//! for the flattened snapshot). Every node carries the common geometry and
//! paint fields; kind-specific data lives in `NodeKind`. Frames flagged
//! `reusable` are component definitions, and `InstanceRef` nodes render a
//! copy of one with per-descendant overrides and slot content.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let channel = |hi: u8, lo: u8| -> Option<f32> {
            Some((hex_val(hi)? << 4 | hex_val(lo)?) as f32 / 255.0)
        };
        let short = |c: u8| -> Option<f32> { Some((hex_val(c)? * 17) as f32 / 255.0) };

        match bytes.len() {
            3 => Some(Self::rgba(
                short(bytes[0])?,
                short(bytes[1])?,
                short(bytes[2])?,
                1.0,
            )),
            4 => Some(Self::rgba(
                short(bytes[0])?,
                short(bytes[1])?,
                short(bytes[2])?,
                short(bytes[3])?,
            )),
            6 => Some(Self::rgba(
                channel(bytes[0], bytes[1])?,
                channel(bytes[2], bytes[3])?,
                channel(bytes[4], bytes[5])?,
                1.0,
            )),
            8 => Some(Self::rgba(
                channel(bytes[0], bytes[1])?,
                channel(bytes[2], bytes[3])?,
                channel(bytes[4], bytes[5])?,
                channel(bytes[6], bytes[7])?,
            )),
            _ => None,
        }
    }

    /// Emit as shortest valid hex string.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Same color with alpha multiplied by `factor`.
    pub fn multiply_alpha(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }
}

/// A color that is either written literally or bound to a design variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorValue {
    Literal(Color),
    Variable(String),
}

/// Fill or stroke paint: a color value plus its own opacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub color: ColorValue,
    #[serde(default = "one")]
    pub opacity: f32,
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Self {
            color: ColorValue::Literal(color),
            opacity: 1.0,
        }
    }

    pub fn variable(name: &str) -> Self {
        Self {
            color: ColorValue::Variable(name.to_string()),
            opacity: 1.0,
        }
    }
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradientKind {
    Linear {
        angle: f32, // degrees, 0 = left → right
    },
    Radial,
}

/// Gradient fill. Takes precedence over the solid fill when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
}

/// How an image fill is scaled into the node box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageScaleMode {
    /// Cover the box, cropping overflow.
    #[default]
    Fill,
    /// Contain inside the box, letterboxing.
    Fit,
    /// Distort to the box.
    Stretch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFill {
    pub url: String,
    #[serde(default)]
    pub mode: ImageScaleMode,
}

// ─── Stroke ──────────────────────────────────────────────────────────────

/// Per-side stroke widths (top, right, bottom, left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeWidth {
    Uniform(f32),
    Sides(Sides),
}

impl Default for StrokeWidth {
    fn default() -> Self {
        StrokeWidth::Uniform(1.0)
    }
}

impl StrokeWidth {
    /// Largest width across sides; zero means nothing is stroked.
    pub fn max(&self) -> f32 {
        match *self {
            StrokeWidth::Uniform(w) => w,
            StrokeWidth::Sides(s) => s.top.max(s.right).max(s.bottom).max(s.left),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

// ─── Shadow ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub color: Color,
}

// ─── Font / Text ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16, // 100..900
    pub size: f32,
    #[serde(default)]
    pub style: FontStyle,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Inter".into(),
            weight: 400,
            size: 14.0,
            style: FontStyle::Normal,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Whether a text box hugs its content or wraps at its stored width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthMode {
    #[default]
    Auto,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProps {
    pub content: String,
    pub font: FontSpec,
    pub width_mode: WidthMode,
    pub align: TextAlign,
    /// Multiplier of the font size.
    pub line_height: f32,
    pub letter_spacing: f32,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: String::new(),
            font: FontSpec::default(),
            width_mode: WidthMode::Auto,
            align: TextAlign::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

// ─── Auto-layout ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    #[default]
    Row,
    Column,
}

/// Cross-axis alignment of auto-layout children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignItems {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

/// Main-axis distribution of auto-layout children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Flex-box style configuration of a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLayout {
    pub direction: LayoutDirection,
    pub gap: f32,
    pub padding: Padding,
    pub align: AlignItems,
    pub justify: Justify,
}

impl AutoLayout {
    pub fn row(gap: f32) -> Self {
        Self {
            direction: LayoutDirection::Row,
            gap,
            ..Default::default()
        }
    }

    pub fn column(gap: f32) -> Self {
        Self {
            direction: LayoutDirection::Column,
            gap,
            ..Default::default()
        }
    }
}

/// Per-axis sizing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sizing {
    #[default]
    Fixed,
    /// Grow to fill the parent auto-layout frame along this axis.
    Fill,
    /// Hug the content along this axis.
    FitContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSizing {
    pub horizontal: Sizing,
    pub vertical: Sizing,
}

impl AxisSizing {
    pub const FIT: AxisSizing = AxisSizing {
        horizontal: Sizing::FitContent,
        vertical: Sizing::FitContent,
    };
}

// ─── Kind-specific props ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameProps {
    pub clip: bool,
    pub auto_layout: Option<AutoLayout>,
    pub sizing: AxisSizing,
    /// Theme override applied to every descendant's color resolution.
    pub theme: Option<String>,
    /// Marks this frame as a component definition.
    pub reusable: bool,
    /// Descendant ids instances may replace with their own content.
    pub slots: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathProps {
    /// SVG path data (`M 0 0 L 10 10 Z`).
    pub data: String,
    pub fill_rule: Option<FillRule>,
    pub cap: Option<StrokeCap>,
    pub join: Option<StrokeJoin>,
    pub thickness: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonProps {
    pub sides: u32,
}

impl Default for PolygonProps {
    fn default() -> Self {
        Self { sides: 3 }
    }
}

/// A replacement subtree supplied by an instance for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotNode {
    pub node: SceneNode,
    #[serde(default)]
    pub children: Vec<SlotNode>,
}

impl SlotNode {
    pub fn leaf(node: SceneNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceProps {
    pub component_id: NodeId,
    /// Overrides keyed by the component child id; nested children are
    /// addressed through each override's own `descendants`.
    pub descendants: HashMap<NodeId, NodeOverride>,
    pub slots: HashMap<NodeId, Vec<SlotNode>>,
}

/// Property overrides applied to one instance descendant.
///
/// `None` always means "not overridden".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeOverride {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
    pub visible: Option<bool>,
    pub enabled: Option<bool>,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<StrokeWidth>,
    pub corner_radius: Option<f32>,
    pub shadow: Option<Shadow>,
    pub gradient: Option<Gradient>,
    pub image: Option<ImageFill>,
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub descendants: HashMap<NodeId, NodeOverride>,
}

impl NodeOverride {
    /// Shallow-merge every `Some` field onto `node`.
    pub fn apply(&self, node: &mut SceneNode) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(v) = &self.$field {
                    node.$field = v.clone();
                })*
            };
        }
        merge!(x, y, width, height, rotation, opacity, visible, enabled, stroke_width, corner_radius);
        if self.fill.is_some() {
            node.fill = self.fill.clone();
        }
        if self.stroke.is_some() {
            node.stroke = self.stroke.clone();
        }
        if self.shadow.is_some() {
            node.shadow = self.shadow.clone();
        }
        if self.gradient.is_some() {
            node.gradient = self.gradient.clone();
        }
        if self.image.is_some() {
            node.image = self.image.clone();
        }

        if let NodeKind::Text(text) = &mut node.kind {
            if let Some(content) = &self.content {
                text.content = content.clone();
            }
            if let Some(family) = &self.font_family {
                text.font.family = family.clone();
            }
            if let Some(size) = self.font_size {
                text.font.size = size;
            }
            if let Some(weight) = self.font_weight {
                text.font.weight = weight;
            }
            if let Some(style) = self.font_style {
                text.font.style = style;
            }
            if let Some(align) = self.text_align {
                text.align = align;
            }
            if let Some(lh) = self.line_height {
                text.line_height = lh;
            }
            if let Some(ls) = self.letter_spacing {
                text.letter_spacing = ls;
            }
        }
    }

    /// Merge `other` on top of `self` (fields of `other` win), recursively
    /// for nested descendants.
    pub fn layered(&self, other: &NodeOverride) -> NodeOverride {
        let mut out = self.clone();
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    out.$field = other.$field.clone();
                })*
            };
        }
        take!(
            x, y, width, height, rotation, opacity, visible, enabled, fill, stroke, stroke_width,
            corner_radius, shadow, gradient, image, content, font_family, font_size, font_weight,
            font_style, text_align, line_height, letter_spacing
        );
        for (id, nested) in &other.descendants {
            let merged = match out.descendants.get(id) {
                Some(existing) => existing.layered(nested),
                None => nested.clone(),
            };
            out.descendants.insert(*id, merged);
        }
        out
    }
}

// ─── Scene Nodes ─────────────────────────────────────────────────────────

/// The node kinds of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Visible container; may carry auto-layout, a theme override, or be a component.
    Frame(FrameProps),
    /// Transform-only container.
    Group,
    Rect,
    Ellipse,
    Line,
    Polygon(PolygonProps),
    Path(PathProps),
    Text(TextProps),
    /// A rendered copy of a reusable frame.
    InstanceRef(InstanceProps),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Frame(_) => "frame",
            NodeKind::Group => "group",
            NodeKind::Rect => "rect",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Line => "line",
            NodeKind::Polygon(_) => "polygon",
            NodeKind::Path(_) => "path",
            NodeKind::Text(_) => "text",
            NodeKind::InstanceRef(_) => "instance",
        }
    }
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// A single node in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub shadow: Option<Shadow>,
    #[serde(default)]
    pub gradient: Option<Gradient>,
    #[serde(default)]
    pub image: Option<ImageFill>,
    #[serde(default)]
    pub fill: Option<Paint>,
    #[serde(default)]
    pub stroke: Option<Paint>,
    #[serde(default)]
    pub stroke_width: StrokeWidth,
    #[serde(default)]
    pub corner_radius: f32,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: NodeId::intern(id),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            enabled: true,
            flip_x: false,
            flip_y: false,
            shadow: None,
            gradient: None,
            image: None,
            fill: None,
            stroke: None,
            stroke_width: StrokeWidth::default(),
            corner_radius: 0.0,
            kind,
        }
    }

    pub fn frame(id: &str, width: f32, height: f32) -> Self {
        Self::new(id, NodeKind::Frame(FrameProps::default())).sized(width, height)
    }

    pub fn group(id: &str) -> Self {
        Self::new(id, NodeKind::Group)
    }

    pub fn rect(id: &str, width: f32, height: f32) -> Self {
        Self::new(id, NodeKind::Rect).sized(width, height)
    }

    pub fn ellipse(id: &str, width: f32, height: f32) -> Self {
        Self::new(id, NodeKind::Ellipse).sized(width, height)
    }

    pub fn text(id: &str, content: &str) -> Self {
        Self::new(
            id,
            NodeKind::Text(TextProps {
                content: content.to_string(),
                ..Default::default()
            }),
        )
    }

    pub fn instance(id: &str, component: &str) -> Self {
        Self::new(
            id,
            NodeKind::InstanceRef(InstanceProps {
                component_id: NodeId::intern(component),
                ..Default::default()
            }),
        )
    }

    // ─── Builders ────────────────────────────────────────────────────────

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(Paint::solid(color));
        self
    }

    pub fn with_fill_var(mut self, name: &str) -> Self {
        self.fill = Some(Paint::variable(name));
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(Paint::solid(color));
        self.stroke_width = StrokeWidth::Uniform(width);
        self
    }

    /// Apply `f` to the frame props; no-op for other kinds.
    pub fn with_frame(mut self, f: impl FnOnce(&mut FrameProps)) -> Self {
        if let NodeKind::Frame(props) = &mut self.kind {
            f(props);
        }
        self
    }

    /// Apply `f` to the text props; no-op for other kinds.
    pub fn with_text(mut self, f: impl FnOnce(&mut TextProps)) -> Self {
        if let NodeKind::Text(props) = &mut self.kind {
            f(props);
        }
        self
    }

    /// Apply `f` to the instance props; no-op for other kinds.
    pub fn with_instance(mut self, f: impl FnOnce(&mut InstanceProps)) -> Self {
        if let NodeKind::InstanceRef(props) = &mut self.kind {
            f(props);
        }
        self
    }

    pub fn with_auto_layout(self, layout: AutoLayout) -> Self {
        self.with_frame(|f| f.auto_layout = Some(layout))
    }

    pub fn reusable(self) -> Self {
        self.with_frame(|f| f.reusable = true)
    }

    pub fn themed(self, theme: &str) -> Self {
        self.with_frame(|f| f.theme = Some(theme.to_string()))
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn as_frame(&self) -> Option<&FrameProps> {
        match &self.kind {
            NodeKind::Frame(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            NodeKind::Text(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceProps> {
        match &self.kind {
            NodeKind::InstanceRef(props) => Some(props),
            _ => None,
        }
    }

    pub fn auto_layout(&self) -> Option<&AutoLayout> {
        self.as_frame().and_then(|f| f.auto_layout.as_ref())
    }

    pub fn theme_override(&self) -> Option<&str> {
        self.as_frame().and_then(|f| f.theme.as_deref())
    }

    pub fn is_component(&self) -> bool {
        self.as_frame().is_some_and(|f| f.reusable)
    }

    /// Frames and groups host structural children.
    pub fn has_children_host(&self) -> bool {
        matches!(self.kind, NodeKind::Frame(_) | NodeKind::Group)
    }

    pub fn sizing(&self) -> AxisSizing {
        self.as_frame().map(|f| f.sizing).unwrap_or_default()
    }

    /// `visible` and `enabled` together; editing state is layered on top by the renderer.
    pub fn is_shown(&self) -> bool {
        self.visible && self.enabled
    }
}

// ─── Resolved positions (output of the layout adapter) ───────────────────

/// A resolved box, relative to the parent container's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ResolvedBounds {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Check if this bounds intersects with a rectangle (AABB overlap).
    pub fn intersects_rect(&self, rx: f32, ry: f32, rw: f32, rh: f32) -> bool {
        self.x < rx + rw
            && self.x + self.width > rx
            && self.y < ry + rh
            && self.y + self.height > ry
    }
}
