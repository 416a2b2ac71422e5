//! Design elements.
//!
//! An [`Element`] is a positioned box plus one of four closed kinds. On the
//! wire it is a flat JSON object with a `type` tag and a loose `properties`
//! bag; missing or mistyped properties fall back to the defaults below
//! instead of rejecting the design.
//!
//! ```json
//! { "type": "text", "x": 10, "y": 8, "width": 200, "height": 40,
//!   "properties": { "content": "SKU 1234", "fontSize": 24, "textAlign": "center" } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::assets::Symbology;
use crate::surface::{Color, Rect};

pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_FONT_WEIGHT: u16 = 400;
pub const DEFAULT_LINE_HEIGHT: f32 = 1.2;
pub const DEFAULT_BORDER_WIDTH: f32 = 1.0;
pub const DEFAULT_CAPTION_FONT_SIZE: f32 = 12.0;

/// A positioned design element. Sequence position in the document is its z-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawElement", into = "RawElement")]
pub struct Element {
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: ElementKind,
}

/// The closed set of element kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text(TextProps),
    Image(ImageProps),
    Shape(ShapeProps),
    Barcode(BarcodeProps),
}

impl ElementKind {
    /// Wire tag.
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
            ElementKind::Shape(_) => "shape",
            ElementKind::Barcode(_) => "barcode",
        }
    }
}

impl Element {
    pub fn new(x: f32, y: f32, width: f32, height: f32, kind: ElementKind) -> Self {
        Self {
            id: None,
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
            kind,
        }
    }

    pub fn text(x: f32, y: f32, width: f32, height: f32, content: impl Into<String>) -> Self {
        Self::new(
            x,
            y,
            width,
            height,
            ElementKind::Text(TextProps {
                content: content.into(),
                ..Default::default()
            }),
        )
    }

    pub fn image(x: f32, y: f32, width: f32, height: f32, src: impl Into<String>) -> Self {
        Self::new(
            x,
            y,
            width,
            height,
            ElementKind::Image(ImageProps {
                src: src.into(),
                ..Default::default()
            }),
        )
    }

    pub fn shape(x: f32, y: f32, width: f32, height: f32, props: ShapeProps) -> Self {
        Self::new(x, y, width, height, ElementKind::Shape(props))
    }

    pub fn barcode(x: f32, y: f32, width: f32, height: f32, value: impl Into<String>) -> Self {
        Self::new(
            x,
            y,
            width,
            height,
            ElementKind::Barcode(BarcodeProps {
                value: value.into(),
                ..Default::default()
            }),
        )
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Bounding box in element units.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// A copy with geometry and size-like properties multiplied by `factor`.
    ///
    /// Used to move a design from its authoring grid to the target DPI grid.
    /// Nothing is rounded here.
    pub fn scaled(&self, factor: f32) -> Element {
        if factor == 1.0 {
            return self.clone();
        }
        let kind = match &self.kind {
            ElementKind::Text(t) => ElementKind::Text(TextProps {
                font_size: t.font_size * factor,
                ..t.clone()
            }),
            ElementKind::Image(i) => ElementKind::Image(i.clone()),
            ElementKind::Shape(s) => ElementKind::Shape(ShapeProps {
                border_width: s.border_width * factor,
                ..s.clone()
            }),
            ElementKind::Barcode(b) => ElementKind::Barcode(BarcodeProps {
                font_size: b.font_size * factor,
                ..b.clone()
            }),
        };
        Element {
            id: self.id.clone(),
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
            kind,
        }
    }
}

// ============================================================================
// KIND PROPERTIES
// ============================================================================

/// Horizontal text alignment within the element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(TextAlign::Left),
            "center" | "centre" | "middle" => Some(TextAlign::Center),
            "right" | "end" => Some(TextAlign::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    /// Embedded `\n` are hard line breaks.
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub color: Color,
    pub align: TextAlign,
    /// Multiplier on `font_size` giving the line advance.
    pub line_height: f32,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: DEFAULT_FONT_WEIGHT,
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }
}

impl TextProps {
    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }

    /// Distance between consecutive baselines.
    pub fn line_advance(&self) -> f32 {
        self.font_size * self.line_height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageProps {
    pub src: String,
    /// Percent, 0..=100.
    pub opacity: f32,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            opacity: 100.0,
        }
    }
}

impl ImageProps {
    /// Opacity as a 0.0..=1.0 multiplier, clamped.
    pub fn alpha(&self) -> f32 {
        self.opacity.clamp(0.0, 100.0) / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeType {
    #[default]
    Rectangle,
    Circle,
    /// Bounding-box diagonal, top-left to bottom-right.
    Line,
}

impl ShapeType {
    /// Parse a shape name; anything unrecognized is a rectangle.
    pub fn parse(s: &str) -> ShapeType {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" | "ellipse" => ShapeType::Circle,
            "line" => ShapeType::Line,
            _ => ShapeType::Rectangle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Line => "line",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProps {
    pub shape: ShapeType,
    pub fill_color: Color,
    /// Percent, 0..=100. Zero means no fill at all.
    pub fill_opacity: f32,
    pub border_color: Color,
    pub border_width: f32,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            shape: ShapeType::Rectangle,
            fill_color: Color::BLACK,
            fill_opacity: 0.0,
            border_color: Color::BLACK,
            border_width: DEFAULT_BORDER_WIDTH,
        }
    }
}

impl ShapeProps {
    pub fn fill_percent(&self) -> f32 {
        self.fill_opacity.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeProps {
    pub value: String,
    pub format: Symbology,
    /// Draw the human-readable value under the bars.
    pub display_value: bool,
    /// Caption font size.
    pub font_size: f32,
}

impl Default for BarcodeProps {
    fn default() -> Self {
        Self {
            value: String::new(),
            format: Symbology::default(),
            display_value: true,
            font_size: DEFAULT_CAPTION_FONT_SIZE,
        }
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

/// Flat JSON shape of an element.
#[derive(Debug, Serialize, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    properties: Map<String, Value>,
}

/// First present value among `keys` (camelCase first, then aliases).
fn prop<'a>(props: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| props.get(*k)).filter(|v| !v.is_null())
}

fn prop_string(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match prop(props, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn prop_f32(props: &Map<String, Value>, keys: &[&str]) -> Option<f32> {
    let v = match prop(props, keys)? {
        Value::Number(n) => n.as_f64()? as f32,
        Value::String(s) => s.trim().trim_end_matches("px").parse::<f32>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn prop_bool(props: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match prop(props, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}

fn prop_color(props: &Map<String, Value>, keys: &[&str]) -> Option<Color> {
    prop_string(props, keys).and_then(|s| Color::parse(&s))
}

fn font_weight(props: &Map<String, Value>) -> Option<u16> {
    let keys = ["fontWeight", "font_weight"];
    if let Some(Value::String(s)) = prop(props, &keys) {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => return Some(400),
            "bold" => return Some(700),
            _ => {}
        }
    }
    prop_f32(props, &keys).map(|w| w.clamp(1.0, 1000.0) as u16)
}

impl TextProps {
    fn from_props(props: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            content: prop_string(props, &["content", "text"]).unwrap_or(d.content),
            font_family: prop_string(props, &["fontFamily", "font_family"]).unwrap_or(d.font_family),
            font_size: prop_f32(props, &["fontSize", "font_size"])
                .filter(|s| *s > 0.0)
                .unwrap_or(d.font_size),
            font_weight: font_weight(props).unwrap_or(d.font_weight),
            color: prop_color(props, &["color", "fill"]).unwrap_or(d.color),
            align: prop_string(props, &["textAlign", "text_align", "align"])
                .and_then(|s| TextAlign::parse(&s))
                .unwrap_or(d.align),
            line_height: prop_f32(props, &["lineHeight", "line_height"])
                .filter(|l| *l > 0.0)
                .unwrap_or(d.line_height),
        }
    }

    fn to_props(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("content".into(), self.content.clone().into());
        m.insert("fontFamily".into(), self.font_family.clone().into());
        m.insert("fontSize".into(), self.font_size.into());
        m.insert("fontWeight".into(), self.font_weight.into());
        m.insert("color".into(), self.color.to_hex().into());
        m.insert("textAlign".into(), self.align.as_str().into());
        m.insert("lineHeight".into(), self.line_height.into());
        m
    }
}

impl ImageProps {
    fn from_props(props: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            src: prop_string(props, &["src", "url"]).unwrap_or(d.src),
            opacity: prop_f32(props, &["opacity"])
                .map(|o| o.clamp(0.0, 100.0))
                .unwrap_or(d.opacity),
        }
    }

    fn to_props(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("src".into(), self.src.clone().into());
        m.insert("opacity".into(), self.opacity.into());
        m
    }
}

impl ShapeProps {
    fn from_props(props: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            shape: prop_string(props, &["shapeType", "shape_type", "shape"])
                .map(|s| ShapeType::parse(&s))
                .unwrap_or(d.shape),
            fill_color: prop_color(props, &["fillColor", "fill_color"]).unwrap_or(d.fill_color),
            fill_opacity: prop_f32(props, &["fillOpacity", "fill_opacity"])
                .map(|o| o.clamp(0.0, 100.0))
                .unwrap_or(d.fill_opacity),
            border_color: prop_color(props, &["borderColor", "border_color"]).unwrap_or(d.border_color),
            border_width: prop_f32(props, &["borderWidth", "border_width"])
                .map(|w| w.max(0.0))
                .unwrap_or(d.border_width),
        }
    }

    fn to_props(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("shapeType".into(), self.shape.as_str().into());
        m.insert("fillColor".into(), self.fill_color.to_hex().into());
        m.insert("fillOpacity".into(), self.fill_opacity.into());
        m.insert("borderColor".into(), self.border_color.to_hex().into());
        m.insert("borderWidth".into(), self.border_width.into());
        m
    }
}

impl BarcodeProps {
    fn from_props(props: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            value: prop_string(props, &["value", "data"]).unwrap_or(d.value),
            format: prop_string(props, &["format", "symbology"])
                .map(|s| Symbology::parse_or_default(&s))
                .unwrap_or(d.format),
            display_value: prop_bool(props, &["displayValue", "display_value", "showText"])
                .unwrap_or(d.display_value),
            font_size: prop_f32(props, &["fontSize", "font_size"])
                .filter(|s| *s > 0.0)
                .unwrap_or(d.font_size),
        }
    }

    fn to_props(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("value".into(), self.value.clone().into());
        m.insert("format".into(), self.format.as_str().into());
        m.insert("displayValue".into(), self.display_value.into());
        m.insert("fontSize".into(), self.font_size.into());
        m
    }
}

impl TryFrom<RawElement> for Element {
    type Error = String;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let props = &raw.properties;
        let kind = match raw.kind.trim().to_ascii_lowercase().as_str() {
            "text" => ElementKind::Text(TextProps::from_props(props)),
            "image" => ElementKind::Image(ImageProps::from_props(props)),
            "shape" => ElementKind::Shape(ShapeProps::from_props(props)),
            "barcode" => ElementKind::Barcode(BarcodeProps::from_props(props)),
            other => return Err(format!("unknown element type '{}'", other)),
        };
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        Ok(Element {
            id: raw.id,
            x: finite(raw.x),
            y: finite(raw.y),
            width: finite(raw.width).max(0.0),
            height: finite(raw.height).max(0.0),
            kind,
        })
    }
}

impl From<Element> for RawElement {
    fn from(el: Element) -> Self {
        let properties = match &el.kind {
            ElementKind::Text(t) => t.to_props(),
            ElementKind::Image(i) => i.to_props(),
            ElementKind::Shape(s) => s.to_props(),
            ElementKind::Barcode(b) => b.to_props(),
        };
        RawElement {
            kind: el.kind.tag().to_string(),
            id: el.id,
            x: el.x,
            y: el.y,
            width: el.width,
            height: el.height,
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Element {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_defaults() {
        let el = parse(r#"{"type": "text", "x": 1, "y": 2, "width": 50, "height": 20}"#);
        let ElementKind::Text(t) = &el.kind else {
            panic!("expected text");
        };
        assert_eq!(t.font_family, "Inter");
        assert_eq!(t.font_size, 16.0);
        assert_eq!(t.font_weight, 400);
        assert_eq!(t.color, Color::BLACK);
        assert_eq!(t.align, TextAlign::Left);
    }

    #[test]
    fn test_text_properties_and_aliases() {
        let el = parse(
            r##"{"type": "text", "properties": {
                "content": "A\nB", "fontSize": "24px", "font_weight": "bold",
                "color": "#ff0000", "textAlign": "center", "lineHeight": 1.5
            }}"##,
        );
        let ElementKind::Text(t) = &el.kind else {
            panic!("expected text");
        };
        assert_eq!(t.content, "A\nB");
        assert_eq!(t.font_size, 24.0);
        assert!(t.is_bold());
        assert_eq!(t.color, Color::rgb(255, 0, 0));
        assert_eq!(t.align, TextAlign::Center);
        assert_eq!(t.line_advance(), 36.0);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let el = parse(
            r##"{"type": "text", "properties": {"fontSize": "huge", "color": "#nothex", "lineHeight": -1}}"##,
        );
        let ElementKind::Text(t) = &el.kind else {
            panic!("expected text");
        };
        assert_eq!(t.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(t.color, Color::BLACK);
        assert_eq!(t.line_height, DEFAULT_LINE_HEIGHT);
    }

    #[test]
    fn test_negative_size_clamped() {
        let el = parse(r#"{"type": "shape", "width": -10, "height": 5}"#);
        assert_eq!(el.width, 0.0);
        assert_eq!(el.height, 5.0);
    }

    #[test]
    fn test_opacity_clamped() {
        let el = parse(r#"{"type": "image", "properties": {"src": "a.png", "opacity": 250}}"#);
        let ElementKind::Image(i) = &el.kind else {
            panic!("expected image");
        };
        assert_eq!(i.opacity, 100.0);

        let el = parse(r#"{"type": "shape", "properties": {"fillOpacity": -20}}"#);
        let ElementKind::Shape(s) = &el.kind else {
            panic!("expected shape");
        };
        assert_eq!(s.fill_opacity, 0.0);
    }

    #[test]
    fn test_unknown_shape_type_is_rectangle() {
        let el = parse(r#"{"type": "shape", "properties": {"shapeType": "hexagon"}}"#);
        let ElementKind::Shape(s) = &el.kind else {
            panic!("expected shape");
        };
        assert_eq!(s.shape, ShapeType::Rectangle);
    }

    #[test]
    fn test_barcode_defaults_and_format() {
        let el = parse(r#"{"type": "barcode", "properties": {"value": 12345}}"#);
        let ElementKind::Barcode(b) = &el.kind else {
            panic!("expected barcode");
        };
        assert_eq!(b.value, "12345");
        assert_eq!(b.format, Symbology::Code128);
        assert!(b.display_value);

        let el = parse(r#"{"type": "barcode", "properties": {"format": "ean-13", "displayValue": "false"}}"#);
        let ElementKind::Barcode(b) = &el.kind else {
            panic!("expected barcode");
        };
        assert_eq!(b.format, Symbology::Ean13);
        assert!(!b.display_value);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = serde_json::from_str::<Element>(r#"{"type": "video"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let el = Element::shape(
            5.0,
            6.0,
            7.0,
            8.0,
            ShapeProps {
                shape: ShapeType::Circle,
                fill_opacity: 40.0,
                ..Default::default()
            },
        )
        .with_id("dot");
        let json = serde_json::to_string(&el).unwrap();
        assert!(json.contains(r#""type":"shape""#));
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn test_scaled_does_not_round() {
        let el = Element::text(10.0, 20.0, 30.0, 40.0, "hi");
        let s = el.scaled(300.0 / 203.0);
        assert!((s.x - 14.778325).abs() < 1e-4);
        let ElementKind::Text(t) = &s.kind else {
            panic!("expected text");
        };
        assert!((t.font_size - 23.645).abs() < 1e-2);
        // template untouched
        assert_eq!(el.x, 10.0);
    }
}
