//! Style/value conversion from raw style maps into typed host attributes.

use serde::Serialize;
use serde_json::{Map, Value};

/// A length along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum Dimension {
    Points(f64),
    Percent(f64),
    Fill,
    Auto,
}

impl Dimension {
    /// Numbers are points; strings may be `"50%"`, `"12px"`, `"fill"`, or `"auto"`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::Points),
            Value::String(raw) => {
                let raw = raw.trim();
                match raw {
                    "fill" | "full" | "infinity" | "100%" => Some(Self::Fill),
                    "auto" => Some(Self::Auto),
                    _ => {
                        if let Some(pct) = raw.strip_suffix('%') {
                            pct.trim().parse().ok().map(Self::Percent)
                        } else {
                            raw.strip_suffix("px")
                                .unwrap_or(raw)
                                .trim()
                                .parse()
                                .ok()
                                .map(Self::Points)
                        }
                    }
                }
            }
            _ => None,
        }
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, or a few named colors.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "white" => return Some(Self::rgba(255, 255, 255, 255)),
            "black" => return Some(Self::rgba(0, 0, 0, 255)),
            "clear" | "transparent" => return Some(Self::rgba(0, 0, 0, 0)),
            _ => {}
        }
        let hex = raw.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::rgba(out[0], out[1], out[2], 255))
            }
            6 | 8 => {
                let r = channel(&hex[0..2])?;
                let g = channel(&hex[2..4])?;
                let b = channel(&hex[4..6])?;
                let a = if hex.len() == 8 {
                    channel(&hex[6..8])?
                } else {
                    255
                };
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }
}

/// Per-edge spacing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgeInsets {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// A number applies to every edge; an object may set `horizontal`,
    /// `vertical`, then individual edges, later keys overriding earlier ones.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::uniform),
            Value::Object(map) => {
                let get = |key: &str| map.get(key).and_then(Value::as_f64);
                let mut insets = Self::default();
                if let Some(h) = get("horizontal") {
                    insets.left = h;
                    insets.right = h;
                }
                if let Some(v) = get("vertical") {
                    insets.top = v;
                    insets.bottom = v;
                }
                insets.top = get("top").unwrap_or(insets.top);
                insets.right = get("right").unwrap_or(insets.right);
                insets.bottom = get("bottom").unwrap_or(insets.bottom);
                insets.left = get("left").unwrap_or(insets.left);
                Some(insets)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Leading,
    Center,
    Trailing,
    Top,
    Bottom,
}

impl Alignment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "leading" | "left" | "start" => Some(Self::Leading),
            "center" | "middle" => Some(Self::Center),
            "trailing" | "right" | "end" => Some(Self::Trailing),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Typed view of an element's style map. Unrecognized or malformed
/// attributes are left out.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<EdgeInsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<EdgeInsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

impl ResolvedStyle {
    pub fn from_map(style: &Map<String, Value>) -> Self {
        let number = |keys: &[&str]| keys.iter().find_map(|k| style.get(*k)?.as_f64());
        let color = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| style.get(*k)?.as_str().and_then(Color::parse))
        };

        Self {
            width: style.get("width").and_then(Dimension::from_value),
            height: style.get("height").and_then(Dimension::from_value),
            padding: style.get("padding").and_then(EdgeInsets::from_value),
            margin: style.get("margin").and_then(EdgeInsets::from_value),
            spacing: number(&["spacing", "gap"]),
            background_color: color(&["backgroundColor", "background"]),
            color: color(&["color", "foregroundColor"]),
            border_color: color(&["borderColor"]),
            border_width: number(&["borderWidth"]),
            corner_radius: number(&["cornerRadius", "borderRadius"]),
            opacity: number(&["opacity"]).map(|o| o.clamp(0.0, 1.0)),
            font_size: number(&["fontSize"]),
            font_weight: style.get("fontWeight").and_then(font_weight),
            alignment: style
                .get("alignment")
                .or_else(|| style.get("textAlign"))
                .and_then(Value::as_str)
                .and_then(Alignment::parse),
        }
    }
}

fn font_weight(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|w| u16::try_from(w).ok()),
        Value::String(s) => match s.as_str() {
            "thin" => Some(100),
            "light" => Some(300),
            "regular" | "normal" => Some(400),
            "medium" => Some(500),
            "semibold" => Some(600),
            "bold" => Some(700),
            "heavy" | "black" => Some(900),
            other => other.parse().ok(),
        },
        _ => None,
    }
}
