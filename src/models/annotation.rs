// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the marks a user draws on top of a photo: brush
//! strokes, rectangles, circles, arrows and text labels. All coordinates are
//! image-natural pixels; display mapping happens only at the edges.

use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 2D point in image-natural pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Return this point shifted by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Stable identifier of an annotation, unique within one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Straight (non-premultiplied) RGBA colour.
///
/// Serialized as `#rrggbb` when opaque and `#rrggbbaa` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const RED: Self = Self([255, 59, 48, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }

    pub fn a(self) -> u8 {
        self.0[3]
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or one of a few colour names.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let named = match value.to_ascii_lowercase().as_str() {
            "red" => Some(Self::rgb(255, 0, 0)),
            "green" => Some(Self::rgb(0, 128, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            "yellow" => Some(Self::rgb(255, 255, 0)),
            "orange" => Some(Self::rgb(255, 165, 0)),
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            _ => None,
        };
        if named.is_some() {
            return named;
        }

        let hex = value.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8, 0, 0, 255];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Self(out))
            }
            6 => Some(Self([channel(0)?, channel(2)?, channel(4)?, 255])),
            8 => Some(Self([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::RED
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RgbaVisitor;

        impl<'de> Visitor<'de> for RgbaVisitor {
            type Value = Rgba;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a colour as #rrggbb, #rrggbbaa or a basic colour name")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Rgba::parse(value).ok_or_else(|| E::custom(format!("invalid colour '{value}'")))
            }
        }

        deserializer.deserialize_str(RgbaVisitor)
    }
}

/// Annotation kind without payload, used for tool selection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Brush,
    Rectangle,
    Circle,
    Arrow,
    Text,
}

/// A single user-drawn mark.
///
/// Rectangle extents may be transiently negative while a drag is in
/// progress; [`Annotation::normalized`] restores the non-negative form that
/// is persisted and hit-tested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Annotation {
    Brush {
        id: AnnotationId,
        points: Vec<Point>,
        color: Rgba,
        stroke_radius: f32,
    },
    Rectangle {
        id: AnnotationId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
    Circle {
        id: AnnotationId,
        cx: f32,
        cy: f32,
        radius: f32,
        color: Rgba,
    },
    Arrow {
        id: AnnotationId,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgba,
    },
    Text {
        id: AnnotationId,
        x: f32,
        y: f32,
        text: String,
        color: Rgba,
        font_size: f32,
    },
}

impl Annotation {
    pub fn id(&self) -> &AnnotationId {
        match self {
            Annotation::Brush { id, .. }
            | Annotation::Rectangle { id, .. }
            | Annotation::Circle { id, .. }
            | Annotation::Arrow { id, .. }
            | Annotation::Text { id, .. } => id,
        }
    }

    pub fn set_id(&mut self, new_id: AnnotationId) {
        match self {
            Annotation::Brush { id, .. }
            | Annotation::Rectangle { id, .. }
            | Annotation::Circle { id, .. }
            | Annotation::Arrow { id, .. }
            | Annotation::Text { id, .. } => *id = new_id,
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            Annotation::Brush { color, .. }
            | Annotation::Rectangle { color, .. }
            | Annotation::Circle { color, .. }
            | Annotation::Arrow { color, .. }
            | Annotation::Text { color, .. } => *color,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Brush { .. } => AnnotationKind::Brush,
            Annotation::Rectangle { .. } => AnnotationKind::Rectangle,
            Annotation::Circle { .. } => AnnotationKind::Circle,
            Annotation::Arrow { .. } => AnnotationKind::Arrow,
            Annotation::Text { .. } => AnnotationKind::Text,
        }
    }

    /// Shift every coordinate-bearing field by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Annotation::Brush { points, .. } => {
                for point in points.iter_mut() {
                    *point = point.offset(dx, dy);
                }
            }
            Annotation::Rectangle { x, y, .. } | Annotation::Text { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Annotation::Circle { cx, cy, .. } => {
                *cx += dx;
                *cy += dy;
            }
            Annotation::Arrow { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *y1 += dy;
                *x2 += dx;
                *y2 += dy;
            }
        }
    }

    /// Return a copy with non-negative rectangle extents and radii.
    pub fn normalized(mut self) -> Self {
        match &mut self {
            Annotation::Rectangle {
                x, y, width, height, ..
            } => {
                if *width < 0.0 {
                    *x += *width;
                    *width = -*width;
                }
                if *height < 0.0 {
                    *y += *height;
                    *height = -*height;
                }
            }
            Annotation::Circle { radius, .. } => *radius = radius.abs(),
            Annotation::Brush { stroke_radius, .. } => *stroke_radius = stroke_radius.abs(),
            Annotation::Text { font_size, .. } => *font_size = font_size.abs(),
            Annotation::Arrow { .. } => {}
        }
        self
    }

    /// True when every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Annotation::Brush {
                points,
                stroke_radius,
                ..
            } => stroke_radius.is_finite() && points.iter().all(|p| p.is_finite()),
            Annotation::Rectangle {
                x, y, width, height, ..
            } => [*x, *y, *width, *height].iter().all(|v| v.is_finite()),
            Annotation::Circle { cx, cy, radius, .. } => {
                [*cx, *cy, *radius].iter().all(|v| v.is_finite())
            }
            Annotation::Arrow { x1, y1, x2, y2, .. } => {
                [*x1, *y1, *x2, *y2].iter().all(|v| v.is_finite())
            }
            Annotation::Text {
                x, y, font_size, ..
            } => [*x, *y, *font_size].iter().all(|v| v.is_finite()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_serializes_tagged_camel_case() {
        let rect = Annotation::Rectangle {
            id: "r1".into(),
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 30.0,
            color: Rgba::rgb(255, 0, 0),
        };
        let json = serde_json::to_value(&rect).unwrap();
        assert_eq!(json["type"], "rectangle");
        assert_eq!(json["id"], "r1");
        assert_eq!(json["color"], "#ff0000");

        let brush = Annotation::Brush {
            id: "b1".into(),
            points: vec![Point::new(1.0, 2.0)],
            color: Rgba::BLACK,
            stroke_radius: 3.0,
        };
        let json = serde_json::to_value(&brush).unwrap();
        assert_eq!(json["strokeRadius"], 3.0);
    }

    #[test]
    fn test_rgba_parse_variants() {
        assert_eq!(Rgba::parse("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse("#00ff0080"), Some(Rgba([0, 255, 0, 128])));
        assert_eq!(Rgba::parse("Red"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(Rgba::parse("#zzzzzz"), None);
        assert_eq!(Rgba::parse("rgb(1,2,3)"), None);
        assert_eq!(Rgba([0, 255, 0, 128]).to_hex(), "#00ff0080");
    }

    #[test]
    fn test_normalized_flips_negative_extents() {
        let rect = Annotation::Rectangle {
            id: "r".into(),
            x: 60.0,
            y: 40.0,
            width: -50.0,
            height: -30.0,
            color: Rgba::RED,
        }
        .normalized();
        match rect {
            Annotation::Rectangle {
                x, y, width, height, ..
            } => {
                assert_eq!((x, y, width, height), (10.0, 10.0, 50.0, 30.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_translate_moves_both_arrow_endpoints() {
        let mut arrow = Annotation::Arrow {
            id: "a".into(),
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 5.0,
            color: Rgba::RED,
        };
        arrow.translate(3.0, -1.0);
        assert_eq!(
            arrow,
            Annotation::Arrow {
                id: "a".into(),
                x1: 3.0,
                y1: -1.0,
                x2: 13.0,
                y2: 4.0,
                color: Rgba::RED,
            }
        );
    }
}
