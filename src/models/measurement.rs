// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Window framing quadrilateral and the six wizard measurements.

use super::annotation::Point;
use serde::{Deserialize, Serialize};

/// Four corners of the (possibly skewed) window frame in the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub tl: Point,
    pub tr: Point,
    pub bl: Point,
    pub br: Point,
}

/// One corner of a [`WindowBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

impl WindowBounds {
    /// Axis-aligned bounds covering `x..x+width`, `y..y+height`.
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            tl: Point::new(x, y),
            tr: Point::new(x + width, y),
            bl: Point::new(x, y + height),
            br: Point::new(x + width, y + height),
        }
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.tl,
            Corner::TopRight => self.tr,
            Corner::BottomLeft => self.bl,
            Corner::BottomRight => self.br,
        }
    }

    pub fn corner_mut(&mut self, corner: Corner) -> &mut Point {
        match corner {
            Corner::TopLeft => &mut self.tl,
            Corner::TopRight => &mut self.tr,
            Corner::BottomLeft => &mut self.bl,
            Corner::BottomRight => &mut self.br,
        }
    }

    /// Corners in perimeter order (tl, tr, br, bl), suitable for polygon tests.
    pub fn polygon(&self) -> [Point; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for corner in Corner::ALL {
            let p = self.corner_mut(corner);
            *p = p.offset(dx, dy);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.polygon().iter().all(|p| p.is_finite())
    }
}

/// Identifies one of the six cross-line measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureKey {
    /// Width across the top.
    T,
    /// Width across the middle.
    M,
    /// Width across the bottom.
    B,
    /// Height along the left.
    L,
    /// Height along the centre.
    C,
    /// Height along the right.
    R,
}

impl MeasureKey {
    pub const WIDTHS: [MeasureKey; 3] = [MeasureKey::T, MeasureKey::M, MeasureKey::B];
    pub const HEIGHTS: [MeasureKey; 3] = [MeasureKey::L, MeasureKey::C, MeasureKey::R];

    pub fn label(self) -> &'static str {
        match self {
            MeasureKey::T => "T",
            MeasureKey::M => "M",
            MeasureKey::B => "B",
            MeasureKey::L => "L",
            MeasureKey::C => "C",
            MeasureKey::R => "R",
        }
    }

    pub fn is_width(self) -> bool {
        matches!(self, MeasureKey::T | MeasureKey::M | MeasureKey::B)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WidthValues {
    #[serde(rename = "T")]
    pub t: f64,
    #[serde(rename = "M")]
    pub m: f64,
    #[serde(rename = "B")]
    pub b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightValues {
    #[serde(rename = "L")]
    pub l: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "R")]
    pub r: f64,
}

/// Six measured values; 0 means "not measured".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardMeasurements {
    pub widths: WidthValues,
    pub heights: HeightValues,
}

impl WizardMeasurements {
    pub fn get(&self, key: MeasureKey) -> f64 {
        match key {
            MeasureKey::T => self.widths.t,
            MeasureKey::M => self.widths.m,
            MeasureKey::B => self.widths.b,
            MeasureKey::L => self.heights.l,
            MeasureKey::C => self.heights.c,
            MeasureKey::R => self.heights.r,
        }
    }

    /// Set a value; negative or non-finite input is stored as 0.
    pub fn set(&mut self, key: MeasureKey, value: f64) {
        let value = sanitize(value);
        match key {
            MeasureKey::T => self.widths.t = value,
            MeasureKey::M => self.widths.m = value,
            MeasureKey::B => self.widths.b = value,
            MeasureKey::L => self.heights.l = value,
            MeasureKey::C => self.heights.c = value,
            MeasureKey::R => self.heights.r = value,
        }
    }

    /// The value for `key` if it has been measured.
    pub fn measured(&self, key: MeasureKey) -> Option<f64> {
        let value = self.get(key);
        (value > 0.0).then_some(value)
    }

    pub fn sanitized(mut self) -> Self {
        for key in MeasureKey::WIDTHS.into_iter().chain(MeasureKey::HEIGHTS) {
            let value = self.get(key);
            self.set(key, value);
        }
        self
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurements_serialize_with_letter_keys() {
        let mut m = WizardMeasurements::default();
        m.set(MeasureKey::M, 48.0);
        m.set(MeasureKey::C, 30.5);
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["widths"]["M"], 48.0);
        assert_eq!(json["heights"]["C"], 30.5);
        assert_eq!(json["widths"]["T"], 0.0);
    }

    #[test]
    fn test_missing_keys_default_to_zero() {
        let m: WizardMeasurements = serde_json::from_str(r#"{"widths":{"M":12}}"#).unwrap();
        assert_eq!(m.get(MeasureKey::M), 12.0);
        assert_eq!(m.measured(MeasureKey::T), None);
        assert_eq!(m.measured(MeasureKey::R), None);
    }

    #[test]
    fn test_set_rejects_negative_and_nan() {
        let mut m = WizardMeasurements::default();
        m.set(MeasureKey::T, -4.0);
        m.set(MeasureKey::B, f64::NAN);
        assert_eq!(m.get(MeasureKey::T), 0.0);
        assert_eq!(m.get(MeasureKey::B), 0.0);
    }

    #[test]
    fn test_translate_moves_every_corner() {
        let mut bounds = WindowBounds::from_rect(0.0, 0.0, 10.0, 20.0);
        bounds.translate(5.0, 5.0);
        assert_eq!(bounds.tl, Point::new(5.0, 5.0));
        assert_eq!(bounds.br, Point::new(15.0, 25.0));
    }
}
