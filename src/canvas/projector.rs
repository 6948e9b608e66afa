// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Perspective measurement projector.
//!
//! Interpolates three width cross-lines (T, M, B) between the left and right
//! edges of the window frame and three height cross-lines (L, C, R) between
//! its top and bottom edges, then places a value label on every measured
//! line. Height labels share one y coordinate, halfway between the M and B
//! width lines, so they read as a single row on a skewed frame.

use crate::models::annotation::Point;
use crate::models::document::LineRecord;
use crate::models::measurement::{MeasureKey, WindowBounds, WizardMeasurements};
use crate::util::geometry::{lerp, midpoint};

/// Interpolation positions of the three lines in each direction.
pub const CROSS_LINE_POSITIONS: [f32; 3] = [0.15, 0.5, 0.85];

/// One projected cross-line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossLine {
    pub key: MeasureKey,
    pub start: Point,
    pub end: Point,
    /// Measured value; `None` when 0 ("not measured").
    pub value: Option<f64>,
}

impl CrossLine {
    pub fn midpoint(&self) -> Point {
        midpoint(self.start, self.end)
    }

    pub fn record(&self) -> LineRecord {
        LineRecord {
            key: self.key,
            start: self.start,
            end: self.end,
        }
    }
}

/// A value label anchored on the image.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementLabel {
    pub key: MeasureKey,
    /// Centre of the label box.
    pub anchor: Point,
    pub text: String,
}

/// All six lines plus labels for the measured ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedOverlay {
    pub width_lines: [CrossLine; 3],
    pub height_lines: [CrossLine; 3],
    pub labels: Vec<MeasurementLabel>,
}

impl ProjectedOverlay {
    pub fn lines(&self) -> impl Iterator<Item = &CrossLine> {
        self.width_lines.iter().chain(self.height_lines.iter())
    }

    pub fn line(&self, key: MeasureKey) -> &CrossLine {
        let index = match key {
            MeasureKey::T | MeasureKey::L => 0,
            MeasureKey::M | MeasureKey::C => 1,
            MeasureKey::B | MeasureKey::R => 2,
        };
        if key.is_width() {
            &self.width_lines[index]
        } else {
            &self.height_lines[index]
        }
    }

    pub fn label(&self, key: MeasureKey) -> Option<&MeasurementLabel> {
        self.labels.iter().find(|label| label.key == key)
    }
}

/// Project the six cross-lines and their labels onto the frame.
pub fn project(bounds: &WindowBounds, measurements: &WizardMeasurements) -> ProjectedOverlay {
    let width_lines = [0, 1, 2].map(|i| {
        let t = CROSS_LINE_POSITIONS[i];
        let key = MeasureKey::WIDTHS[i];
        CrossLine {
            key,
            start: lerp(bounds.tl, bounds.bl, t),
            end: lerp(bounds.tr, bounds.br, t),
            value: measurements.measured(key),
        }
    });
    let height_lines = [0, 1, 2].map(|i| {
        let t = CROSS_LINE_POSITIONS[i];
        let key = MeasureKey::HEIGHTS[i];
        CrossLine {
            key,
            start: lerp(bounds.tl, bounds.tr, t),
            end: lerp(bounds.bl, bounds.br, t),
            value: measurements.measured(key),
        }
    });

    let height_row_y = (width_lines[1].midpoint().y + width_lines[2].midpoint().y) / 2.0;

    let mut labels = Vec::new();
    for line in &width_lines {
        if let Some(value) = line.value {
            labels.push(MeasurementLabel {
                key: line.key,
                anchor: line.midpoint(),
                text: format_measurement(value),
            });
        }
    }
    for line in &height_lines {
        if let Some(value) = line.value {
            labels.push(MeasurementLabel {
                key: line.key,
                anchor: Point::new(line.midpoint().x, height_row_y),
                text: format_measurement(value),
            });
        }
    }

    ProjectedOverlay {
        width_lines,
        height_lines,
        labels,
    }
}

/// Format an inch value with trailing zeros trimmed, e.g. `1.5"` or `48"`.
pub fn format_measurement(value: f64) -> String {
    let fixed = format!("{value:.3}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}\"")
}

/// Rebuild the frame from saved T and B width lines by extrapolating their
/// endpoints out to the frame edges.
pub fn bounds_from_lines(width_lines: &[LineRecord]) -> Option<WindowBounds> {
    let find = |key: MeasureKey| width_lines.iter().find(|line| line.key == key);
    let top = find(MeasureKey::T)?;
    let bottom = find(MeasureKey::B)?;

    let [t0, _, t1] = CROSS_LINE_POSITIONS;
    let span = t1 - t0;
    let at = |from: Point, to: Point, t: f32| lerp(from, to, (t - t0) / span);

    let bounds = WindowBounds {
        tl: at(top.start, bottom.start, 0.0),
        bl: at(top.start, bottom.start, 1.0),
        tr: at(top.end, bottom.end, 0.0),
        br: at(top.end, bottom.end, 1.0),
    };
    bounds.is_finite().then_some(bounds)
}
