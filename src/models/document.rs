// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Saved document shapes exchanged with the host.
//!
//! The canvas emits two independent documents on save: the annotation array
//! and the window framing with its measurements.

use super::annotation::{Annotation, Point};
use super::measurement::{MeasureKey, WindowBounds, WizardMeasurements};
use serde::{Deserialize, Serialize};

/// Annotation document: `{ "annotations": [...] }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AnnotationDocument {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }
}

/// A projected cross-line as stored alongside the measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub key: MeasureKey,
    pub start: Point,
    pub end: Point,
}

/// Window framing document: quadrilateral, values and the projected lines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_bounds: Option<WindowBounds>,
    #[serde(default)]
    pub measurements: WizardMeasurements,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub width_lines: Vec<LineRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub height_lines: Vec<LineRecord>,
}

impl MeasurementDocument {
    pub fn is_empty(&self) -> bool {
        self.window_bounds.is_none() && self.measurements == WizardMeasurements::default()
    }
}
