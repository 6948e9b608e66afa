// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Resolution-independent sizing.
//!
//! Stroke widths, handle sizes, dash patterns, fonts and hit-test radii are
//! expressed in reference units and multiplied by the image's scale factor,
//! so a 4000px photo and an 800px photo get equivalent tool sizes. Stored
//! geometry is never scaled.

/// Default width, in image pixels, that one reference unit is defined against.
pub const DEFAULT_REFERENCE_WIDTH: f32 = 1000.0;

/// Sizes in reference units.
pub mod units {
    pub const STROKE_WIDTH: f32 = 4.0;
    pub const SELECTION_STROKE: f32 = 2.0;
    pub const HANDLE_RADIUS: f32 = 7.0;
    pub const HIT_TOLERANCE: f32 = 12.0;
    pub const SELECT_MARGIN: f32 = 5.0;
    pub const BRUSH_SEGMENT: f32 = 3.0;
    pub const DASH: [f32; 2] = [8.0, 6.0];
    pub const ARROW_HEAD: f32 = 18.0;
    pub const LABEL_FONT: f32 = 26.0;
    pub const LABEL_PADDING: f32 = 6.0;
    pub const LABEL_RADIUS: f32 = 6.0;
    pub const GUIDE_STROKE: f32 = 2.5;
}

/// Multiplier from reference units to image pixels for one loaded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    factor: f32,
}

impl ScaleContext {
    /// `image_natural_width / reference_width`; non-positive or non-finite
    /// input falls back to a factor of 1.
    pub fn compute(image_natural_width: u32, reference_width: f32) -> Self {
        let factor = image_natural_width as f32 / reference_width;
        if factor.is_finite() && factor > 0.0 {
            Self { factor }
        } else {
            Self::identity()
        }
    }

    pub const fn identity() -> Self {
        Self { factor: 1.0 }
    }

    /// Build a context with an explicit factor.
    pub fn with_factor(factor: f32) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self { factor }
        } else {
            Self::identity()
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Convert reference units to image pixels.
    pub fn px(&self, reference_units: f32) -> f32 {
        reference_units * self.factor
    }

    pub fn stroke_width(&self) -> f32 {
        self.px(units::STROKE_WIDTH)
    }

    pub fn handle_radius(&self) -> f32 {
        self.px(units::HANDLE_RADIUS)
    }

    pub fn hit_tolerance(&self) -> f32 {
        self.px(units::HIT_TOLERANCE)
    }

    pub fn select_margin(&self) -> f32 {
        self.px(units::SELECT_MARGIN)
    }

    pub fn brush_segment(&self) -> f32 {
        self.px(units::BRUSH_SEGMENT)
    }

    pub fn dash(&self) -> [f32; 2] {
        [self.px(units::DASH[0]), self.px(units::DASH[1])]
    }
}

impl Default for ScaleContext {
    fn default() -> Self {
        Self::identity()
    }
}
