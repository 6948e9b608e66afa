// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Magnifying loupe for precise handle placement on touch input.
//!
//! The loupe samples the already-rendered primary buffer rather than
//! drawing the scene a second time, so its content is pixel-identical to
//! the canvas. Placement is pushed away from the dragged handle so the
//! finger does not cover it.

use super::handles::HandleName;
use crate::models::annotation::Point;
use crate::util::geometry::Rect;
use anyhow::{anyhow, Result};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pattern, Pixmap, SpreadMode, Stroke,
    Transform,
};

pub const DEFAULT_DIAMETER: f32 = 160.0;
pub const DEFAULT_ZOOM: f32 = 2.5;
pub const DEFAULT_GAP: f32 = 24.0;

const BORDER_WIDTH: f32 = 3.0;
const CROSSHAIR_HALF: f32 = 9.0;

/// Loupe size and magnification, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnifierSettings {
    pub diameter: f32,
    pub zoom: f32,
    /// Distance between the pointer and the loupe's edge.
    pub gap: f32,
}

impl Default for MagnifierSettings {
    fn default() -> Self {
        Self {
            diameter: DEFAULT_DIAMETER,
            zoom: DEFAULT_ZOOM,
            gap: DEFAULT_GAP,
        }
    }
}

/// Where the loupe samples from and where it is shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnifierView {
    /// Sample square in image pixels, always inside the image.
    pub source: Rect,
    /// Loupe centre in screen coordinates.
    pub center: Point,
    pub diameter: f32,
    /// Focus point in loupe-local pixels (centre unless the sample was
    /// clamped at an image edge).
    pub crosshair: Point,
}

impl MagnifierView {
    /// Screen rectangle covered by the loupe.
    pub fn screen_rect(&self) -> Rect {
        let r = self.diameter / 2.0;
        Rect::new(self.center.x - r, self.center.y - r, self.diameter, self.diameter)
    }

    /// Image-to-loupe pixel scale.
    pub fn sample_scale(&self) -> f32 {
        if self.source.width > 0.0 {
            self.diameter / self.source.width
        } else {
            1.0
        }
    }
}

/// Unit direction from the pointer towards the loupe for a dragged handle.
fn away_from(handle: HandleName) -> (f32, f32) {
    let (dx, dy): (f32, f32) = match handle {
        HandleName::TopLeft => (1.0, 1.0),
        HandleName::TopRight => (-1.0, 1.0),
        HandleName::BottomLeft => (1.0, -1.0),
        HandleName::BottomRight => (-1.0, -1.0),
        HandleName::North => (0.0, 1.0),
        HandleName::South => (0.0, -1.0),
        HandleName::East => (-1.0, 0.0),
        HandleName::West => (1.0, 0.0),
        HandleName::Start | HandleName::End | HandleName::Move => (1.0, -1.0),
    };
    let len = dx.hypot(dy);
    (dx / len, dy / len)
}

fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        (min + max) / 2.0
    } else {
        value.clamp(min, max)
    }
}

/// Place the loupe for a drag of `handle` at image point `focus`.
///
/// `pointer` is the raw screen position, `display_scale` the screen pixels
/// per image pixel and `container` the screen bounds the loupe must stay in.
pub fn place(
    focus: Point,
    pointer: Point,
    handle: HandleName,
    image_size: (u32, u32),
    display_scale: f32,
    container: Rect,
    settings: &MagnifierSettings,
) -> MagnifierView {
    let diameter = settings.diameter.max(1.0);
    let radius = diameter / 2.0;
    let (img_w, img_h) = (image_size.0 as f32, image_size.1 as f32);

    let magnification = (settings.zoom * display_scale).max(f32::EPSILON);
    let side = (diameter / magnification).min(img_w).min(img_h).max(1.0);
    let sx = clamp_axis(focus.x - side / 2.0, 0.0, img_w - side);
    let sy = clamp_axis(focus.y - side / 2.0, 0.0, img_h - side);
    let source = Rect::new(sx, sy, side, side);

    let (ux, uy) = away_from(handle);
    let distance = radius + settings.gap;
    let center = Point::new(
        clamp_axis(
            pointer.x + ux * distance,
            container.x + radius,
            container.right() - radius,
        ),
        clamp_axis(
            pointer.y + uy * distance,
            container.y + radius,
            container.bottom() - radius,
        ),
    );

    let scale = diameter / side;
    MagnifierView {
        source,
        center,
        diameter,
        crosshair: Point::new((focus.x - sx) * scale, (focus.y - sy) * scale),
    }
}

/// Render the loupe by sampling `primary`, the full-resolution canvas
/// buffer, into a new circular buffer.
pub fn render(primary: &Pixmap, view: &MagnifierView) -> Result<Pixmap> {
    let size = view.diameter.round().max(1.0) as u32;
    let mut loupe =
        Pixmap::new(size, size).ok_or_else(|| anyhow!("cannot allocate magnifier buffer"))?;
    let radius = size as f32 / 2.0;
    let circle = PathBuilder::from_circle(radius, radius, radius - BORDER_WIDTH / 2.0)
        .ok_or_else(|| anyhow!("invalid magnifier circle"))?;

    let mut backdrop = Paint::default();
    backdrop.set_color_rgba8(20, 20, 20, 255);
    backdrop.anti_alias = true;
    loupe.fill_path(&circle, &backdrop, FillRule::Winding, Transform::identity(), None);

    let scale = view.sample_scale();
    let sampler = Paint {
        shader: Pattern::new(
            primary.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            Transform::from_row(
                scale,
                0.0,
                0.0,
                scale,
                -view.source.x * scale,
                -view.source.y * scale,
            ),
        ),
        anti_alias: true,
        ..Paint::default()
    };
    loupe.fill_path(&circle, &sampler, FillRule::Winding, Transform::identity(), None);

    let mut pb = PathBuilder::new();
    let (cx, cy) = (view.crosshair.x, view.crosshair.y);
    pb.move_to(cx - CROSSHAIR_HALF, cy);
    pb.line_to(cx + CROSSHAIR_HALF, cy);
    pb.move_to(cx, cy - CROSSHAIR_HALF);
    pb.line_to(cx, cy + CROSSHAIR_HALF);
    if let Some(crosshair) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(255, 255, 255, 220));
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.5,
            ..Stroke::default()
        };
        loupe.stroke_path(&crosshair, &paint, &stroke, Transform::identity(), None);
    }

    let mut border = Paint::default();
    border.set_color_rgba8(255, 255, 255, 255);
    border.anti_alias = true;
    let stroke = Stroke {
        width: BORDER_WIDTH,
        ..Stroke::default()
    };
    loupe.stroke_path(&circle, &border, &stroke, Transform::identity(), None);

    Ok(loupe)
}
