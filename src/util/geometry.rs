// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Point interpolation, per-annotation bounding boxes, polygon containment
//! and the mapping between display coordinates and image-natural pixels.
//! Nothing here fails: degenerate input yields degenerate but well-defined
//! output.

use crate::models::annotation::{Annotation, Point};
use crate::render::text::TextMetrics;

/// Width of one character relative to the font size when no glyph metrics
/// are available.
pub const FALLBACK_CHAR_WIDTH: f32 = 0.6;

/// Axis-aligned rectangle with non-negative extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing both points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self::new(min_x, min_y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Smallest rectangle containing all points; zero-size at the origin for
    /// an empty slice.
    pub fn enclosing(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }
}

/// Linear interpolation from `p1` (t = 0) to `p2` (t = 1).
pub fn lerp(p1: Point, p2: Point, t: f32) -> Point {
    Point::new(p1.x + (p2.x - p1.x) * t, p1.y + (p2.y - p1.y) * t)
}

pub fn midpoint(p1: Point, p2: Point) -> Point {
    lerp(p1, p2, 0.5)
}

/// Width and height of a text run, from glyph metrics when the backend can
/// measure it, otherwise estimated from the character count.
pub fn text_extent(text: &str, font_size: f32, metrics: &dyn TextMetrics) -> (f32, f32) {
    metrics.measure(text, font_size).unwrap_or_else(|| {
        (
            text.chars().count() as f32 * font_size * FALLBACK_CHAR_WIDTH,
            font_size,
        )
    })
}

/// Axis-aligned bounding box of an annotation.
///
/// Rectangles are normalized, circles span `2r`, text is anchored at its
/// top-left corner and brush strokes cover their path points.
pub fn bounding_box(annotation: &Annotation, metrics: &dyn TextMetrics) -> Rect {
    match annotation {
        Annotation::Brush { points, .. } => Rect::enclosing(points),
        Annotation::Rectangle {
            x, y, width, height, ..
        } => Rect::from_corners(Point::new(*x, *y), Point::new(x + width, y + height)),
        Annotation::Circle { cx, cy, radius, .. } => {
            let r = radius.abs();
            Rect::new(cx - r, cy - r, r * 2.0, r * 2.0)
        }
        Annotation::Arrow { x1, y1, x2, y2, .. } => {
            Rect::from_corners(Point::new(*x1, *y1), Point::new(*x2, *y2))
        }
        Annotation::Text {
            x,
            y,
            text,
            font_size,
            ..
        } => {
            let (width, height) = text_extent(text, *font_size, metrics);
            Rect::new(*x, *y, width, height)
        }
    }
}

/// Even-odd ray cast containment test over a closed polygon.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// The two wing tips of an arrow head at `end`, or `None` for an arrow too
/// short to have a direction.
pub fn arrow_head(start: Point, end: Point, head_size: f32) -> Option<(Point, Point)> {
    const HEAD_ANGLE: f32 = 0.523_598_8; // 30 degrees

    let length = start.distance(end);
    if length <= f32::EPSILON {
        return None;
    }
    let back_angle = (start.y - end.y).atan2(start.x - end.x);
    let wing = |angle: f32| {
        Point::new(
            end.x + head_size * angle.cos(),
            end.y + head_size * angle.sin(),
        )
    };
    Some((wing(back_angle + HEAD_ANGLE), wing(back_angle - HEAD_ANGLE)))
}

/// Convert a display position into image-natural coordinates, given the
/// top-left of the displayed image and its display-pixels-per-image-pixel
/// ratio.
pub fn display_to_image(display_x: f32, display_y: f32, origin: Point, display_scale: f32) -> Point {
    let scale = if display_scale > 0.0 { display_scale } else { 1.0 };
    Point::new((display_x - origin.x) / scale, (display_y - origin.y) / scale)
}
