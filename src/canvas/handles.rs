// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Control handles and hit-testing.
//!
//! Handles are listed corners first, then edges, then path endpoints, then
//! the move handle. Hit-testing returns the first match in that order.

use crate::models::annotation::{Annotation, Point};
use crate::models::measurement::{Corner, WindowBounds};
use crate::render::text::TextMetrics;
use crate::util::geometry::{bounding_box, point_in_polygon};

/// Named control point on a selected annotation or on the window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleName {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    North,
    South,
    East,
    West,
    Start,
    End,
    Move,
}

impl HandleName {
    /// The window-frame corner a corner handle controls.
    pub fn corner(self) -> Option<Corner> {
        match self {
            HandleName::TopLeft => Some(Corner::TopLeft),
            HandleName::TopRight => Some(Corner::TopRight),
            HandleName::BottomLeft => Some(Corner::BottomLeft),
            HandleName::BottomRight => Some(Corner::BottomRight),
            _ => None,
        }
    }

    pub fn from_corner(corner: Corner) -> Self {
        match corner {
            Corner::TopLeft => HandleName::TopLeft,
            Corner::TopRight => HandleName::TopRight,
            Corner::BottomLeft => HandleName::BottomLeft,
            Corner::BottomRight => HandleName::BottomRight,
        }
    }
}

/// Ordered handle list for one target.
pub type Handles = Vec<(HandleName, Point)>;

/// Handles of a selected annotation, including its move handle.
pub fn handles_for(annotation: &Annotation, metrics: &dyn TextMetrics) -> Handles {
    let bbox = bounding_box(annotation, metrics);
    let mut handles = match annotation {
        Annotation::Rectangle { .. } | Annotation::Text { .. } => vec![
            (HandleName::TopLeft, Point::new(bbox.x, bbox.y)),
            (HandleName::TopRight, Point::new(bbox.right(), bbox.y)),
            (HandleName::BottomLeft, Point::new(bbox.x, bbox.bottom())),
            (HandleName::BottomRight, Point::new(bbox.right(), bbox.bottom())),
        ],
        Annotation::Circle { cx, cy, radius, .. } => {
            let r = radius.abs();
            vec![
                (HandleName::North, Point::new(*cx, cy - r)),
                (HandleName::South, Point::new(*cx, cy + r)),
                (HandleName::East, Point::new(cx + r, *cy)),
                (HandleName::West, Point::new(cx - r, *cy)),
            ]
        }
        Annotation::Arrow { x1, y1, x2, y2, .. } => vec![
            (HandleName::Start, Point::new(*x1, *y1)),
            (HandleName::End, Point::new(*x2, *y2)),
        ],
        Annotation::Brush { .. } => Vec::new(),
    };
    handles.push((HandleName::Move, bbox.center()));
    handles
}

/// Corner handles of the window frame.
pub fn window_handles(bounds: &WindowBounds) -> Handles {
    Corner::ALL
        .iter()
        .map(|&corner| (HandleName::from_corner(corner), bounds.corner(corner)))
        .collect()
}

/// First handle within `tolerance` of `point`, in list order.
pub fn hit_test(point: Point, handles: &[(HandleName, Point)], tolerance: f32) -> Option<HandleName> {
    handles
        .iter()
        .find(|(_, handle)| handle.distance(point) <= tolerance)
        .map(|(name, _)| *name)
}

/// Topmost annotation whose bounding box, grown by `margin`, contains
/// `point`.
pub fn annotation_at<'a>(
    point: Point,
    collection: &'a [Annotation],
    margin: f32,
    metrics: &dyn TextMetrics,
) -> Option<&'a Annotation> {
    collection
        .iter()
        .rev()
        .find(|annotation| bounding_box(annotation, metrics).expand(margin).contains(point))
}

/// Whether `point` hits the window frame: a corner handle, or its interior.
pub fn window_hit(point: Point, bounds: &WindowBounds, tolerance: f32) -> Option<HandleName> {
    hit_test(point, &window_handles(bounds), tolerance).or_else(|| {
        point_in_polygon(point, &bounds.polygon()).then_some(HandleName::Move)
    })
}
