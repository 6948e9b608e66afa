// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Display list for one canvas frame.
//!
//! [`build`] is a pure function of the canvas state: the same input always
//! produces an equal [`Scene`]. All coordinates are image-natural pixels and
//! every size has already been multiplied by the scale factor.

use super::text::TextMetrics;
use crate::canvas::handles::{handles_for, window_handles, HandleName};
use crate::canvas::interaction::LiveStroke;
use crate::canvas::projector::{project, CrossLine};
use crate::models::annotation::{Annotation, Point, Rgba};
use crate::models::measurement::{WindowBounds, WizardMeasurements};
use crate::util::geometry::{arrow_head, bounding_box, text_extent};
use crate::util::scale::{units, ScaleContext};

pub const SELECTION_COLOR: Rgba = Rgba::rgb(0, 122, 255);
pub const HANDLE_FILL: Rgba = Rgba::WHITE;
pub const WINDOW_COLOR: Rgba = Rgba::rgb(255, 204, 0);
pub const WIDTH_LINE_COLOR: Rgba = Rgba::rgb(0, 180, 255);
pub const HEIGHT_LINE_COLOR: Rgba = Rgba::rgb(52, 199, 89);
pub const LABEL_BACKGROUND: Rgba = Rgba([0, 0, 0, 190]);

/// Stroke parameters for outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
    pub dash: Option<[f32; 2]>,
}

impl StrokeStyle {
    pub fn solid(color: Rgba, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Rgba, width: f32, dash: [f32; 2]) -> Self {
        Self {
            color,
            width,
            dash: Some(dash),
        }
    }
}

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Open or closed polyline with round caps and joins.
    Path {
        points: Vec<Point>,
        closed: bool,
        stroke: StrokeStyle,
    },
    /// Filled disc.
    Dot {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    /// Circle outline.
    Circle {
        center: Point,
        radius: f32,
        stroke: StrokeStyle,
    },
    /// Filled polygon.
    Polygon { points: Vec<Point>, fill: Rgba },
    /// Interactive control point.
    Handle {
        center: Point,
        radius: f32,
        fill: Rgba,
        outline: StrokeStyle,
    },
    /// Single line of text with its top-left corner at `origin`.
    Text {
        origin: Point,
        text: String,
        font_size: f32,
        color: Rgba,
    },
    /// Text on a rounded box centred at `anchor`.
    Label {
        anchor: Point,
        text: String,
        font_size: f32,
        /// Box size including padding.
        size: (f32, f32),
        padding: f32,
        corner_radius: f32,
        background: Rgba,
        color: Rgba,
    },
}

/// A complete frame over an image of `width` x `height`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

/// Everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub image_size: (u32, u32),
    pub scale: ScaleContext,
    pub annotations: &'a [Annotation],
    pub selection: Option<&'a Annotation>,
    pub live_stroke: Option<LiveStroke<'a>>,
    pub window: Option<&'a WindowBounds>,
    pub measurements: &'a WizardMeasurements,
    /// Draw the frame's corner handles (measure tool active).
    pub window_handles: bool,
}

/// Build the display list for one frame.
pub fn build(input: &SceneInput<'_>, metrics: &dyn TextMetrics) -> Scene {
    let mut commands = Vec::new();
    let scale = input.scale;

    for annotation in input.annotations {
        push_annotation(&mut commands, annotation, scale);
    }

    if let Some(stroke) = input.live_stroke {
        push_brush(&mut commands, stroke.points, stroke.color, stroke.radius);
    }

    if let Some(window) = input.window {
        push_window(&mut commands, window, input.measurements, scale, metrics);
        if input.window_handles {
            for (_, point) in window_handles(window) {
                commands.push(handle(point, scale, WINDOW_COLOR));
            }
        }
    }

    if let Some(selected) = input.selection {
        push_selection(&mut commands, selected, scale, metrics);
    }

    Scene {
        width: input.image_size.0,
        height: input.image_size.1,
        commands,
    }
}

fn push_brush(commands: &mut Vec<DrawCommand>, points: &[Point], color: Rgba, radius: f32) {
    match points {
        [] => {}
        [single] => commands.push(DrawCommand::Dot {
            center: *single,
            radius,
            color,
        }),
        _ => commands.push(DrawCommand::Path {
            points: points.to_vec(),
            closed: false,
            stroke: StrokeStyle::solid(color, radius * 2.0),
        }),
    }
}

fn push_annotation(commands: &mut Vec<DrawCommand>, annotation: &Annotation, scale: ScaleContext) {
    let width = scale.stroke_width();
    match annotation {
        Annotation::Brush {
            points,
            color,
            stroke_radius,
            ..
        } => push_brush(commands, points, *color, *stroke_radius),
        Annotation::Rectangle {
            x,
            y,
            width: w,
            height: h,
            color,
            ..
        } => commands.push(DrawCommand::Path {
            points: vec![
                Point::new(*x, *y),
                Point::new(x + w, *y),
                Point::new(x + w, y + h),
                Point::new(*x, y + h),
            ],
            closed: true,
            stroke: StrokeStyle::solid(*color, width),
        }),
        Annotation::Circle {
            cx,
            cy,
            radius,
            color,
            ..
        } => commands.push(DrawCommand::Circle {
            center: Point::new(*cx, *cy),
            radius: radius.abs(),
            stroke: StrokeStyle::solid(*color, width),
        }),
        Annotation::Arrow {
            x1,
            y1,
            x2,
            y2,
            color,
            ..
        } => {
            let (start, end) = (Point::new(*x1, *y1), Point::new(*x2, *y2));
            commands.push(DrawCommand::Path {
                points: vec![start, end],
                closed: false,
                stroke: StrokeStyle::solid(*color, width),
            });
            if let Some((a, b)) = arrow_head(start, end, scale.px(units::ARROW_HEAD)) {
                commands.push(DrawCommand::Polygon {
                    points: vec![end, a, b],
                    fill: *color,
                });
            }
        }
        Annotation::Text {
            x,
            y,
            text,
            color,
            font_size,
            ..
        } => commands.push(DrawCommand::Text {
            origin: Point::new(*x, *y),
            text: text.clone(),
            font_size: *font_size,
            color: *color,
        }),
    }
}

fn handle(center: Point, scale: ScaleContext, outline: Rgba) -> DrawCommand {
    DrawCommand::Handle {
        center,
        radius: scale.handle_radius(),
        fill: HANDLE_FILL,
        outline: StrokeStyle::solid(outline, scale.px(units::SELECTION_STROKE)),
    }
}

fn push_selection(
    commands: &mut Vec<DrawCommand>,
    selected: &Annotation,
    scale: ScaleContext,
    metrics: &dyn TextMetrics,
) {
    let bbox = bounding_box(selected, metrics).expand(scale.select_margin());
    commands.push(DrawCommand::Path {
        points: vec![
            Point::new(bbox.x, bbox.y),
            Point::new(bbox.right(), bbox.y),
            Point::new(bbox.right(), bbox.bottom()),
            Point::new(bbox.x, bbox.bottom()),
        ],
        closed: true,
        stroke: StrokeStyle::dashed(
            SELECTION_COLOR,
            scale.px(units::SELECTION_STROKE),
            scale.dash(),
        ),
    });
    for (name, point) in handles_for(selected, metrics) {
        if name == HandleName::Move {
            commands.push(DrawCommand::Dot {
                center: point,
                radius: scale.handle_radius() * 0.6,
                color: SELECTION_COLOR,
            });
        } else {
            commands.push(handle(point, scale, SELECTION_COLOR));
        }
    }
}

fn push_cross_line(commands: &mut Vec<DrawCommand>, line: &CrossLine, color: Rgba, scale: ScaleContext) {
    let width = scale.px(units::GUIDE_STROKE);
    let stroke = match line.value {
        Some(_) => StrokeStyle::solid(color, width),
        None => StrokeStyle::dashed(color.with_alpha(160), width, scale.dash()),
    };
    commands.push(DrawCommand::Path {
        points: vec![line.start, line.end],
        closed: false,
        stroke,
    });
}

fn push_window(
    commands: &mut Vec<DrawCommand>,
    window: &WindowBounds,
    measurements: &WizardMeasurements,
    scale: ScaleContext,
    metrics: &dyn TextMetrics,
) {
    commands.push(DrawCommand::Path {
        points: window.polygon().to_vec(),
        closed: true,
        stroke: StrokeStyle::solid(WINDOW_COLOR, scale.stroke_width()),
    });

    let overlay = project(window, measurements);
    for line in &overlay.width_lines {
        push_cross_line(commands, line, WIDTH_LINE_COLOR, scale);
    }
    for line in &overlay.height_lines {
        push_cross_line(commands, line, HEIGHT_LINE_COLOR, scale);
    }

    let font_size = scale.px(units::LABEL_FONT);
    let padding = scale.px(units::LABEL_PADDING);
    for label in &overlay.labels {
        let (w, h) = text_extent(&label.text, font_size, metrics);
        commands.push(DrawCommand::Label {
            anchor: label.anchor,
            text: label.text.clone(),
            font_size,
            size: (w + padding * 2.0, h + padding * 2.0),
            padding,
            corner_radius: scale.px(units::LABEL_RADIUS),
            background: LABEL_BACKGROUND,
            color: Rgba::WHITE,
        });
    }
}
