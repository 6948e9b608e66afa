// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer-driven interaction state machine.
//!
//! Consumes pointer down/move/up/leave and drives one of
//! `Idle | Drawing | Moving | Resizing`. Intermediate frames preview into the
//! annotation store; the gesture's final state is committed on release.
//! The window frame goes through the same handle machinery but lives outside
//! the undo history.

use super::handles::{annotation_at, handles_for, hit_test, window_hit, HandleName};
use super::store::AnnotationStore;
use crate::models::annotation::{Annotation, AnnotationId, AnnotationKind, Point, Rgba};
use crate::models::document::AnnotationDocument;
use crate::models::measurement::{Corner, WindowBounds};
use crate::render::text::TextMetrics;
use crate::util::geometry::{bounding_box, lerp, text_extent, Rect};
use crate::util::scale::ScaleContext;

/// Fraction of each image edge left outside the default window frame.
pub const DEFAULT_FRAME_INSET: f32 = 0.15;

/// Smallest font size (reference units) a text resize can shrink to.
const MIN_FONT_SIZE: f32 = 6.0;

/// Current tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Brush,
    Rectangle,
    Circle,
    Arrow,
    Text,
    /// Edit the window frame quadrilateral.
    Measure,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Select,
        Tool::Brush,
        Tool::Rectangle,
        Tool::Circle,
        Tool::Arrow,
        Tool::Text,
        Tool::Measure,
    ];

    /// The annotation kind this tool draws, if any.
    pub fn draws(self) -> Option<AnnotationKind> {
        match self {
            Tool::Brush => Some(AnnotationKind::Brush),
            Tool::Rectangle => Some(AnnotationKind::Rectangle),
            Tool::Circle => Some(AnnotationKind::Circle),
            Tool::Arrow => Some(AnnotationKind::Arrow),
            Tool::Text => Some(AnnotationKind::Text),
            Tool::Select | Tool::Measure => None,
        }
    }
}

/// How corner drags reshape the window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// The frame stays an axis-aligned rectangle.
    #[default]
    SimpleRect,
    /// Each corner moves independently to follow perspective.
    AdjustFraming,
}

/// Input device class of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// A pointer event in image-natural coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn mouse(x: f32, y: f32) -> Self {
        Self {
            position: Point::new(x, y),
            kind: PointerKind::Mouse,
        }
    }

    pub fn touch(x: f32, y: f32) -> Self {
        Self {
            position: Point::new(x, y),
            kind: PointerKind::Touch,
        }
    }
}

/// Observable state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Drawing,
    Moving,
    Resizing,
}

/// Defaults applied to newly drawn annotations. Sizes are reference units.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub color: Rgba,
    pub brush_radius: f32,
    pub font_size: f32,
    /// Text placed by the next press with the text tool.
    pub pending_text: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Rgba::RED,
            brush_radius: 3.0,
            font_size: 28.0,
            pending_text: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct DrawGesture {
    id: AnnotationId,
    kind: AnnotationKind,
    start: Point,
    current: Point,
    /// Freehand path, only used by the brush.
    live_path: Vec<Point>,
    color: Rgba,
    /// Brush radius in image pixels.
    radius: f32,
}

#[derive(Debug, Clone)]
enum EditTarget {
    Annotation(Annotation),
    Window(WindowBounds),
}

#[derive(Debug, Clone)]
struct EditGesture {
    /// Snapshot taken on pointer-down; every frame is derived from it.
    original: EditTarget,
    handle: HandleName,
    start: Point,
    current: Point,
    pointer: PointerKind,
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Drawing(DrawGesture),
    Moving(EditGesture),
    Resizing(EditGesture),
}

/// Read-only view of the freehand stroke being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStroke<'a> {
    pub points: &'a [Point],
    pub color: Rgba,
    pub radius: f32,
}

/// Owns the annotation store, the selection and the window frame, and
/// mutates them only through pointer transitions and editing commands.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    store: AnnotationStore,
    selection: Option<AnnotationId>,
    window: Option<WindowBounds>,
    framing_mode: FramingMode,
    tool: Tool,
    settings: ToolSettings,
    gesture: Gesture,
}

impl Interaction {
    pub fn new(history_limit: usize, settings: ToolSettings) -> Self {
        Self {
            store: AnnotationStore::new(history_limit),
            settings,
            ..Self::default()
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn selection(&self) -> Option<&Annotation> {
        self.selection.as_ref().and_then(|id| self.store.get(id))
    }

    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selection = id.filter(|id| self.store.get(id).is_some());
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, finishing any gesture in flight.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool == tool {
            return;
        }
        self.finish_gesture();
        if tool != Tool::Select {
            self.selection = None;
        }
        self.tool = tool;
        log::debug!("Tool changed to {:?}", tool);
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn window(&self) -> Option<&WindowBounds> {
        self.window.as_ref()
    }

    pub fn set_window(&mut self, bounds: Option<WindowBounds>) {
        self.window = bounds.filter(WindowBounds::is_finite);
    }

    /// Place a frame inset from the image edges if none exists yet.
    pub fn ensure_window(&mut self, image_size: (u32, u32)) {
        if self.window.is_some() {
            return;
        }
        let (w, h) = (image_size.0 as f32, image_size.1 as f32);
        self.window = Some(WindowBounds::from_rect(
            w * DEFAULT_FRAME_INSET,
            h * DEFAULT_FRAME_INSET,
            w * (1.0 - 2.0 * DEFAULT_FRAME_INSET),
            h * (1.0 - 2.0 * DEFAULT_FRAME_INSET),
        ));
        log::info!("Placed default window frame");
    }

    pub fn framing_mode(&self) -> FramingMode {
        self.framing_mode
    }

    pub fn set_framing_mode(&mut self, mode: FramingMode) {
        self.framing_mode = mode;
    }

    pub fn state(&self) -> InteractionState {
        match self.gesture {
            Gesture::Idle => InteractionState::Idle,
            Gesture::Drawing(_) => InteractionState::Drawing,
            Gesture::Moving(_) => InteractionState::Moving,
            Gesture::Resizing(_) => InteractionState::Resizing,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    /// The handle being dragged and the pointer driving it.
    pub fn active_handle(&self) -> Option<(HandleName, PointerKind, Point)> {
        match &self.gesture {
            Gesture::Moving(edit) | Gesture::Resizing(edit) => {
                Some((edit.handle, edit.pointer, edit.current))
            }
            Gesture::Idle | Gesture::Drawing(_) => None,
        }
    }

    pub fn live_stroke(&self) -> Option<LiveStroke<'_>> {
        match &self.gesture {
            Gesture::Drawing(draw) if draw.kind == AnnotationKind::Brush => Some(LiveStroke {
                points: &draw.live_path,
                color: draw.color,
                radius: draw.radius,
            }),
            _ => None,
        }
    }

    // ----- pointer transitions -----

    pub fn pointer_down(&mut self, event: PointerEvent, scale: ScaleContext, metrics: &dyn TextMetrics) {
        if !self.is_idle() {
            self.finish_gesture();
        }
        let p = event.position;

        match self.tool {
            Tool::Select => self.begin_select(event, scale, metrics),
            Tool::Measure => {
                let Some(bounds) = self.window else {
                    return;
                };
                let Some(handle) = window_hit(p, &bounds, scale.hit_tolerance()) else {
                    return;
                };
                let edit = EditGesture {
                    original: EditTarget::Window(bounds),
                    handle,
                    start: p,
                    current: p,
                    pointer: event.kind,
                };
                self.gesture = if handle == HandleName::Move {
                    Gesture::Moving(edit)
                } else {
                    Gesture::Resizing(edit)
                };
                log::debug!("Window frame grabbed by {:?}", handle);
            }
            Tool::Brush | Tool::Rectangle | Tool::Circle | Tool::Arrow | Tool::Text => {
                self.begin_draw(event, scale)
            }
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent, scale: ScaleContext, metrics: &dyn TextMetrics) {
        let p = event.position;
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Drawing(draw) => {
                draw.current = p;
                if draw.kind == AnnotationKind::Brush {
                    extend_stroke(&mut draw.live_path, p, scale.brush_segment());
                    return;
                }
                let draw = draw.clone();
                if let Some(shape) = self.shape_for(&draw) {
                    self.preview_replace(shape);
                }
            }
            Gesture::Moving(edit) => {
                edit.current = p;
                let (dx, dy) = (p.x - edit.start.x, p.y - edit.start.y);
                match edit.original.clone() {
                    EditTarget::Annotation(mut annotation) => {
                        annotation.translate(dx, dy);
                        self.preview_replace(annotation);
                    }
                    EditTarget::Window(mut bounds) => {
                        bounds.translate(dx, dy);
                        self.window = Some(bounds);
                    }
                }
            }
            Gesture::Resizing(edit) => {
                edit.current = p;
                let handle = edit.handle;
                match edit.original.clone() {
                    EditTarget::Annotation(annotation) => {
                        let resized = resize_annotation(&annotation, handle, p, scale, metrics);
                        self.preview_replace(resized);
                    }
                    EditTarget::Window(bounds) => {
                        self.window = Some(resize_window(&bounds, handle, p, self.framing_mode));
                    }
                }
            }
        }
    }

    pub fn pointer_up(&mut self, event: PointerEvent, scale: ScaleContext, metrics: &dyn TextMetrics) {
        if self.is_idle() {
            return;
        }
        self.pointer_move(event, scale, metrics);
        self.finish_gesture();
    }

    /// Leaving the surface mid-gesture commits what exists, like a release.
    pub fn pointer_leave(&mut self) {
        if !self.is_idle() {
            log::debug!("Pointer left during {:?}, committing", self.state());
            self.finish_gesture();
        }
    }

    // ----- editing commands -----

    pub fn delete_selected(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        let Some(id) = self.selection.take() else {
            return false;
        };
        let remaining: Vec<Annotation> = self
            .store
            .annotations()
            .iter()
            .filter(|a| a.id() != &id)
            .cloned()
            .collect();
        if remaining.len() == self.store.len() {
            return false;
        }
        self.store.commit(remaining);
        true
    }

    pub fn clear_all(&mut self) -> bool {
        if !self.is_idle() || self.store.is_empty() {
            return false;
        }
        self.selection = None;
        self.store.commit(Vec::new());
        true
    }

    pub fn undo(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        let changed = self.store.undo();
        self.prune_selection();
        changed
    }

    pub fn redo(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        let changed = self.store.redo();
        self.prune_selection();
        changed
    }

    /// Replace all annotations from a document; history restarts here.
    pub fn restore(&mut self, document: AnnotationDocument) {
        self.gesture = Gesture::Idle;
        self.selection = None;
        self.store.restore(document);
    }

    // ----- internals -----

    fn begin_select(&mut self, event: PointerEvent, scale: ScaleContext, metrics: &dyn TextMetrics) {
        let p = event.position;
        let tolerance = scale.hit_tolerance();

        if let Some(selected) = self.selection().cloned() {
            let handles = handles_for(&selected, metrics);
            if let Some(handle) = hit_test(p, &handles, tolerance) {
                let edit = EditGesture {
                    original: EditTarget::Annotation(selected),
                    handle,
                    start: p,
                    current: p,
                    pointer: event.kind,
                };
                self.gesture = if handle == HandleName::Move {
                    Gesture::Moving(edit)
                } else {
                    Gesture::Resizing(edit)
                };
                log::debug!("Grabbed handle {:?}", handle);
                return;
            }
        }

        match annotation_at(p, self.store.annotations(), scale.select_margin(), metrics).cloned() {
            Some(hit) => {
                self.selection = Some(hit.id().clone());
                log::debug!("Selected annotation {}", hit.id());
                self.gesture = Gesture::Moving(EditGesture {
                    original: EditTarget::Annotation(hit),
                    handle: HandleName::Move,
                    start: p,
                    current: p,
                    pointer: event.kind,
                });
            }
            None => {
                if self.selection.take().is_some() {
                    log::debug!("Deselected annotation");
                }
            }
        }
    }

    fn begin_draw(&mut self, event: PointerEvent, scale: ScaleContext) {
        let Some(kind) = self.tool.draws() else {
            return;
        };
        if kind == AnnotationKind::Text && self.settings.pending_text.trim().is_empty() {
            log::debug!("Text tool pressed with no pending text");
            return;
        }

        self.selection = None;
        let p = event.position;
        let is_brush = kind == AnnotationKind::Brush;
        let draw = DrawGesture {
            id: AnnotationId::generate(),
            kind,
            start: p,
            current: p,
            live_path: if is_brush { vec![p] } else { Vec::new() },
            color: self.settings.color,
            radius: scale.px(self.settings.brush_radius),
        };
        if let Some(shape) = self.seed_shape(&draw, scale) {
            let mut collection = self.store.annotations().to_vec();
            collection.push(shape);
            self.store.preview_mutate(collection);
        }
        log::debug!("Drawing {:?}", kind);
        self.gesture = Gesture::Drawing(draw);
    }

    /// Zero-size shape at the press point.
    fn seed_shape(&self, draw: &DrawGesture, scale: ScaleContext) -> Option<Annotation> {
        let (id, color, p) = (draw.id.clone(), draw.color, draw.start);
        match draw.kind {
            AnnotationKind::Brush => None,
            AnnotationKind::Rectangle => Some(Annotation::Rectangle {
                id,
                x: p.x,
                y: p.y,
                width: 0.0,
                height: 0.0,
                color,
            }),
            AnnotationKind::Circle => Some(Annotation::Circle {
                id,
                cx: p.x,
                cy: p.y,
                radius: 0.0,
                color,
            }),
            AnnotationKind::Arrow => Some(Annotation::Arrow {
                id,
                x1: p.x,
                y1: p.y,
                x2: p.x,
                y2: p.y,
                color,
            }),
            AnnotationKind::Text => Some(Annotation::Text {
                id,
                x: p.x,
                y: p.y,
                text: self.settings.pending_text.clone(),
                color,
                font_size: scale.px(self.settings.font_size),
            }),
        }
    }

    /// The drawn shape recomputed from the fixed start and current point.
    fn shape_for(&self, draw: &DrawGesture) -> Option<Annotation> {
        let mut shape = self.store.get(&draw.id)?.clone();
        let (s, c) = (draw.start, draw.current);
        match &mut shape {
            Annotation::Rectangle { width, height, .. } => {
                *width = c.x - s.x;
                *height = c.y - s.y;
            }
            Annotation::Circle { radius, .. } => *radius = s.distance(c),
            Annotation::Arrow { x2, y2, .. } => {
                *x2 = c.x;
                *y2 = c.y;
            }
            Annotation::Text { .. } | Annotation::Brush { .. } => {}
        }
        Some(shape)
    }

    fn preview_replace(&mut self, updated: Annotation) {
        let collection = self
            .store
            .annotations()
            .iter()
            .map(|a| if a.id() == updated.id() { updated.clone() } else { a.clone() })
            .collect();
        self.store.preview_mutate(collection);
    }

    /// Commit the gesture in flight and return to idle.
    fn finish_gesture(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Drawing(draw) => {
                let mut collection = self.store.annotations().to_vec();
                if draw.kind == AnnotationKind::Brush {
                    collection.push(Annotation::Brush {
                        id: draw.id,
                        points: draw.live_path,
                        color: draw.color,
                        stroke_radius: draw.radius,
                    });
                } else {
                    collection = collection.into_iter().map(Annotation::normalized).collect();
                }
                self.store.commit(collection);
            }
            Gesture::Moving(edit) | Gesture::Resizing(edit) => match edit.original {
                EditTarget::Annotation(_) => {
                    let collection = self
                        .store
                        .annotations()
                        .iter()
                        .cloned()
                        .map(Annotation::normalized)
                        .collect();
                    self.store.preview_mutate(collection);
                    self.store.commit_if_changed();
                }
                EditTarget::Window(_) => log::debug!("Window frame updated"),
            },
        }
    }

    fn prune_selection(&mut self) {
        if let Some(id) = &self.selection {
            if self.store.get(id).is_none() {
                self.selection = None;
            }
        }
    }
}

/// Append `p` to a freehand path, inserting evenly spaced points when the
/// jump from the last point exceeds `segment`.
fn extend_stroke(path: &mut Vec<Point>, p: Point, segment: f32) {
    let Some(&last) = path.last() else {
        path.push(p);
        return;
    };
    let distance = last.distance(p);
    if distance <= f32::EPSILON {
        return;
    }
    if segment > 0.0 && distance > segment {
        let steps = (distance / segment).ceil() as usize;
        for i in 1..steps {
            path.push(lerp(last, p, i as f32 / steps as f32));
        }
    }
    path.push(p);
}

/// Apply a handle drag to the pre-gesture annotation.
fn resize_annotation(
    original: &Annotation,
    handle: HandleName,
    p: Point,
    scale: ScaleContext,
    metrics: &dyn TextMetrics,
) -> Annotation {
    let mut updated = original.clone();
    match &mut updated {
        Annotation::Rectangle {
            x, y, width, height, ..
        } => {
            if let Some(fixed) = opposite_corner(&bounding_box(original, metrics), handle) {
                let rect = Rect::from_corners(p, fixed);
                *x = rect.x;
                *y = rect.y;
                *width = rect.width;
                *height = rect.height;
            }
        }
        Annotation::Text {
            x,
            y,
            text,
            font_size,
            ..
        } => {
            let bbox = bounding_box(original, metrics);
            if let Some(fixed) = opposite_corner(&bbox, handle) {
                if bbox.height > f32::EPSILON {
                    let ratio = (p.y - fixed.y).abs() / bbox.height;
                    *font_size = (*font_size * ratio).max(scale.px(MIN_FONT_SIZE));
                    let (w, h) = text_extent(text, *font_size, metrics);
                    let left = matches!(handle, HandleName::TopLeft | HandleName::BottomLeft);
                    let top = matches!(handle, HandleName::TopLeft | HandleName::TopRight);
                    *x = if left { fixed.x - w } else { fixed.x };
                    *y = if top { fixed.y - h } else { fixed.y };
                }
            }
        }
        Annotation::Circle { cx, cy, radius, .. } => {
            if matches!(
                handle,
                HandleName::North | HandleName::South | HandleName::East | HandleName::West
            ) {
                *radius = Point::new(*cx, *cy).distance(p);
            }
        }
        Annotation::Arrow { x1, y1, x2, y2, .. } => match handle {
            HandleName::Start => {
                *x1 = p.x;
                *y1 = p.y;
            }
            HandleName::End => {
                *x2 = p.x;
                *y2 = p.y;
            }
            _ => {}
        },
        Annotation::Brush { .. } => {}
    }
    updated
}

fn opposite_corner(bbox: &Rect, handle: HandleName) -> Option<Point> {
    match handle {
        HandleName::TopLeft => Some(Point::new(bbox.right(), bbox.bottom())),
        HandleName::TopRight => Some(Point::new(bbox.x, bbox.bottom())),
        HandleName::BottomLeft => Some(Point::new(bbox.right(), bbox.y)),
        HandleName::BottomRight => Some(Point::new(bbox.x, bbox.y)),
        _ => None,
    }
}

/// Apply a corner drag to the pre-gesture frame.
fn resize_window(original: &WindowBounds, handle: HandleName, p: Point, mode: FramingMode) -> WindowBounds {
    let Some(corner) = handle.corner() else {
        return *original;
    };
    match mode {
        FramingMode::AdjustFraming => {
            let mut bounds = *original;
            *bounds.corner_mut(corner) = p;
            bounds
        }
        FramingMode::SimpleRect => {
            let fixed = original.corner(match corner {
                Corner::TopLeft => Corner::BottomRight,
                Corner::TopRight => Corner::BottomLeft,
                Corner::BottomLeft => Corner::TopRight,
                Corner::BottomRight => Corner::TopLeft,
            });
            let rect = Rect::from_corners(p, fixed);
            WindowBounds::from_rect(rect.x, rect.y, rect.width, rect.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::EstimatedMetrics;

    const M: EstimatedMetrics = EstimatedMetrics;

    fn scale() -> ScaleContext {
        ScaleContext::identity()
    }

    fn drag(ix: &mut Interaction, from: (f32, f32), to: (f32, f32)) {
        ix.pointer_down(PointerEvent::mouse(from.0, from.1), scale(), &M);
        ix.pointer_move(PointerEvent::mouse(to.0, to.1), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(to.0, to.1), scale(), &M);
    }

    fn draw_rect(ix: &mut Interaction, from: (f32, f32), to: (f32, f32)) {
        ix.set_tool(Tool::Rectangle);
        drag(ix, from, to);
    }

    fn only_rect(ix: &Interaction) -> (f32, f32, f32, f32) {
        match ix.annotations() {
            [Annotation::Rectangle {
                x, y, width, height, ..
            }] => (*x, *y, *width, *height),
            other => panic!("expected a single rectangle, got {other:?}"),
        }
    }

    #[test]
    fn test_draw_rectangle_then_undo_redo() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (10.0, 10.0), (60.0, 40.0));
        assert_eq!(ix.state(), InteractionState::Idle);
        assert_eq!(only_rect(&ix), (10.0, 10.0, 50.0, 30.0));
        let drawn = ix.annotations().to_vec();

        assert!(ix.undo());
        assert!(ix.annotations().is_empty());
        assert!(ix.redo());
        assert_eq!(ix.annotations(), drawn.as_slice());
    }

    #[test]
    fn test_long_session_undoes_back_to_empty() {
        let mut ix = Interaction::default();
        for i in 0..250 {
            let offset = (i % 50) as f32;
            draw_rect(&mut ix, (offset, offset), (offset + 20.0, offset + 10.0));
        }
        assert_eq!(ix.annotations().len(), 250);
        for _ in 0..251 {
            ix.undo();
        }
        assert!(ix.annotations().is_empty());
    }

    #[test]
    fn test_backwards_rectangle_is_normalized_on_commit() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (60.0, 40.0), (10.0, 10.0));
        assert_eq!(only_rect(&ix), (10.0, 10.0, 50.0, 30.0));
    }

    #[test]
    fn test_drawing_previews_without_history() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Circle);
        ix.pointer_down(PointerEvent::mouse(50.0, 50.0), scale(), &M);
        for r in 1..10 {
            ix.pointer_move(PointerEvent::mouse(50.0 + r as f32, 50.0), scale(), &M);
        }
        assert_eq!(ix.state(), InteractionState::Drawing);
        assert!(!ix.store().can_undo());
        ix.pointer_up(PointerEvent::mouse(60.0, 50.0), scale(), &M);
        match ix.annotations() {
            [Annotation::Circle { radius, .. }] => assert_eq!(*radius, 10.0),
            other => panic!("unexpected {other:?}"),
        }
        assert!(ix.undo());
        assert!(!ix.store().can_undo());
    }

    #[test]
    fn test_brush_interpolates_long_jumps() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Brush);
        ix.pointer_down(PointerEvent::mouse(0.0, 0.0), scale(), &M);
        ix.pointer_move(PointerEvent::mouse(30.0, 0.0), scale(), &M);
        let live = ix.live_stroke().unwrap();
        assert_eq!(live.points.len(), 11);
        assert!(live
            .points
            .windows(2)
            .all(|w| w[0].distance(w[1]) <= scale().brush_segment() + 1e-4));
        ix.pointer_up(PointerEvent::mouse(30.0, 0.0), scale(), &M);
        assert!(ix.live_stroke().is_none());
        match ix.annotations() {
            [Annotation::Brush { points, .. }] => {
                assert_eq!(points.first(), Some(&Point::new(0.0, 0.0)));
                assert_eq!(points.last(), Some(&Point::new(30.0, 0.0)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_brush_click_commits_dot() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Brush);
        ix.pointer_down(PointerEvent::mouse(5.0, 5.0), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(5.0, 5.0), scale(), &M);
        match ix.annotations() {
            [Annotation::Brush { points, .. }] => assert_eq!(points, &vec![Point::new(5.0, 5.0)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_text_tool_needs_pending_text() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Text);
        ix.pointer_down(PointerEvent::mouse(5.0, 5.0), scale(), &M);
        assert_eq!(ix.state(), InteractionState::Idle);
        assert!(ix.annotations().is_empty());

        ix.settings_mut().pending_text = "W1".into();
        ix.pointer_down(PointerEvent::mouse(5.0, 5.0), scale(), &M);
        ix.pointer_move(PointerEvent::mouse(80.0, 80.0), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(80.0, 80.0), scale(), &M);
        match ix.annotations() {
            [Annotation::Text { x, y, text, .. }] => {
                assert_eq!((*x, *y), (5.0, 5.0));
                assert_eq!(text, "W1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_select_and_move_rectangle() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (10.0, 10.0), (60.0, 40.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (20.0, 20.0), (30.0, 25.0));
        assert!(ix.selection().is_some());
        assert_eq!(only_rect(&ix), (20.0, 15.0, 50.0, 30.0));
        assert!(ix.undo());
        assert_eq!(only_rect(&ix), (10.0, 10.0, 50.0, 30.0));
    }

    #[test]
    fn test_click_without_motion_adds_no_history() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (10.0, 10.0), (60.0, 40.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (20.0, 20.0), (20.0, 20.0));
        assert!(ix.selection().is_some());
        assert!(ix.undo());
        assert!(ix.annotations().is_empty());
    }

    #[test]
    fn test_click_on_empty_space_deselects() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (10.0, 10.0), (60.0, 40.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (20.0, 20.0), (20.0, 20.0));
        assert!(ix.selection().is_some());
        drag(&mut ix, (500.0, 500.0), (500.0, 500.0));
        assert!(ix.selection().is_none());
        assert_eq!(ix.state(), InteractionState::Idle);
    }

    #[test]
    fn test_resize_corner_keeps_opposite_fixed() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (100.0, 100.0), (200.0, 160.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (150.0, 130.0), (150.0, 130.0));
        ix.pointer_down(PointerEvent::mouse(100.0, 100.0), scale(), &M);
        assert_eq!(ix.state(), InteractionState::Resizing);
        ix.pointer_move(PointerEvent::mouse(80.0, 90.0), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(80.0, 90.0), scale(), &M);
        assert_eq!(only_rect(&ix), (80.0, 90.0, 120.0, 70.0));
    }

    #[test]
    fn test_handles_take_priority_over_shapes_underneath() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (100.0, 100.0), (200.0, 200.0));
        draw_rect(&mut ix, (0.0, 0.0), (105.0, 105.0));
        ix.set_tool(Tool::Select);
        // Select the bottom rectangle through a point only it covers.
        drag(&mut ix, (190.0, 190.0), (190.0, 190.0));
        let bottom_id = ix.annotations()[0].id().clone();
        assert_eq!(ix.selection().map(|a| a.id().clone()), Some(bottom_id));
        // Its top-left handle sits under the other rectangle.
        ix.pointer_down(PointerEvent::mouse(100.0, 100.0), scale(), &M);
        assert_eq!(ix.state(), InteractionState::Resizing);
        ix.pointer_leave();
    }

    #[test]
    fn test_circle_and_arrow_handles() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Circle);
        drag(&mut ix, (100.0, 100.0), (130.0, 100.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (100.0, 100.0), (100.0, 100.0));
        drag(&mut ix, (130.0, 100.0), (150.0, 100.0));
        match ix.annotations() {
            [Annotation::Circle { radius, cx, .. }] => {
                assert_eq!(*radius, 50.0);
                assert_eq!(*cx, 100.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut ix = Interaction::default();
        ix.set_tool(Tool::Arrow);
        drag(&mut ix, (0.0, 0.0), (100.0, 100.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (50.0, 50.0), (50.0, 50.0));
        drag(&mut ix, (100.0, 100.0), (120.0, 90.0));
        match ix.annotations() {
            [Annotation::Arrow { x1, y1, x2, y2, .. }] => {
                assert_eq!((*x1, *y1, *x2, *y2), (0.0, 0.0, 120.0, 90.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    fn selected_text(ix: &mut Interaction, font_size: f32) {
        ix.restore(AnnotationDocument::new(vec![Annotation::Text {
            id: "t".into(),
            x: 100.0,
            y: 100.0,
            text: "abcd".into(),
            color: Rgba::RED,
            font_size,
        }]));
        ix.set_tool(Tool::Select);
        // Estimated extent is 4 chars * 0.6 wide and one font size tall.
        drag(ix, (110.0, 110.0), (110.0, 110.0));
        assert!(ix.selection().is_some());
    }

    fn only_text(ix: &Interaction) -> (f32, f32, f32) {
        match ix.annotations() {
            [Annotation::Text { x, y, font_size, .. }] => (*x, *y, *font_size),
            other => panic!("expected a single text, got {other:?}"),
        }
    }

    #[test]
    fn test_resize_text_scales_font() {
        let mut ix = Interaction::default();
        selected_text(&mut ix, 40.0);
        // Box is (100, 100) to (196, 140); drag the bottom-right corner down.
        ix.pointer_down(PointerEvent::mouse(196.0, 140.0), scale(), &M);
        assert_eq!(ix.state(), InteractionState::Resizing);
        ix.pointer_move(PointerEvent::mouse(196.0, 180.0), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(196.0, 180.0), scale(), &M);
        assert_eq!(only_text(&ix), (100.0, 100.0, 80.0));

        assert!(ix.undo());
        assert_eq!(only_text(&ix), (100.0, 100.0, 40.0));
    }

    #[test]
    fn test_resize_text_from_top_left_keeps_bottom_right() {
        let mut ix = Interaction::default();
        selected_text(&mut ix, 40.0);
        ix.pointer_down(PointerEvent::mouse(100.0, 100.0), scale(), &M);
        ix.pointer_move(PointerEvent::mouse(150.0, 120.0), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(150.0, 120.0), scale(), &M);
        let (x, y, font_size) = only_text(&ix);
        assert_eq!(font_size, 20.0);
        assert!((x + 4.0 * 20.0 * 0.6 - 196.0).abs() < 1e-3);
        assert!((y + 20.0 - 140.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_text_clamps_font_to_minimum() {
        let mut ix = Interaction::default();
        selected_text(&mut ix, 40.0);
        ix.pointer_down(PointerEvent::mouse(196.0, 140.0), scale(), &M);
        ix.pointer_move(PointerEvent::mouse(196.0, 101.0), scale(), &M);
        ix.pointer_up(PointerEvent::mouse(196.0, 101.0), scale(), &M);
        assert_eq!(only_text(&ix).2, MIN_FONT_SIZE);

        // The minimum is in reference units, so it grows with the image.
        let mut ix = Interaction::default();
        selected_text(&mut ix, 40.0);
        let large = ScaleContext::compute(2000, 1000.0);
        ix.pointer_down(PointerEvent::mouse(196.0, 140.0), large, &M);
        ix.pointer_move(PointerEvent::mouse(196.0, 101.0), large, &M);
        ix.pointer_up(PointerEvent::mouse(196.0, 101.0), large, &M);
        assert!((only_text(&ix).2 - MIN_FONT_SIZE * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_leave_commits_like_release() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Rectangle);
        ix.pointer_down(PointerEvent::mouse(0.0, 0.0), scale(), &M);
        ix.pointer_move(PointerEvent::mouse(40.0, 20.0), scale(), &M);
        ix.pointer_leave();
        assert_eq!(ix.state(), InteractionState::Idle);
        assert_eq!(only_rect(&ix), (0.0, 0.0, 40.0, 20.0));
        assert!(ix.store().can_undo());
    }

    #[test]
    fn test_delete_and_clear_are_undoable() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (0.0, 0.0), (40.0, 20.0));
        draw_rect(&mut ix, (100.0, 100.0), (140.0, 120.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (120.0, 110.0), (120.0, 110.0));
        assert!(ix.delete_selected());
        assert_eq!(ix.annotations().len(), 1);
        assert!(ix.clear_all());
        assert!(ix.annotations().is_empty());
        assert!(!ix.clear_all());
        assert!(ix.undo());
        assert!(ix.undo());
        assert_eq!(ix.annotations().len(), 2);
    }

    #[test]
    fn test_undo_drops_stale_selection() {
        let mut ix = Interaction::default();
        draw_rect(&mut ix, (0.0, 0.0), (40.0, 20.0));
        ix.set_tool(Tool::Select);
        drag(&mut ix, (10.0, 10.0), (10.0, 10.0));
        assert!(ix.selection().is_some());
        ix.undo();
        assert!(ix.selection().is_none());
    }

    #[test]
    fn test_window_frame_is_outside_history() {
        let mut ix = Interaction::default();
        ix.set_window(Some(WindowBounds::from_rect(0.0, 0.0, 200.0, 100.0)));
        ix.set_tool(Tool::Measure);
        drag(&mut ix, (100.0, 50.0), (110.0, 60.0));
        assert_eq!(ix.window().unwrap().tl, Point::new(10.0, 10.0));
        assert!(!ix.store().can_undo());
        assert!(!ix.undo());
        assert_eq!(ix.window().unwrap().tl, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_simple_rect_mode_keeps_frame_rectangular() {
        let mut ix = Interaction::default();
        ix.set_window(Some(WindowBounds::from_rect(0.0, 0.0, 200.0, 100.0)));
        ix.set_tool(Tool::Measure);
        drag(&mut ix, (200.0, 0.0), (250.0, -20.0));
        let b = *ix.window().unwrap();
        assert_eq!(b, WindowBounds::from_rect(0.0, -20.0, 250.0, 120.0));
    }

    #[test]
    fn test_adjust_framing_moves_single_corner() {
        let mut ix = Interaction::default();
        ix.set_window(Some(WindowBounds::from_rect(0.0, 0.0, 200.0, 100.0)));
        ix.set_framing_mode(FramingMode::AdjustFraming);
        ix.set_tool(Tool::Measure);
        ix.pointer_down(PointerEvent::touch(200.0, 0.0), scale(), &M);
        ix.pointer_move(PointerEvent::touch(210.0, 15.0), scale(), &M);
        let (handle, kind, _) = ix.active_handle().unwrap();
        assert_eq!(handle, HandleName::TopRight);
        assert_eq!(kind, PointerKind::Touch);
        ix.pointer_up(PointerEvent::touch(210.0, 15.0), scale(), &M);
        let b = *ix.window().unwrap();
        assert_eq!(b.tr, Point::new(210.0, 15.0));
        assert_eq!(b.tl, Point::new(0.0, 0.0));
        assert_eq!(b.br, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_ensure_window_insets_frame() {
        let mut ix = Interaction::default();
        ix.ensure_window((1000, 800));
        let b = *ix.window().unwrap();
        assert!(b.tl.distance(Point::new(150.0, 120.0)) < 1e-3);
        assert!(b.br.distance(Point::new(850.0, 680.0)) < 1e-3);
    }

    #[test]
    fn test_restore_resets_gesture_and_selection() {
        let mut ix = Interaction::default();
        ix.set_tool(Tool::Rectangle);
        ix.pointer_down(PointerEvent::mouse(0.0, 0.0), scale(), &M);
        ix.restore(AnnotationDocument::default());
        assert_eq!(ix.state(), InteractionState::Idle);
        assert!(ix.annotations().is_empty());
        assert!(!ix.store().can_undo());
    }
}
