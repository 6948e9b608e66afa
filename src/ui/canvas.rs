// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas area: fits the rendered photo into the panel and turns egui
//! pointer input into image-space canvas events.

use paneline::canvas::interaction::{PointerEvent, PointerKind};
use paneline::models::annotation::Point;
use paneline::util::geometry::{display_to_image, Rect};

/// Where the photo sits on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Screen rectangle of the displayed photo.
    pub image_rect: egui::Rect,
    /// Screen pixels per image pixel.
    pub display_scale: f32,
    /// Screen area available to the canvas (and the loupe).
    pub container: egui::Rect,
}

impl CanvasLayout {
    /// Fit an image of `image_size` inside `available`, centred.
    pub fn fit(available: egui::Rect, image_size: (u32, u32)) -> Self {
        let (img_width, img_height) = (image_size.0.max(1) as f32, image_size.1.max(1) as f32);
        let display_scale = (available.width() / img_width)
            .min(available.height() / img_height)
            .max(f32::EPSILON);

        let display_width = img_width * display_scale;
        let display_height = img_height * display_scale;

        // Center the image
        let x_offset = (available.width() - display_width) / 2.0;
        let y_offset = (available.height() - display_height) / 2.0;

        let image_rect = egui::Rect::from_min_size(
            available.min + egui::vec2(x_offset, y_offset),
            egui::vec2(display_width, display_height),
        );

        Self {
            image_rect,
            display_scale,
            container: available,
        }
    }

    pub fn to_image(&self, pos: egui::Pos2) -> Point {
        let origin = Point::new(self.image_rect.min.x, self.image_rect.min.y);
        display_to_image(pos.x, pos.y, origin, self.display_scale)
    }

    pub fn container_rect(&self) -> Rect {
        to_rect(self.container)
    }
}

pub fn to_rect(rect: egui::Rect) -> Rect {
    Rect::new(rect.min.x, rect.min.y, rect.width(), rect.height())
}

pub fn to_egui_rect(rect: Rect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(rect.x, rect.y), egui::vec2(rect.width, rect.height))
}

/// Pointer input for the canvas, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    Down(PointerEvent),
    Move(PointerEvent),
    Up(PointerEvent),
    Leave,
}

/// Pointer kind of this frame's input; touch events mark the frame as touch.
pub fn pointer_kind(ui: &egui::Ui, previous: PointerKind) -> PointerKind {
    ui.input(|i| {
        if i.events.iter().any(|e| matches!(e, egui::Event::Touch { .. })) {
            PointerKind::Touch
        } else if i
            .events
            .iter()
            .any(|e| matches!(e, egui::Event::PointerButton { .. }))
        {
            PointerKind::Mouse
        } else {
            previous
        }
    })
}

/// Translate an egui response over the photo into canvas events.
///
/// `gesture_active` is whether the canvas is mid-gesture; a pointer that
/// leaves the container during a gesture produces [`CanvasEvent::Leave`].
pub fn pointer_events(
    ui: &egui::Ui,
    response: &egui::Response,
    layout: &CanvasLayout,
    kind: PointerKind,
    gesture_active: bool,
) -> Vec<CanvasEvent> {
    let event = |pos: egui::Pos2| {
        let p = layout.to_image(pos);
        PointerEvent { position: p, kind }
    };
    let mut events = Vec::new();

    if response.drag_started() {
        let origin = ui
            .input(|i| i.pointer.press_origin())
            .or_else(|| response.interact_pointer_pos());
        if let Some(pos) = origin {
            if layout.image_rect.contains(pos) {
                events.push(CanvasEvent::Down(event(pos)));
            }
        }
    }

    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            if gesture_active && !layout.container.contains(pos) {
                events.push(CanvasEvent::Leave);
                return events;
            }
            events.push(CanvasEvent::Move(event(pos)));
        }
    }

    if response.drag_stopped() {
        match response.interact_pointer_pos() {
            Some(pos) => events.push(CanvasEvent::Up(event(pos))),
            None => events.push(CanvasEvent::Leave),
        }
    } else if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            if layout.image_rect.contains(pos) {
                events.push(CanvasEvent::Down(event(pos)));
                events.push(CanvasEvent::Up(event(pos)));
            }
        }
    }

    if gesture_active && events.is_empty() && !ui.input(|i| i.pointer.has_pointer()) {
        events.push(CanvasEvent::Leave);
    }

    events
}

/// Paint the rendered canvas and, when active, the loupe above it.
pub fn paint(
    ui: &egui::Ui,
    layout: &CanvasLayout,
    canvas_texture: &egui::TextureHandle,
    loupe: Option<(&egui::TextureHandle, egui::Rect)>,
) {
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    let painter = ui.painter_at(layout.container);
    painter.image(canvas_texture.id(), layout.image_rect, uv, egui::Color32::WHITE);

    if let Some((texture, rect)) = loupe {
        painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
    }
}

/// Message shown when no photo is loaded.
pub fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Paneline")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Window measurement canvas")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open a photo to begin annotating")
                    .color(egui::Color32::from_gray(180)),
            );
        });
    });
}

/// Loading overlay with a spinner.
pub fn show_loading(ui: &mut egui::Ui, message: &str) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.spinner();
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new(message)
                    .size(16.0)
                    .color(egui::Color32::from_gray(200)),
            );
        });
    });
}
