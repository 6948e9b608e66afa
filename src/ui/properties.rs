// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Side panel: tool settings, selection details and the six measurement
//! inputs.

use super::{from_color32, to_color32};
use paneline::canvas::Canvas;
use paneline::models::measurement::MeasureKey;

/// Measurement inputs snap to eighths.
const MEASUREMENT_STEP: f64 = 0.125;
const MAX_MEASUREMENT: f64 = 1000.0;

/// Result of properties panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesAction {
    None,
    DeleteSelected,
    ClearAll,
}

/// Round to the nearest 0.125; negative input becomes 0 ("not measured").
pub fn round_to_step(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value / MEASUREMENT_STEP).round() * MEASUREMENT_STEP
}

fn measurement_row(ui: &mut egui::Ui, canvas: &mut Canvas, key: MeasureKey) {
    let mut value = canvas.measurements().get(key);
    ui.label(key.label());
    let response = ui.add(
        egui::DragValue::new(&mut value)
            .speed(MEASUREMENT_STEP)
            .range(0.0..=MAX_MEASUREMENT)
            .suffix("\""),
    );
    if response.changed() {
        canvas.set_measurement(key, round_to_step(value));
    }
    ui.end_row();
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, canvas: &mut Canvas) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Tool");
    ui.separator();

    {
        let settings = canvas.settings_mut();

        ui.horizontal(|ui| {
            ui.label("Colour:");
            let mut color = to_color32(settings.color);
            if ui.color_edit_button_srgba(&mut color).changed() {
                settings.color = from_color32(color);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Brush radius:");
            ui.add(
                egui::DragValue::new(&mut settings.brush_radius)
                    .speed(0.5)
                    .range(0.5..=50.0),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Font size:");
            ui.add(
                egui::DragValue::new(&mut settings.font_size)
                    .speed(1.0)
                    .range(6.0..=200.0),
            );
        });

        ui.label("Text:");
        ui.text_edit_singleline(&mut settings.pending_text);
    }

    ui.add_space(12.0);
    ui.heading("Annotations");
    ui.separator();

    let count = canvas.interaction().annotations().len();
    ui.label(format!("{} annotation(s)", count));

    match canvas.interaction().selection() {
        Some(selected) => {
            ui.label(format!("Selected: {:?}", selected.kind()));
            ui.horizontal(|ui| {
                let color = selected.color();
                egui::color_picker::show_color(ui, to_color32(color), egui::vec2(16.0, 16.0));
                ui.label(egui::RichText::new(color.to_hex()).monospace());
            });
            ui.label(
                egui::RichText::new(selected.id().as_str())
                    .small()
                    .weak(),
            );
            if ui.button("🗑 Delete Selected").clicked() {
                action = PropertiesAction::DeleteSelected;
            }
        }
        None => {
            ui.label(egui::RichText::new("Nothing selected").italics().weak());
        }
    }

    if ui
        .add_enabled(count > 0, egui::Button::new("Clear All"))
        .clicked()
    {
        action = PropertiesAction::ClearAll;
    }

    ui.add_space(12.0);
    ui.heading("Measurements");
    ui.separator();

    if canvas.window().is_none() {
        ui.label(
            egui::RichText::new("Pick the measure tool to place the window frame")
                .italics()
                .weak(),
        );
    }

    egui::Grid::new("widths").num_columns(2).show(ui, |ui| {
        ui.strong("Widths");
        ui.end_row();
        for key in MeasureKey::WIDTHS {
            measurement_row(ui, canvas, key);
        }
    });

    ui.add_space(6.0);

    egui::Grid::new("heights").num_columns(2).show(ui, |ui| {
        ui.strong("Heights");
        ui.end_row();
        for key in MeasureKey::HEIGHTS {
            measurement_row(ui, canvas, key);
        }
    });

    action
}
