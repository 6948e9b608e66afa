// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! Tool picker for the annotation and measure tools, plus the framing mode
//! switch while measuring.

use paneline::canvas::interaction::{FramingMode, Tool};

fn tool_label(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "⬆ Select",
        Tool::Brush => "✏ Brush",
        Tool::Rectangle => "▭ Rectangle",
        Tool::Circle => "◯ Circle",
        Tool::Arrow => "➡ Arrow",
        Tool::Text => "T Text",
        Tool::Measure => "📐 Measure",
    }
}

fn tool_hint(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "Click to select, drag handles to resize, drag inside to move",
        Tool::Brush => "Drag to draw freehand",
        Tool::Rectangle => "Drag from one corner to the opposite corner",
        Tool::Circle => "Drag out from the centre",
        Tool::Arrow => "Drag from tail to tip",
        Tool::Text => "Click to place the pending text from the side panel",
        Tool::Measure => "Drag corners to fit the window frame, drag inside to move it",
    }
}

/// Display the toolbar. Returns the tool and framing mode picked this frame.
pub fn show(ui: &mut egui::Ui, current_tool: Tool, framing: FramingMode) -> (Tool, FramingMode) {
    let mut tool = current_tool;
    let mut mode = framing;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        for candidate in Tool::ALL {
            if ui
                .selectable_label(tool == candidate, tool_label(candidate))
                .clicked()
            {
                tool = candidate;
            }
        }

        if tool == Tool::Measure {
            ui.separator();
            ui.label("Framing:");
            ui.radio_value(&mut mode, FramingMode::SimpleRect, "Rectangle");
            ui.radio_value(&mut mode, FramingMode::AdjustFraming, "Perspective");
        }

        ui.separator();

        ui.label(egui::RichText::new(tool_hint(tool)).italics().weak());
    });

    (tool, mode)
}
