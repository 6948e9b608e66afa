// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the Paneline application.

pub mod canvas;
pub mod properties;
pub mod toolbar;

use paneline::models::annotation::Rgba;

pub fn to_color32(color: Rgba) -> egui::Color32 {
    let [r, g, b, a] = color.0;
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn from_color32(color: egui::Color32) -> Rgba {
    Rgba(color.to_srgba_unmultiplied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversion_round_trip() {
        for color in [Rgba::RED, Rgba::BLACK, Rgba::WHITE, Rgba::rgb(12, 200, 99)] {
            assert_eq!(from_color32(to_color32(color)), color);
        }
    }
}
