// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Paneline - photo annotation and perspective window measurement
//!
//! Desktop host for the measurement canvas: opens a photo, routes pointer
//! input to the canvas and saves the annotation and measurement documents.

mod app;
mod ui;

use anyhow::Result;
use app::PanelineApp;
use paneline::config::Config;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = Config::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Paneline - Window Measurement Canvas"),
        ..Default::default()
    };

    eframe::run_native(
        "Paneline",
        options,
        Box::new(move |_cc| Ok(Box::new(PanelineApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
