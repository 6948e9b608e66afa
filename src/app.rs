// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app plays the host around the canvas: it decodes photos in the
//! background, rasterizes the canvas scene into a texture, routes pointer
//! input and keyboard shortcuts, and writes saved documents to disk.

use crate::ui::{canvas, properties, toolbar};
use anyhow::Result;
use image::RgbaImage;
use paneline::canvas::interaction::PointerKind;
use paneline::canvas::{magnifier, Canvas, SaveSink};
use paneline::config::Config;
use paneline::io::media::{self, LoadedImage};
use paneline::io::serialization::{self, DocumentFormat};
use paneline::models::annotation::Point;
use paneline::models::document::{AnnotationDocument, MeasurementDocument};
use paneline::render::raster;
use paneline::render::scene::Scene;
use paneline::render::text::GlyphMetrics;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use tiny_skia::Pixmap;

/// Writes saved documents to files.
struct FileSink {
    annotations: Option<PathBuf>,
    measurements: Option<PathBuf>,
    format: DocumentFormat,
}

impl SaveSink for FileSink {
    fn annotations_saved(&mut self, document: &AnnotationDocument) -> Result<()> {
        if let Some(path) = &self.annotations {
            serialization::export_document(document, path, self.format)?;
            log::info!(
                "Saved {} annotations to {}",
                document.annotations.len(),
                path.display()
            );
        }
        Ok(())
    }

    fn measurements_saved(&mut self, document: &MeasurementDocument) -> Result<()> {
        if let Some(path) = &self.measurements {
            serialization::export_document(document, path, self.format)?;
            log::info!("Saved measurements to {}", path.display());
        }
        Ok(())
    }
}

/// `photo.json` -> `photo-measurements.json`
fn measurements_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("annotations");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-measurements.{ext}"),
        None => format!("{stem}-measurements"),
    };
    path.with_file_name(name)
}

/// A typed extension picks the format; otherwise the menu's choice stands.
fn format_for(path: &Path, chosen: DocumentFormat) -> DocumentFormat {
    match path.extension() {
        Some(_) => DocumentFormat::from_path(path),
        None => chosen,
    }
}

/// Main application state.
pub struct PanelineApp {
    canvas: Canvas,

    /// Font for text metrics and rasterized text
    glyphs: Option<GlyphMetrics>,

    /// Decoded photo at natural resolution
    photo: Option<RgbaImage>,

    /// Last rasterized frame and the scene it was drawn from
    primary: Option<Pixmap>,
    last_scene: Option<Scene>,

    canvas_texture: Option<egui::TextureHandle>,
    loupe_texture: Option<egui::TextureHandle>,

    /// Device class of the latest pointer input
    pointer_kind: PointerKind,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImage, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last status or error shown in the status bar
    status: Option<String>,
}

impl PanelineApp {
    pub fn new(config: Config) -> Self {
        let glyphs = GlyphMetrics::discover(config.font_path.as_deref());
        Self {
            canvas: Canvas::new(&config),
            glyphs,
            photo: None,
            primary: None,
            last_scene: None,
            canvas_texture: None,
            loupe_texture: None,
            pointer_kind: PointerKind::Mouse,
            image_loader: None,
            loading_message: None,
            status: None,
        }
    }

    fn report_error(&mut self, context: &str, error: anyhow::Error) {
        log::error!("{}: {:#}", context, error);
        self.status = Some(format!("{}: {}", context, error));
    }

    /// Load an image file (asynchronously).
    fn load_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = media::load_image(&path)
                .map(|loaded| {
                    log::info!(
                        "Loaded image: {} ({}x{})",
                        path.display(),
                        loaded.width,
                        loaded.height
                    );
                    loaded
                })
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    fn poll_image_loader(&mut self) {
        let Some(receiver) = &self.image_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.image_loader = None;
        self.loading_message = None;

        self.primary = None;
        self.last_scene = None;
        self.canvas_texture = None;
        self.loupe_texture = None;

        match result {
            Ok(loaded) => {
                self.canvas.open_image(loaded.size());
                self.photo = Some(loaded.pixels);
                self.status = Some(format!("Opened {}x{} photo", loaded.width, loaded.height));
            }
            Err(e) => {
                log::error!("Failed to load image: {}", e);
                self.canvas.close_image();
                self.photo = None;
                self.status = Some(format!("Failed to load image: {}", e));
            }
        }
    }

    fn load_annotations(&mut self, path: &Path) {
        match serialization::read_document(path) {
            Ok(text) => {
                let count = self.canvas.restore_annotations(&text);
                self.status = Some(format!("Loaded {} annotations", count));
            }
            Err(e) => self.report_error("Failed to load annotations", e),
        }
    }

    fn load_measurements(&mut self, path: &Path) {
        match serialization::read_document(path) {
            Ok(text) => {
                self.canvas.restore_measurements(&text);
                self.status = Some("Loaded measurements".to_string());
            }
            Err(e) => self.report_error("Failed to load measurements", e),
        }
    }

    fn save(&mut self, mut sink: FileSink) {
        match self.canvas.save(&mut sink) {
            Ok(()) => self.status = Some("Saved".to_string()),
            Err(e) => self.report_error("Failed to save", e),
        }
    }

    fn export_flattened(&mut self, path: &Path) {
        let Some(pixmap) = &self.primary else {
            return;
        };
        let result = raster::image_from_pixmap(pixmap).and_then(|image| media::save_png(&image, path));
        match result {
            Ok(()) => {
                log::info!("Exported flattened image to {}", path.display());
                self.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => self.report_error("Failed to export image", e),
        }
    }

    /// Re-rasterize the canvas when its scene changed.
    fn refresh_canvas_texture(&mut self, ctx: &egui::Context) {
        let Some(photo) = &self.photo else {
            return;
        };
        let Some(scene) = self.canvas.scene(&self.glyphs) else {
            return;
        };
        if self.canvas_texture.is_some() && self.last_scene.as_ref() == Some(&scene) {
            return;
        }

        let pixmap = match raster::rasterize(photo, &scene, self.glyphs.as_ref()) {
            Ok(pixmap) => pixmap,
            Err(e) => {
                self.report_error("Failed to render canvas", e);
                return;
            }
        };
        let image = color_image(&pixmap);
        match &mut self.canvas_texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.canvas_texture =
                    Some(ctx.load_texture("canvas", image, egui::TextureOptions::LINEAR));
            }
        }
        self.primary = Some(pixmap);
        self.last_scene = Some(scene);
    }

    /// Render the loupe for the current drag, if one is active.
    fn refresh_loupe(
        &mut self,
        ctx: &egui::Context,
        layout: &canvas::CanvasLayout,
        pointer: Option<egui::Pos2>,
    ) -> Option<egui::Rect> {
        let pointer = pointer?;
        let view = self.canvas.magnifier_view(
            Point::new(pointer.x, pointer.y),
            layout.display_scale,
            layout.container_rect(),
        )?;
        let primary = self.primary.as_ref()?;
        let loupe = match magnifier::render(primary, &view) {
            Ok(loupe) => loupe,
            Err(e) => {
                log::warn!("Magnifier render failed: {:#}", e);
                return None;
            }
        };
        let image = color_image(&loupe);
        match &mut self.loupe_texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.loupe_texture =
                    Some(ctx.load_texture("loupe", image, egui::TextureOptions::LINEAR));
            }
        }
        Some(canvas::to_egui_rect(view.screen_rect()))
    }

    fn apply(&mut self, event: canvas::CanvasEvent) {
        match event {
            canvas::CanvasEvent::Down(e) => self.canvas.pointer_down(e, &self.glyphs),
            canvas::CanvasEvent::Move(e) => self.canvas.pointer_move(e, &self.glyphs),
            canvas::CanvasEvent::Up(e) => self.canvas.pointer_up(e, &self.glyphs),
            canvas::CanvasEvent::Leave => self.canvas.pointer_leave(),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Only process if no text field is focused
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.canvas.deselect();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
            && self.canvas.delete_selected()
        {
            log::info!("Deleted selected annotation");
        }

        // Handle undo (Ctrl+Z)
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
            self.canvas.undo();
        }

        // Handle redo (Ctrl+Shift+Z or Ctrl+Y)
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.canvas.redo();
        }
    }

    fn save_menu(&mut self, ui: &mut egui::Ui, title: &str, annotations: bool, measurements: bool) {
        ui.menu_button(title, |ui| {
            for format in DocumentFormat::ALL {
                if ui.button(format!("As {}...", format.label())).clicked() {
                    let default_name = match (annotations, measurements) {
                        (false, true) => "measurements",
                        _ => "annotations",
                    };
                    let extension = format.extensions()[0];
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter(format.label(), format.extensions())
                        .set_file_name(format!("{default_name}.{extension}"))
                        .save_file()
                    {
                        let format = format_for(&path, format);
                        let sink = match (annotations, measurements) {
                            (true, true) => FileSink {
                                measurements: Some(measurements_path_for(&path)),
                                annotations: Some(path),
                                format,
                            },
                            (true, false) => FileSink {
                                annotations: Some(path),
                                measurements: None,
                                format,
                            },
                            _ => FileSink {
                                annotations: None,
                                measurements: Some(path),
                                format,
                            },
                        };
                        self.save(sink);
                    }
                    ui.close_menu();
                }
            }
        });
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    // Open native file picker
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"])
                        .pick_file()
                    {
                        self.load_image_file(path);
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Load Annotations...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Documents", &["json", "yaml", "yml", "txt", "b64"])
                        .pick_file()
                    {
                        self.load_annotations(&path);
                    }
                    ui.close_menu();
                }
                if ui.button("Load Measurements...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Documents", &["json", "yaml", "yml", "txt", "b64"])
                        .pick_file()
                    {
                        self.load_measurements(&path);
                    }
                    ui.close_menu();
                }
                ui.separator();
                self.save_menu(ui, "Save", true, true);
                self.save_menu(ui, "Save Annotations", true, false);
                self.save_menu(ui, "Save Measurements", false, true);
                ui.separator();
                if ui
                    .add_enabled(self.primary.is_some(), egui::Button::new("Export Flattened PNG..."))
                    .clicked()
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("PNG", &["png"])
                        .set_file_name("annotated.png")
                        .save_file()
                    {
                        self.export_flattened(&path);
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                if ui
                    .add_enabled(self.canvas.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                    .clicked()
                {
                    self.canvas.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.canvas.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)"))
                    .clicked()
                {
                    self.canvas.redo();
                    ui.close_menu();
                }

                ui.separator();

                let has_selection = self.canvas.interaction().selection().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                    .clicked()
                {
                    self.canvas.delete_selected();
                    ui.close_menu();
                }
                if ui.button("Clear All").clicked() {
                    self.canvas.clear_all();
                    ui.close_menu();
                }
            });
        });
    }
}

/// Premultiplied pixmap data as an egui image.
fn color_image(pixmap: &Pixmap) -> egui::ColorImage {
    egui::ColorImage::from_rgba_premultiplied(
        [pixmap.width() as usize, pixmap.height() as usize],
        pixmap.data(),
    )
}

impl eframe::App for PanelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image_loader();

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let (tool, mode) = toolbar::show(ui, self.canvas.tool(), self.canvas.framing_mode());
            if tool != self.canvas.tool() {
                self.canvas.set_tool(tool);
            }
            if mode != self.canvas.framing_mode() {
                self.canvas.set_framing_mode(mode);
            }
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Tool: {:?}", self.canvas.tool()));
                ui.separator();
                match self.canvas.image_size() {
                    Some((w, h)) => ui.label(format!("{}x{} px", w, h)),
                    None => ui.label("No image loaded"),
                };
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, &mut self.canvas))
            .inner;

        match properties_action {
            properties::PropertiesAction::DeleteSelected => {
                self.canvas.delete_selected();
            }
            properties::PropertiesAction::ClearAll => {
                self.canvas.clear_all();
            }
            properties::PropertiesAction::None => {}
        }

        self.handle_keyboard(ctx);

        // Main canvas (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(message) = &self.loading_message {
                canvas::show_loading(ui, message);
                return;
            }
            let Some(image_size) = self.canvas.image_size() else {
                canvas::show_welcome(ui);
                return;
            };

            let available = ui.available_rect_before_wrap();
            let layout = canvas::CanvasLayout::fit(available, image_size);
            let response = ui.allocate_rect(available, egui::Sense::click_and_drag());

            self.pointer_kind = canvas::pointer_kind(ui, self.pointer_kind);
            let gesture_active = !self.canvas.interaction().is_idle();
            for event in canvas::pointer_events(ui, &response, &layout, self.pointer_kind, gesture_active) {
                self.apply(event);
            }

            self.refresh_canvas_texture(ctx);
            let loupe_rect = self.refresh_loupe(ctx, &layout, response.interact_pointer_pos());

            if let Some(texture) = &self.canvas_texture {
                let loupe = match (&self.loupe_texture, loupe_rect) {
                    (Some(texture), Some(rect)) => Some((texture, rect)),
                    _ => None,
                };
                canvas::paint(ui, &layout, texture, loupe);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurements_path_derived_from_annotations_path() {
        assert_eq!(
            measurements_path_for(Path::new("/tmp/site/photo.json")),
            PathBuf::from("/tmp/site/photo-measurements.json")
        );
        assert_eq!(
            measurements_path_for(Path::new("notes")),
            PathBuf::from("notes-measurements")
        );
    }

    #[test]
    fn test_typed_extension_overrides_menu_format() {
        assert_eq!(
            format_for(Path::new("notes.yml"), DocumentFormat::Json),
            DocumentFormat::Yaml
        );
        assert_eq!(
            format_for(Path::new("notes"), DocumentFormat::DataUri),
            DocumentFormat::DataUri
        );
        assert_eq!(
            format_for(Path::new("notes.json"), DocumentFormat::Yaml),
            DocumentFormat::Json
        );
    }

    #[test]
    fn test_file_sink_writes_selected_documents() {
        let dir = std::env::temp_dir().join(format!("paneline-app-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let annotations = dir.join("a.yaml");
        let mut sink = FileSink {
            annotations: Some(annotations.clone()),
            measurements: None,
            format: DocumentFormat::Yaml,
        };

        let mut canvas = Canvas::default();
        canvas.open_image((100, 100));
        canvas.save(&mut sink).unwrap();

        assert!(annotations.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
