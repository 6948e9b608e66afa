// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation and perspective-measurement canvas.
//!
//! [`Canvas`] binds the interaction state machine, the measurement values
//! and the loupe settings to one opened photo. Until a photo is opened no
//! geometry runs and pointer input is ignored.

pub mod handles;
pub mod interaction;
pub mod magnifier;
pub mod projector;
pub mod store;

use crate::config::Config;
use crate::io::serialization::{parse_annotation_document, parse_measurement_document};
use crate::models::annotation::Point;
use crate::models::document::{AnnotationDocument, MeasurementDocument};
use crate::models::measurement::{MeasureKey, WindowBounds, WizardMeasurements};
use crate::render::scene::{self, Scene, SceneInput};
use crate::render::text::TextMetrics;
use crate::util::geometry::Rect;
use crate::util::scale::ScaleContext;
use anyhow::Result;
use interaction::{FramingMode, Interaction, InteractionState, PointerEvent, PointerKind, Tool, ToolSettings};
use magnifier::{MagnifierSettings, MagnifierView};

/// Receives the two documents emitted on save.
pub trait SaveSink {
    fn annotations_saved(&mut self, document: &AnnotationDocument) -> Result<()>;
    fn measurements_saved(&mut self, document: &MeasurementDocument) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image_size: Option<(u32, u32)>,
    reference_width: f32,
    history_limit: usize,
    scale: ScaleContext,
    interaction: Interaction,
    measurements: WizardMeasurements,
    magnifier: MagnifierSettings,
    magnifier_always_on: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Canvas {
    pub fn new(config: &Config) -> Self {
        let settings = ToolSettings {
            color: config.default_color,
            brush_radius: config.brush_radius,
            font_size: config.font_size,
            pending_text: String::new(),
        };
        Self {
            image_size: None,
            reference_width: config.reference_width,
            history_limit: config.history_limit,
            scale: ScaleContext::identity(),
            interaction: Interaction::new(config.history_limit, settings),
            measurements: WizardMeasurements::default(),
            magnifier: config.magnifier.settings(),
            magnifier_always_on: config.magnifier.always_on,
        }
    }

    /// Start a fresh canvas over a photo of natural size `size`.
    ///
    /// Annotations, the frame and measurements are cleared; tool settings
    /// and the current tool carry over.
    pub fn open_image(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            log::warn!("Ignoring image with no pixels");
            self.close_image();
            return;
        }
        self.image_size = Some(size);
        self.scale = ScaleContext::compute(size.0, self.reference_width);
        self.reset_document();
        log::info!(
            "Opened {}x{} image, scale factor {:.3}",
            size.0,
            size.1,
            self.scale.factor()
        );
    }

    /// Return to the "no image" state, as after a failed load. Tool
    /// settings and the current tool carry over.
    pub fn close_image(&mut self) {
        self.image_size = None;
        self.scale = ScaleContext::identity();
        self.reset_document();
        log::info!("Closed image");
    }

    fn reset_document(&mut self) {
        let tool = self.interaction.tool();
        let framing = self.interaction.framing_mode();
        let settings = self.interaction.settings().clone();

        self.interaction = Interaction::new(self.history_limit, settings);
        self.interaction.set_framing_mode(framing);
        self.measurements = WizardMeasurements::default();
        self.set_tool(tool);
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    pub fn has_image(&self) -> bool {
        self.image_size.is_some()
    }

    pub fn scale(&self) -> ScaleContext {
        self.scale
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn tool(&self) -> Tool {
        self.interaction.tool()
    }

    /// Switch tools. Selecting the measure tool places a default frame when
    /// none exists.
    pub fn set_tool(&mut self, tool: Tool) {
        self.interaction.set_tool(tool);
        self.ensure_window();
    }

    fn ensure_window(&mut self) {
        if self.interaction.tool() == Tool::Measure {
            if let Some(size) = self.image_size {
                self.interaction.ensure_window(size);
            }
        }
    }

    pub fn framing_mode(&self) -> FramingMode {
        self.interaction.framing_mode()
    }

    pub fn set_framing_mode(&mut self, mode: FramingMode) {
        self.interaction.set_framing_mode(mode);
    }

    pub fn settings(&self) -> &ToolSettings {
        self.interaction.settings()
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        self.interaction.settings_mut()
    }

    pub fn window(&self) -> Option<&WindowBounds> {
        self.interaction.window()
    }

    pub fn measurements(&self) -> &WizardMeasurements {
        &self.measurements
    }

    pub fn set_measurement(&mut self, key: MeasureKey, value: f64) {
        self.measurements.set(key, value);
    }

    // ----- documents -----

    /// Replace the annotations from serialized text; unreadable input
    /// yields an empty canvas. Returns the number of annotations restored.
    pub fn restore_annotations(&mut self, text: &str) -> usize {
        let document = parse_annotation_document(text);
        let count = document.annotations.len();
        self.interaction.restore(document);
        log::info!("Restored {} annotations", count);
        count
    }

    /// Replace the frame and measurement values from serialized text.
    ///
    /// With the measure tool active a document without a usable frame gets
    /// the default one.
    pub fn restore_measurements(&mut self, text: &str) {
        let document = parse_measurement_document(text);
        self.interaction.set_window(document.window_bounds);
        self.measurements = document.measurements;
        log::info!(
            "Restored measurements{}",
            if document.window_bounds.is_some() {
                " with window frame"
            } else {
                ""
            }
        );
        self.ensure_window();
    }

    pub fn annotation_document(&self) -> AnnotationDocument {
        self.interaction.store().serialize()
    }

    /// Frame, values and the projected cross-lines.
    pub fn measurement_document(&self) -> MeasurementDocument {
        let window_bounds = self.interaction.window().copied();
        let (width_lines, height_lines) = match &window_bounds {
            Some(bounds) => {
                let overlay = projector::project(bounds, &self.measurements);
                (
                    overlay.width_lines.iter().map(|line| line.record()).collect(),
                    overlay.height_lines.iter().map(|line| line.record()).collect(),
                )
            }
            None => (Vec::new(), Vec::new()),
        };
        MeasurementDocument {
            window_bounds,
            measurements: self.measurements,
            width_lines,
            height_lines,
        }
    }

    /// Emit both documents to `sink`.
    pub fn save(&self, sink: &mut dyn SaveSink) -> Result<()> {
        sink.annotations_saved(&self.annotation_document())?;
        sink.measurements_saved(&self.measurement_document())?;
        Ok(())
    }

    // ----- pointer input -----

    pub fn pointer_down(&mut self, event: PointerEvent, metrics: &dyn TextMetrics) {
        if self.has_image() {
            self.interaction.pointer_down(event, self.scale, metrics);
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent, metrics: &dyn TextMetrics) {
        if self.has_image() {
            self.interaction.pointer_move(event, self.scale, metrics);
        }
    }

    pub fn pointer_up(&mut self, event: PointerEvent, metrics: &dyn TextMetrics) {
        if self.has_image() {
            self.interaction.pointer_up(event, self.scale, metrics);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.interaction.pointer_leave();
    }

    pub fn state(&self) -> InteractionState {
        self.interaction.state()
    }

    // ----- editing commands -----

    pub fn delete_selected(&mut self) -> bool {
        self.interaction.delete_selected()
    }

    pub fn clear_all(&mut self) -> bool {
        self.interaction.clear_all()
    }

    pub fn deselect(&mut self) {
        self.interaction.select(None);
    }

    pub fn can_undo(&self) -> bool {
        self.interaction.store().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.interaction.store().can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.interaction.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.interaction.redo()
    }

    // ----- rendering -----

    /// Display list for the current state, or `None` with no photo.
    pub fn scene(&self, metrics: &dyn TextMetrics) -> Option<Scene> {
        let image_size = self.image_size?;
        let input = SceneInput {
            image_size,
            scale: self.scale,
            annotations: self.interaction.annotations(),
            selection: self.interaction.selection(),
            live_stroke: self.interaction.live_stroke(),
            window: self.interaction.window(),
            measurements: &self.measurements,
            window_handles: self.interaction.tool() == Tool::Measure,
        };
        Some(scene::build(&input, metrics))
    }

    /// Loupe placement while a handle is dragged by touch or pen (or by any
    /// pointer when always on).
    ///
    /// `pointer` is the screen position, `display_scale` screen pixels per
    /// image pixel and `container` the screen area the loupe must stay in.
    pub fn magnifier_view(&self, pointer: Point, display_scale: f32, container: Rect) -> Option<MagnifierView> {
        let image_size = self.image_size?;
        let (handle, kind, focus) = self.interaction.active_handle()?;
        if kind == PointerKind::Mouse && !self.magnifier_always_on {
            return None;
        }
        Some(magnifier::place(
            focus,
            pointer,
            handle,
            image_size,
            display_scale,
            container,
            &self.magnifier,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Annotation;
    use crate::render::text::EstimatedMetrics;

    const M: EstimatedMetrics = EstimatedMetrics;

    #[derive(Default)]
    struct Recorder {
        annotations: Option<AnnotationDocument>,
        measurements: Option<MeasurementDocument>,
    }

    impl SaveSink for Recorder {
        fn annotations_saved(&mut self, document: &AnnotationDocument) -> Result<()> {
            self.annotations = Some(document.clone());
            Ok(())
        }

        fn measurements_saved(&mut self, document: &MeasurementDocument) -> Result<()> {
            self.measurements = Some(document.clone());
            Ok(())
        }
    }

    fn canvas(size: (u32, u32)) -> Canvas {
        let mut canvas = Canvas::default();
        canvas.open_image(size);
        canvas
    }

    #[test]
    fn test_no_image_ignores_pointer() {
        let mut canvas = Canvas::default();
        canvas.set_tool(Tool::Rectangle);
        canvas.pointer_down(PointerEvent::mouse(10.0, 10.0), &M);
        canvas.pointer_up(PointerEvent::mouse(60.0, 40.0), &M);
        assert!(canvas.annotation_document().annotations.is_empty());
        assert!(canvas.scene(&M).is_none());
        assert!(canvas.window().is_none());
    }

    #[test]
    fn test_scale_from_image_width() {
        let canvas = canvas((4000, 3000));
        assert_eq!(canvas.scale().factor(), 4.0);
        let canvas = self::canvas((800, 600));
        assert!((canvas.scale().factor() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_draw_undo_redo_rectangle() {
        let mut canvas = canvas((1000, 800));
        canvas.set_tool(Tool::Rectangle);
        canvas.pointer_down(PointerEvent::mouse(10.0, 10.0), &M);
        canvas.pointer_move(PointerEvent::mouse(60.0, 40.0), &M);
        canvas.pointer_up(PointerEvent::mouse(60.0, 40.0), &M);

        let drawn = canvas.annotation_document();
        match drawn.annotations.as_slice() {
            [Annotation::Rectangle {
                x, y, width, height, ..
            }] => assert_eq!((*x, *y, *width, *height), (10.0, 10.0, 50.0, 30.0)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(canvas.undo());
        assert!(canvas.annotation_document().annotations.is_empty());
        assert!(canvas.redo());
        assert_eq!(canvas.annotation_document(), drawn);
    }

    #[test]
    fn test_measure_tool_places_default_frame() {
        let mut canvas = canvas((1000, 800));
        canvas.set_tool(Tool::Measure);
        let bounds = canvas.window().copied().unwrap();
        assert!(bounds.tl.distance(Point::new(150.0, 120.0)) < 1e-3);
        assert!(bounds.br.distance(Point::new(850.0, 680.0)) < 1e-3);
    }

    #[test]
    fn test_save_emits_both_documents() {
        let mut canvas = canvas((200, 100));
        canvas.set_tool(Tool::Circle);
        canvas.pointer_down(PointerEvent::mouse(50.0, 50.0), &M);
        canvas.pointer_up(PointerEvent::mouse(60.0, 50.0), &M);
        canvas.restore_measurements(
            r#"{"windowBounds": {"tl": {"x": 0, "y": 0}, "tr": {"x": 200, "y": 0},
                "bl": {"x": 0, "y": 100}, "br": {"x": 200, "y": 100}},
                "measurements": {"widths": {"M": 48}}}"#,
        );

        let mut recorder = Recorder::default();
        canvas.save(&mut recorder).unwrap();
        assert_eq!(recorder.annotations.unwrap().annotations.len(), 1);
        let measurements = recorder.measurements.unwrap();
        assert_eq!(measurements.measurements.get(MeasureKey::M), 48.0);
        assert_eq!(measurements.width_lines.len(), 3);
        assert_eq!(measurements.height_lines.len(), 3);
        assert_eq!(measurements.window_bounds, canvas.window().copied());
    }

    #[test]
    fn test_saved_documents_restore_identically() {
        let mut canvas = canvas((500, 500));
        canvas.set_tool(Tool::Arrow);
        canvas.pointer_down(PointerEvent::mouse(10.0, 10.0), &M);
        canvas.pointer_up(PointerEvent::mouse(200.0, 150.0), &M);
        canvas.set_tool(Tool::Measure);
        canvas.set_measurement(MeasureKey::R, 59.875);

        let annotations = serde_json::to_string(&canvas.annotation_document()).unwrap();
        let measurements = serde_json::to_string(&canvas.measurement_document()).unwrap();

        let mut restored = self::canvas((500, 500));
        assert_eq!(restored.restore_annotations(&annotations), 1);
        restored.restore_measurements(&measurements);
        assert_eq!(restored.annotation_document(), canvas.annotation_document());
        assert_eq!(restored.measurement_document(), canvas.measurement_document());
        assert!(!restored.can_undo());
    }

    #[test]
    fn test_corrupt_document_leaves_canvas_usable() {
        let mut canvas = canvas((300, 300));
        assert_eq!(canvas.restore_annotations("%%% not a document"), 0);
        canvas.restore_measurements("also garbage");
        assert!(canvas.window().is_none());
        canvas.set_tool(Tool::Rectangle);
        canvas.pointer_down(PointerEvent::mouse(1.0, 1.0), &M);
        canvas.pointer_up(PointerEvent::mouse(20.0, 20.0), &M);
        assert_eq!(canvas.annotation_document().annotations.len(), 1);
    }

    #[test]
    fn test_magnifier_only_for_touch_drags() {
        let mut canvas = canvas((1000, 800));
        canvas.set_tool(Tool::Measure);
        let container = Rect::new(0.0, 0.0, 500.0, 400.0);

        canvas.pointer_down(PointerEvent::mouse(150.0, 120.0), &M);
        assert_eq!(canvas.state(), InteractionState::Resizing);
        assert!(canvas
            .magnifier_view(Point::new(75.0, 60.0), 0.5, container)
            .is_none());
        canvas.pointer_up(PointerEvent::mouse(150.0, 120.0), &M);

        canvas.pointer_down(PointerEvent::touch(150.0, 120.0), &M);
        canvas.pointer_move(PointerEvent::touch(160.0, 130.0), &M);
        let view = canvas
            .magnifier_view(Point::new(80.0, 65.0), 0.5, container)
            .unwrap();
        assert!(view.source.contains(Point::new(160.0, 130.0)));
        assert!(view.center.x > 80.0 && view.center.y > 65.0);

        canvas.pointer_up(PointerEvent::touch(160.0, 130.0), &M);
        assert!(canvas
            .magnifier_view(Point::new(80.0, 65.0), 0.5, container)
            .is_none());
    }

    #[test]
    fn test_open_image_resets_document() {
        let mut canvas = canvas((400, 400));
        canvas.set_tool(Tool::Rectangle);
        canvas.pointer_down(PointerEvent::mouse(1.0, 1.0), &M);
        canvas.pointer_up(PointerEvent::mouse(50.0, 50.0), &M);
        canvas.set_measurement(MeasureKey::T, 12.0);

        canvas.open_image((800, 600));
        assert!(canvas.annotation_document().annotations.is_empty());
        assert!(!canvas.can_undo());
        assert_eq!(canvas.measurements(), &WizardMeasurements::default());
        assert_eq!(canvas.tool(), Tool::Rectangle);
    }

    #[test]
    fn test_close_image_returns_to_no_image_state() {
        let mut canvas = canvas((400, 400));
        canvas.set_tool(Tool::Measure);
        canvas.set_measurement(MeasureKey::T, 12.0);
        canvas.set_tool(Tool::Rectangle);
        canvas.pointer_down(PointerEvent::mouse(1.0, 1.0), &M);
        canvas.pointer_up(PointerEvent::mouse(50.0, 50.0), &M);

        canvas.close_image();
        assert!(!canvas.has_image());
        assert!(canvas.scene(&M).is_none());
        assert!(canvas.window().is_none());
        assert!(canvas.annotation_document().annotations.is_empty());
        assert_eq!(canvas.measurements(), &WizardMeasurements::default());

        canvas.pointer_down(PointerEvent::mouse(1.0, 1.0), &M);
        canvas.pointer_up(PointerEvent::mouse(50.0, 50.0), &M);
        assert!(canvas.annotation_document().annotations.is_empty());
        assert_eq!(canvas.tool(), Tool::Rectangle);
    }

    #[test]
    fn test_empty_image_closes_canvas() {
        let mut canvas = canvas((400, 400));
        canvas.open_image((0, 300));
        assert!(!canvas.has_image());
        assert!(canvas.scene(&M).is_none());
    }

    #[test]
    fn test_restore_without_frame_keeps_default_frame_while_measuring() {
        let mut canvas = canvas((1000, 800));
        canvas.set_tool(Tool::Measure);
        canvas.restore_measurements(r#"{"measurements": {"widths": {"T": 36}}}"#);
        let bounds = canvas.window().copied().unwrap();
        assert!(bounds.tl.distance(Point::new(150.0, 120.0)) < 1e-3);
        assert_eq!(canvas.measurements().get(MeasureKey::T), 36.0);

        canvas.set_tool(Tool::Select);
        canvas.restore_measurements("garbage");
        assert!(canvas.window().is_none());
    }
}
