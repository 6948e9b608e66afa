// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation and measurement document serialization.
//!
//! Documents are written as JSON, YAML or a base64 `data:` URI wrapping the
//! JSON. Reading is lenient: the payload may be any of those encodings, a
//! document that does not parse at all yields an empty document, and
//! corrupt records are dropped one at a time.

use crate::canvas::projector::bounds_from_lines;
use crate::models::annotation::{Annotation, AnnotationId};
use crate::models::document::{AnnotationDocument, LineRecord, MeasurementDocument};
use crate::models::measurement::{WindowBounds, WizardMeasurements};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Prefix of the base64 data-URI envelope.
pub const DATA_URI_PREFIX: &str = "data:application/json;base64,";

/// On-disk encoding of a saved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    DataUri,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [
        DocumentFormat::Json,
        DocumentFormat::Yaml,
        DocumentFormat::DataUri,
    ];

    /// Pick the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            Some("txt" | "b64" | "uri") => DocumentFormat::DataUri,
            _ => DocumentFormat::Json,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentFormat::Json => "JSON",
            DocumentFormat::Yaml => "YAML",
            DocumentFormat::DataUri => "Data URI",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            DocumentFormat::Json => &["json"],
            DocumentFormat::Yaml => &["yaml", "yml"],
            DocumentFormat::DataUri => &["txt", "b64"],
        }
    }
}

/// Wrap a JSON string in the base64 data-URI envelope.
pub fn encode_data_uri(json: &str) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(json))
}

/// Serialize `data` in `format`.
pub fn encode<T: Serialize>(data: &T, format: DocumentFormat) -> Result<String> {
    Ok(match format {
        DocumentFormat::Json => serde_json::to_string_pretty(data)?,
        DocumentFormat::Yaml => serde_yaml::to_string(data)?,
        DocumentFormat::DataUri => encode_data_uri(&serde_json::to_string(data)?),
    })
}

/// Export a document to `path`.
pub fn export_document<T: Serialize>(data: &T, path: &Path, format: DocumentFormat) -> Result<()> {
    let text = encode(data, format)
        .with_context(|| format!("Failed to encode document as {}", format.label()))?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read the raw text of a document file.
pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Unwrap a data URI or bare base64 payload; anything else is returned as is.
pub fn decode_payload(input: &str) -> String {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((meta, body)) = rest.split_once(',') {
            if meta.ends_with(";base64") {
                return match STANDARD.decode(body.trim()) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => {
                        log::warn!("Invalid base64 in data URI: {}", e);
                        String::new()
                    }
                };
            }
            return body.to_string();
        }
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    match STANDARD.decode(trimmed) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) if looks_like_json(&text) => text,
            _ => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

fn looks_like_json(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with('{') || text.starts_with('[')
}

/// Parse JSON, falling back to YAML.
fn parse_value(input: &str) -> Option<Value> {
    let payload = decode_payload(input);
    if payload.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(&payload) {
        Ok(value) => Some(value),
        Err(json_err) => match serde_yaml::from_str::<Value>(&payload) {
            Ok(value) => Some(value),
            Err(yaml_err) => {
                log::warn!(
                    "Document is neither JSON ({}) nor YAML ({}), treating as empty",
                    json_err,
                    yaml_err
                );
                None
            }
        },
    }
}

/// Parse an annotation document leniently.
///
/// Accepts `{ "annotations": [...] }` or a bare array. Unknown variants,
/// malformed records and records with non-finite coordinates are dropped;
/// the remaining records are normalized and duplicate ids replaced.
pub fn parse_annotation_document(input: &str) -> AnnotationDocument {
    let records = match parse_value(input) {
        Some(Value::Array(records)) => records,
        Some(Value::Object(mut map)) => match map.remove("annotations") {
            Some(Value::Array(records)) => records,
            Some(_) => {
                log::warn!("\"annotations\" is not an array, treating as empty");
                Vec::new()
            }
            None => Vec::new(),
        },
        Some(_) => {
            log::warn!("Annotation document has unexpected shape, treating as empty");
            Vec::new()
        }
        None => Vec::new(),
    };

    let total = records.len();
    let mut seen = HashSet::new();
    let mut annotations = Vec::with_capacity(total);
    for (index, record) in records.into_iter().enumerate() {
        let annotation = match serde_json::from_value::<Annotation>(record) {
            Ok(annotation) => annotation,
            Err(e) => {
                log::warn!("Dropping annotation #{}: {}", index, e);
                continue;
            }
        };
        if !annotation.is_finite() {
            log::warn!("Dropping annotation #{}: non-finite geometry", index);
            continue;
        }
        let mut annotation = annotation.normalized();
        if annotation.id().as_str().is_empty() || !seen.insert(annotation.id().clone()) {
            let fresh = AnnotationId::generate();
            log::warn!(
                "Annotation #{} has duplicate id {:?}, assigned {}",
                index,
                annotation.id().as_str(),
                fresh
            );
            seen.insert(fresh.clone());
            annotation.set_id(fresh);
        }
        annotations.push(annotation);
    }

    if annotations.len() < total {
        log::warn!("Restored {} of {} annotations", annotations.len(), total);
    }
    AnnotationDocument::new(annotations)
}

fn parse_lines(value: Option<Value>, field: &str) -> Vec<LineRecord> {
    let Some(Value::Array(records)) = value else {
        return Vec::new();
    };
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<LineRecord>(record) {
            Ok(line) if line.start.is_finite() && line.end.is_finite() => Some(line),
            Ok(_) => {
                log::warn!("Dropping {}[{}]: non-finite endpoint", field, index);
                None
            }
            Err(e) => {
                log::warn!("Dropping {}[{}]: {}", field, index, e);
                None
            }
        })
        .collect()
}

/// Parse a measurement document leniently.
///
/// When `windowBounds` is missing or corrupt but the T and B width lines
/// are present, the frame is rebuilt from those lines.
pub fn parse_measurement_document(input: &str) -> MeasurementDocument {
    let Some(Value::Object(mut map)) = parse_value(input) else {
        return MeasurementDocument::default();
    };

    let measurements = match map.remove("measurements") {
        Some(value) => serde_json::from_value::<WizardMeasurements>(value)
            .map(WizardMeasurements::sanitized)
            .unwrap_or_else(|e| {
                log::warn!("Dropping measurements: {}", e);
                WizardMeasurements::default()
            }),
        None => WizardMeasurements::default(),
    };

    let width_lines = parse_lines(map.remove("widthLines"), "widthLines");
    let height_lines = parse_lines(map.remove("heightLines"), "heightLines");

    let window_bounds = match map.remove("windowBounds") {
        Some(Value::Null) | None => None,
        Some(value) => match serde_json::from_value::<WindowBounds>(value) {
            Ok(bounds) if bounds.is_finite() => Some(bounds),
            Ok(_) => {
                log::warn!("Dropping windowBounds: non-finite corner");
                None
            }
            Err(e) => {
                log::warn!("Dropping windowBounds: {}", e);
                None
            }
        },
    }
    .or_else(|| {
        let rebuilt = bounds_from_lines(&width_lines);
        if rebuilt.is_some() {
            log::info!("Rebuilt window frame from saved width lines");
        }
        rebuilt
    });

    MeasurementDocument {
        window_bounds,
        measurements,
        width_lines,
        height_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Point, Rgba};
    use crate::models::measurement::MeasureKey;

    fn sample() -> AnnotationDocument {
        AnnotationDocument::new(vec![
            Annotation::Rectangle {
                id: "r1".into(),
                x: 10.0,
                y: 10.0,
                width: 50.0,
                height: 30.0,
                color: Rgba::RED,
            },
            Annotation::Text {
                id: "t1".into(),
                x: 5.0,
                y: 6.0,
                text: "Sash".into(),
                color: Rgba::BLACK,
                font_size: 28.0,
            },
        ])
    }

    #[test]
    fn test_round_trip_every_format() {
        let doc = sample();
        for format in DocumentFormat::ALL {
            let text = encode(&doc, format).unwrap();
            assert_eq!(parse_annotation_document(&text), doc, "{format:?}");
        }
    }

    #[test]
    fn test_data_uri_envelope() {
        let uri = encode_data_uri("{\"annotations\":[]}");
        assert!(uri.starts_with(DATA_URI_PREFIX));
        assert_eq!(decode_payload(&uri), "{\"annotations\":[]}");
        let bare = STANDARD.encode("{\"a\":1}");
        assert_eq!(decode_payload(&bare), "{\"a\":1}");
    }

    #[test]
    fn test_garbage_is_empty_document() {
        assert!(parse_annotation_document("").annotations.is_empty());
        assert!(parse_annotation_document("{not json").annotations.is_empty());
        assert!(parse_annotation_document("data:application/json;base64,@@@")
            .annotations
            .is_empty());
        assert!(parse_measurement_document("42").is_empty());
    }

    #[test]
    fn test_corrupt_records_dropped_individually() {
        let input = r##"{"annotations": [
            {"type": "rectangle", "id": "a", "x": 1, "y": 2, "width": -10, "height": 5, "color": "#ff0000"},
            {"type": "hexagon", "id": "b"},
            {"type": "circle", "id": "c", "cx": 0, "cy": 0, "radius": -4, "color": "blue"},
            {"type": "arrow", "id": "d", "x1": 0},
            {"type": "circle", "id": "c", "cx": 9, "cy": 9, "radius": 1, "color": "#00ff00"}
        ]}"##;
        let doc = parse_annotation_document(input);
        assert_eq!(doc.annotations.len(), 3);

        match &doc.annotations[0] {
            Annotation::Rectangle { x, width, .. } => {
                assert_eq!(*x, -9.0);
                assert_eq!(*width, 10.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &doc.annotations[1] {
            Annotation::Circle { radius, .. } => assert_eq!(*radius, 4.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(doc.annotations[1].id().as_str(), "c");
        assert_ne!(doc.annotations[2].id().as_str(), "c");
    }

    #[test]
    fn test_measurement_document_round_trip() {
        let mut measurements = WizardMeasurements::default();
        measurements.set(MeasureKey::M, 48.0);
        measurements.set(MeasureKey::C, 60.125);
        let doc = MeasurementDocument {
            window_bounds: Some(WindowBounds::from_rect(0.0, 0.0, 200.0, 100.0)),
            measurements,
            width_lines: Vec::new(),
            height_lines: Vec::new(),
        };
        let uri = encode(&doc, DocumentFormat::DataUri).unwrap();
        assert_eq!(parse_measurement_document(&uri), doc);
    }

    #[test]
    fn test_measurement_values_sanitized() {
        let doc = parse_measurement_document(
            r#"{"measurements": {"widths": {"T": -3, "M": 36.5}, "heights": {"L": 60}}}"#,
        );
        assert_eq!(doc.measurements.get(MeasureKey::T), 0.0);
        assert_eq!(doc.measurements.get(MeasureKey::M), 36.5);
        assert_eq!(doc.measurements.get(MeasureKey::L), 60.0);
        assert!(doc.window_bounds.is_none());
    }

    #[test]
    fn test_frame_rebuilt_from_width_lines() {
        let input = r#"{
            "measurements": {"widths": {"M": 48}},
            "widthLines": [
                {"key": "T", "start": {"x": 0, "y": 15}, "end": {"x": 200, "y": 15}},
                {"key": "Z", "start": {"x": 0, "y": 0}, "end": {"x": 1, "y": 1}},
                {"key": "B", "start": {"x": 0, "y": 85}, "end": {"x": 200, "y": 85}}
            ]
        }"#;
        let doc = parse_measurement_document(input);
        assert_eq!(doc.width_lines.len(), 2);
        let bounds = doc.window_bounds.unwrap();
        assert!(bounds.tl.distance(Point::new(0.0, 0.0)) < 1e-3);
        assert!(bounds.br.distance(Point::new(200.0, 100.0)) < 1e-3);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.YML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), DocumentFormat::DataUri);
        assert_eq!(DocumentFormat::from_path(Path::new("a")), DocumentFormat::Json);
    }

    #[test]
    fn test_export_and_read_file() {
        let path = std::env::temp_dir().join(format!("paneline-{}.yaml", AnnotationId::generate()));
        export_document(&sample(), &path, DocumentFormat::Yaml).unwrap();
        let text = read_document(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(parse_annotation_document(&text), sample());
    }
}
