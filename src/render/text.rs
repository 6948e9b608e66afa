// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text measurement capability.
//!
//! Bounding boxes of text annotations and measurement labels depend on glyph
//! metrics. When no font is available the geometry kernel falls back to a
//! character-count estimate.

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Font files tried when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Measures a single line of text.
pub trait TextMetrics {
    /// `(width, height)` of `text` at `font_size`, or `None` when the backend
    /// cannot measure text.
    fn measure(&self, text: &str, font_size: f32) -> Option<(f32, f32)>;
}

/// Backend without glyph metrics; always defers to the estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMetrics;

impl TextMetrics for EstimatedMetrics {
    fn measure(&self, _text: &str, _font_size: f32) -> Option<(f32, f32)> {
        None
    }
}

/// Glyph metrics from a loaded font.
#[derive(Clone)]
pub struct GlyphMetrics {
    font: FontArc,
}

impl std::fmt::Debug for GlyphMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphMetrics").finish_non_exhaustive()
    }
}

impl GlyphMetrics {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Load a TTF/OTF font file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("Failed to parse font {}", path.display()))?;
        Ok(Self::new(font))
    }

    /// Load the configured font, or the first well-known system font found.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(metrics) => {
                    log::info!("Using font {}", path.display());
                    return Some(metrics);
                }
                Err(e) => log::warn!("{:#}", e),
            }
        }
        log::warn!("No usable font found, text will be estimated and not rasterized");
        None
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// Glyph ids with their pen x offsets, plus the total advance width.
    pub fn layout(&self, text: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(font_size);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor_x = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, cursor_x));
            cursor_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        (glyphs, cursor_x)
    }

    /// Distance from the top of the line box to the baseline.
    pub fn ascent(&self, font_size: f32) -> f32 {
        self.font.as_scaled(font_size).ascent()
    }
}

impl TextMetrics for GlyphMetrics {
    fn measure(&self, text: &str, font_size: f32) -> Option<(f32, f32)> {
        let scaled = self.font.as_scaled(font_size);
        let (_, width) = self.layout(text, font_size);
        Some((width, scaled.ascent() - scaled.descent()))
    }
}

impl<T: TextMetrics + ?Sized> TextMetrics for &T {
    fn measure(&self, text: &str, font_size: f32) -> Option<(f32, f32)> {
        (**self).measure(text, font_size)
    }
}

impl<T: TextMetrics> TextMetrics for Option<T> {
    fn measure(&self, text: &str, font_size: f32) -> Option<(f32, f32)> {
        self.as_ref().and_then(|m| m.measure(text, font_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_metrics_never_measure() {
        assert_eq!(EstimatedMetrics.measure("hello", 12.0), None);
        let none: Option<GlyphMetrics> = None;
        assert_eq!(none.measure("hello", 12.0), None);
    }

    #[test]
    fn test_from_file_missing_path_is_error() {
        let err = GlyphMetrics::from_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read font"));
    }
}
