// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Photo loading and flattened image export.
//!
//! The canvas needs the natural pixel size before any geometry runs, so
//! images are fully decoded to RGBA8 up front.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::path::Path;

/// A decoded photo.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow!("image has no pixels"));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Load an image file from disk.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let image = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    LoadedImage::from_rgba(image.to_rgba8())
}

/// Decode an image from encoded bytes (PNG, JPEG, ...).
pub fn decode_image(bytes: &[u8]) -> Result<LoadedImage> {
    let image = image::load_from_memory(bytes).context("Failed to decode image bytes")?;
    LoadedImage::from_rgba(image.to_rgba8())
}

/// Decode a `data:image/...;base64,` URI.
pub fn decode_image_uri(uri: &str) -> Result<LoadedImage> {
    let (meta, body) = uri
        .trim()
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| anyhow!("not a data URI"))?;
    if !meta.ends_with(";base64") {
        return Err(anyhow!("data URI is not base64 encoded"));
    }
    let bytes = STANDARD
        .decode(body.trim())
        .context("Invalid base64 in image data URI")?;
    decode_image(&bytes)
}

/// Write an RGBA image as PNG.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_reports_natural_size() {
        let loaded = decode_image(&png_bytes()).unwrap();
        assert_eq!(loaded.size(), (3, 2));
        assert_eq!(loaded.pixels.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_decode_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        assert_eq!(decode_image_uri(&uri).unwrap().size(), (3, 2));
        assert!(decode_image_uri("data:image/png,abc").is_err());
        assert!(decode_image_uri("hello").is_err());
    }

    #[test]
    fn test_invalid_bytes_fail() {
        assert!(decode_image(b"not an image").is_err());
        assert!(load_image(Path::new("/nonexistent/photo.jpg")).is_err());
    }

    #[test]
    fn test_save_and_reload_png() {
        let path = std::env::temp_dir().join(format!("paneline-{}.png", uuid::Uuid::new_v4()));
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([9, 8, 7, 255]));
        save_png(&image, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.pixels, image);
    }
}
