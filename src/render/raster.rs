// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! tiny-skia rasterizer for [`Scene`] display lists.
//!
//! The photo is copied into a premultiplied pixmap and the scene is drawn
//! on top at natural resolution. Text is drawn with ab_glyph coverage and
//! is skipped when no font is loaded.

use super::scene::{DrawCommand, Scene, StrokeStyle};
use super::text::GlyphMetrics;
use crate::models::annotation::{Point, Rgba};
use ab_glyph::Font;
use anyhow::{anyhow, Result};
use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PremultipliedColorU8,
    Stroke, StrokeDash, Transform,
};

/// Copy an RGBA image into a new premultiplied pixmap.
pub fn pixmap_from_image(image: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| anyhow!("cannot allocate {}x{} pixmap", image.width(), image.height()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Straight-alpha copy of a pixmap, for export.
pub fn image_from_pixmap(pixmap: &Pixmap) -> Result<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| anyhow!("cannot construct output image"))
}

/// Draw `scene` over `photo` and return the composited buffer.
pub fn rasterize(photo: &RgbaImage, scene: &Scene, glyphs: Option<&GlyphMetrics>) -> Result<Pixmap> {
    let mut pixmap = pixmap_from_image(photo)?;
    draw_scene(&mut pixmap, scene, glyphs);
    Ok(pixmap)
}

/// Draw every command of `scene` onto `pixmap` in order.
pub fn draw_scene(pixmap: &mut Pixmap, scene: &Scene, glyphs: Option<&GlyphMetrics>) {
    for command in &scene.commands {
        draw_command(pixmap, command, glyphs);
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
    paint.anti_alias = true;
    paint
}

fn stroke(style: &StrokeStyle) -> Stroke {
    Stroke {
        width: style.width.max(0.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: style
            .dash
            .and_then(|[on, off]| StrokeDash::new(vec![on, off], 0.0)),
        ..Stroke::default()
    }
}

fn polyline(points: &[Point], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

fn draw_command(pixmap: &mut Pixmap, command: &DrawCommand, glyphs: Option<&GlyphMetrics>) {
    let identity = Transform::identity();
    match command {
        DrawCommand::Path {
            points,
            closed,
            stroke: style,
        } => {
            if let Some(path) = polyline(points, *closed) {
                pixmap.stroke_path(&path, &paint(style.color), &stroke(style), identity, None);
            }
        }
        DrawCommand::Dot {
            center,
            radius,
            color,
        } => {
            if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                pixmap.fill_path(&path, &paint(*color), FillRule::Winding, identity, None);
            }
        }
        DrawCommand::Circle {
            center,
            radius,
            stroke: style,
        } => {
            if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                pixmap.stroke_path(&path, &paint(style.color), &stroke(style), identity, None);
            }
        }
        DrawCommand::Polygon { points, fill } => {
            if let Some(path) = polyline(points, true) {
                pixmap.fill_path(&path, &paint(*fill), FillRule::Winding, identity, None);
            }
        }
        DrawCommand::Handle {
            center,
            radius,
            fill,
            outline,
        } => {
            if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                pixmap.fill_path(&path, &paint(*fill), FillRule::Winding, identity, None);
                pixmap.stroke_path(&path, &paint(outline.color), &stroke(outline), identity, None);
            }
        }
        DrawCommand::Text {
            origin,
            text,
            font_size,
            color,
        } => {
            if let Some(glyphs) = glyphs {
                draw_text(pixmap, glyphs, *origin, text, *font_size, *color);
            }
        }
        DrawCommand::Label {
            anchor,
            text,
            font_size,
            size,
            padding,
            corner_radius,
            background,
            color,
        } => {
            let (w, h) = *size;
            let (x, y) = (anchor.x - w / 2.0, anchor.y - h / 2.0);
            if let Some(path) = rounded_rect(x, y, w, h, *corner_radius) {
                pixmap.fill_path(&path, &paint(*background), FillRule::Winding, identity, None);
            }
            if let Some(glyphs) = glyphs {
                let origin = Point::new(x + padding, y + padding);
                draw_text(pixmap, glyphs, origin, text, *font_size, *color);
            }
        }
    }
}

/// Source-over blend of `color` at `coverage` onto a premultiplied pixel.
fn blend(dst: PremultipliedColorU8, color: Rgba, coverage: f32) -> PremultipliedColorU8 {
    let sa = (color.a() as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    let inv = 1.0 - sa;
    let channel = |src: u8, dst: u8| (src as f32 * sa + dst as f32 * inv).round();
    let a = (255.0 * sa + dst.alpha() as f32 * inv).round().min(255.0) as u8;
    let r = channel(color.r(), dst.red()).min(a as f32) as u8;
    let g = channel(color.g(), dst.green()).min(a as f32) as u8;
    let b = channel(color.b(), dst.blue()).min(a as f32) as u8;
    PremultipliedColorU8::from_rgba(r, g, b, a).unwrap_or(dst)
}

fn draw_text(
    pixmap: &mut Pixmap,
    glyphs: &GlyphMetrics,
    origin: Point,
    text: &str,
    font_size: f32,
    color: Rgba,
) {
    let (layout, _) = glyphs.layout(text, font_size);
    let baseline = origin.y + glyphs.ascent(font_size);
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
    let pixels = pixmap.pixels_mut();

    for (glyph_id, x) in layout {
        let glyph =
            glyph_id.with_scale_and_position(font_size, ab_glyph::point(origin.x + x, baseline));
        let Some(outlined) = glyphs.font().outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let index = (py * width + px) as usize;
            pixels[index] = blend(pixels[index], color, coverage);
        });
    }
}
