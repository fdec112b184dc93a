//! Raster drawing surface with clipped primitives and bitmap text

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};

use super::font::{self, ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([33, 33, 33]);
pub const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const AXIS: Rgb<u8> = Rgb([120, 120, 120]);
pub const MUTED: Rgb<u8> = Rgb([200, 200, 200]);
pub const ACCENT: Rgb<u8> = Rgb([49, 114, 176]);
pub const HEADER: Rgb<u8> = Rgb([64, 64, 64]);
pub const STRIPE: Rgb<u8> = Rgb([245, 245, 245]);

/// An RGB image that silently clips anything drawn outside its bounds
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Rgb<u8>) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.width() as i64);
        let y1 = (y + height).min(self.height() as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px as u32, py as u32, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Rgb<u8>) {
        self.line(x, y, x + width - 1, y, color);
        self.line(x, y + height - 1, x + width - 1, y + height - 1, color);
        self.line(x, y, x, y + height - 1, color);
        self.line(x + width - 1, y, x + width - 1, y + height - 1, color);
    }

    /// Bresenham line between two points, inclusive
    pub fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;

        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Line drawn `thickness` pixels wide by offsetting copies vertically
    pub fn thick_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, thickness: i64, color: Rgb<u8>) {
        let half = thickness / 2;
        for offset in -half..=half {
            self.line(x0, y0 + offset, x1, y1 + offset, color);
        }
    }

    /// Draw text with its top-left corner at (x, y)
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale.max(1) as i64;
        let mut cursor = x;
        for c in text.chars() {
            let rows = font::glyph(c);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            cursor + col as i64 * scale,
                            y + row as i64 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            cursor += ADVANCE as i64 * scale;
        }
    }

    /// Draw text centered on `cx`
    pub fn text_centered(&mut self, cx: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let width = font::text_width(text, scale) as i64;
        self.text(cx - width / 2, y, text, scale, color);
    }

    /// Draw text ending at `right`
    pub fn text_right(&mut self, right: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let width = font::text_width(text, scale) as i64;
        self.text(right - width, y, text, scale, color);
    }

    /// Draw text bottom-to-top, rotated a quarter turn counter-clockwise
    pub fn text_vertical(&mut self, x: i64, bottom: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let s = scale.max(1) as i64;
        let mut cursor = bottom;
        for c in text.chars() {
            let rows = font::glyph(c);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            x + row as i64 * s,
                            cursor - (col as i64 + 1) * s,
                            s,
                            s,
                            color,
                        );
                    }
                }
            }
            cursor -= ADVANCE as i64 * s;
        }
    }

    /// Write the canvas as a PNG file
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write image to {}", path.display()))
    }
}

/// Line height for text at `scale`, including padding
pub fn line_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale + 2 * scale
}

/// Blend two colors; `t = 0` gives `from`, `t = 1` gives `to`
pub fn lerp(from: Rgb<u8>, to: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Rgb([mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2])])
}

/// Pick black or white text for legibility on `background`
pub fn contrast_text(background: Rgb<u8>) -> Rgb<u8> {
    let luma = 0.299 * background[0] as f64 + 0.587 * background[1] as f64 + 0.114 * background[2] as f64;
    if luma > 140.0 {
        BLACK
    } else {
        WHITE
    }
}
