// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Demo overlay compositor
//!
//! Layers, in order: the garment scaled into 60% of the base and centred at
//! partial opacity, a radial vignette, and a "DEMO" badge in the top-left
//! corner. Output is always JPEG at quality 85.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::imaging::{decode_image_bytes, ImageError};

/// Largest share of the base image the garment may cover, per axis
pub const GARMENT_MAX_SCALE: f32 = 0.6;

/// JPEG quality of composited output
pub const OUTPUT_JPEG_QUALITY: u8 = 85;

/// Media type of composited output
pub const OUTPUT_MEDIA_TYPE: &str = "image/jpeg";

const VIGNETTE_INNER: f32 = 0.45;
const VIGNETTE_STRENGTH: f32 = 0.5;

const BADGE_MARGIN: u32 = 12;
const BADGE_BACKGROUND: [u8; 3] = [15, 23, 42];
const BADGE_BACKGROUND_ALPHA: f32 = 0.75;
const BADGE_TEXT: [u8; 3] = [255, 255, 255];

// 5x7 glyphs, one row per byte, low 5 bits used
const GLYPH_D: [u8; 7] = [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110];
const GLYPH_E: [u8; 7] = [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111];
const GLYPH_M: [u8; 7] = [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001];
const GLYPH_O: [u8; 7] = [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110];
const BADGE_GLYPHS: [[u8; 7]; 4] = [GLYPH_D, GLYPH_E, GLYPH_M, GLYPH_O];

/// Compositing failures; never surfaced to end users
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("user image could not be decoded: {0}")]
    BaseImage(ImageError),

    #[error("garment image could not be decoded: {0}")]
    GarmentImage(ImageError),

    #[error("failed to encode composite: {0}")]
    Encode(String),
}

/// An encoded image ready to be wrapped in a data URI
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Renders the demo overlay composite
#[derive(Debug, Clone, Copy)]
pub struct CompositeRenderer {
    opacity: f32,
}

impl Default for CompositeRenderer {
    fn default() -> Self {
        Self::new(0.55)
    }
}

impl CompositeRenderer {
    pub fn new(opacity: f32) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Composite `garment` over `base` and encode the result as JPEG
    pub fn render_overlay(
        &self,
        base: &[u8],
        garment: &[u8],
    ) -> Result<RenderedImage, CompositeError> {
        let base = decode_image_bytes(base).map_err(CompositeError::BaseImage)?;
        let garment = decode_image_bytes(garment).map_err(CompositeError::GarmentImage)?;

        let mut canvas = base.to_rgba8();
        self.overlay_garment(&mut canvas, &garment);
        apply_vignette(&mut canvas);
        draw_badge(&mut canvas);

        let (width, height) = canvas.dimensions();
        let bytes = encode_jpeg(canvas)?;
        debug!(
            "Demo overlay rendered: {}x{}, {} bytes",
            width,
            height,
            bytes.len()
        );

        Ok(RenderedImage {
            bytes,
            media_type: OUTPUT_MEDIA_TYPE,
            width,
            height,
        })
    }

    fn overlay_garment(&self, canvas: &mut RgbaImage, garment: &DynamicImage) {
        let (base_w, base_h) = canvas.dimensions();
        let garment = fit_garment(garment, base_w, base_h);
        let (gw, gh) = garment.dimensions();
        let offset_x = (base_w - gw) / 2;
        let offset_y = (base_h - gh) / 2;

        for (x, y, pixel) in garment.enumerate_pixels() {
            let alpha = (pixel[3] as f32 / 255.0) * self.opacity;
            if alpha <= 0.0 {
                continue;
            }
            let target = canvas.get_pixel_mut(offset_x + x, offset_y + y);
            blend(target, [pixel[0], pixel[1], pixel[2]], alpha);
        }
    }
}

/// Scale the garment down to fit within 60% of the base; never upscale
fn fit_garment(garment: &DynamicImage, base_w: u32, base_h: u32) -> RgbaImage {
    let max_w = ((base_w as f32 * GARMENT_MAX_SCALE) as u32).max(1);
    let max_h = ((base_h as f32 * GARMENT_MAX_SCALE) as u32).max(1);
    let (gw, gh) = garment.dimensions();

    if gw <= max_w && gh <= max_h {
        garment.to_rgba8()
    } else {
        garment.resize(max_w, max_h, FilterType::Triangle).to_rgba8()
    }
}

fn blend(target: &mut Rgba<u8>, source: [u8; 3], alpha: f32) {
    for channel in 0..3 {
        let mixed = target[channel] as f32 * (1.0 - alpha) + source[channel] as f32 * alpha;
        target[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Darken towards the corners; the centre is untouched
fn apply_vignette(canvas: &mut RgbaImage) {
    let (width, height) = canvas.dimensions();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let half_w = cx.max(1.0);
    let half_h = cy.max(1.0);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let dx = (x as f32 - cx) / half_w;
        let dy = (y as f32 - cy) / half_h;
        let distance = ((dx * dx + dy * dy) / 2.0).sqrt();
        let factor = 1.0 - VIGNETTE_STRENGTH * smoothstep(VIGNETTE_INNER, 1.0, distance);
        for channel in 0..3 {
            pixel[channel] = (pixel[channel] as f32 * factor).round() as u8;
        }
    }
}

/// Draw the "DEMO" badge at a fixed top-left position, clipped to the canvas
fn draw_badge(canvas: &mut RgbaImage) {
    let (width, height) = canvas.dimensions();
    let scale = (width.min(height) / 240).max(1);
    let padding = 3 * scale;
    let glyph_w = 5 * scale;
    let glyph_h = 7 * scale;
    let spacing = scale;
    let glyph_count = BADGE_GLYPHS.len() as u32;

    let badge_w = padding * 2 + glyph_count * glyph_w + (glyph_count - 1) * spacing;
    let badge_h = padding * 2 + glyph_h;
    let left = BADGE_MARGIN.min(width.saturating_sub(1));
    let top = BADGE_MARGIN.min(height.saturating_sub(1));
    let right = (left + badge_w).min(width);
    let bottom = (top + badge_h).min(height);

    for y in top..bottom {
        for x in left..right {
            blend(canvas.get_pixel_mut(x, y), BADGE_BACKGROUND, BADGE_BACKGROUND_ALPHA);
        }
    }

    for (index, glyph) in BADGE_GLYPHS.iter().enumerate() {
        let glyph_left = left + padding + index as u32 * (glyph_w + spacing);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (1 << (4 - col)) == 0 {
                    continue;
                }
                let px = glyph_left + col * scale;
                let py = top + padding + row as u32 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        let (x, y) = (px + sx, py + sy);
                        if x < right && y < bottom {
                            canvas.put_pixel(
                                x,
                                y,
                                Rgba([BADGE_TEXT[0], BADGE_TEXT[1], BADGE_TEXT[2], 255]),
                            );
                        }
                    }
                }
            }
        }
    }
}

fn encode_jpeg(canvas: RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, OUTPUT_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CompositeError::Encode(e.to_string()))?;
    Ok(bytes)
}
