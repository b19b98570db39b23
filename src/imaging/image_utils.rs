// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image format sniffing, media-type helpers and data URI encoding

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Errors raised while decoding image payloads
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Media types accepted for uploads and garments
pub const ALLOWED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Detect image format from magic bytes
///
/// Only the formats the try-on pipeline can composite are recognised.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Check for an ISO-BMFF `ftyp` box with a HEIC/HEIF/AVIF brand
///
/// Phones commonly upload these with a `.jpg` name or an `image/jpeg` type.
pub fn is_heif_family(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &bytes[8..12],
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"mif1" | b"msf1" | b"avif"
            | b"avis"
    )
}

/// Normalise a declared media type (lowercase, parameters dropped, `image/jpg` folded)
pub fn normalize_media_type(media_type: &str) -> String {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

/// Get the media type for a detected format
pub fn format_to_media_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Map a file extension (without the dot, any case) to a media type
pub fn extension_to_media_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Decode raw image bytes, sniffing the container from its magic bytes
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let format = detect_format(bytes)?;
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))
}

/// Build a `data:<media>;base64,<payload>` URI
pub fn to_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Build a data URI from an already base64-encoded payload
pub fn to_data_uri_from_base64(media_type: &str, base64_payload: &str) -> String {
    format!("data:{};base64,{}", media_type, base64_payload)
}

/// Split a base64 data URI into its media type and decoded bytes
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or(ImageError::UnsupportedFormat)?;
    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or(ImageError::UnsupportedFormat)?;
    let bytes = STANDARD.decode(payload)?;
    Ok((media_type.to_string(), bytes))
}
