// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image payload helpers shared by the validator, compositor and generation client

pub mod image_utils;

pub use image_utils::{
    decode_image_bytes, detect_format, extension_to_media_type, format_to_media_type,
    is_heif_family, normalize_media_type, parse_data_uri, to_data_uri, ImageError,
    ALLOWED_MEDIA_TYPES,
};
