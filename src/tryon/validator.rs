// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload validation
//!
//! Runs before any garment lookup or generation work. Checks, in order:
//! presence, HEIC/HEIF/AVIF (declared type, file suffix or ftyp brand),
//! declared media type against the allow-list, then size.

use bytes::Bytes;
use thiserror::Error;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::imaging::{is_heif_family, normalize_media_type, ALLOWED_MEDIA_TYPES};

const HEIF_FAMILY_MARKERS: &[&str] = &["heic", "heif", "avif"];

/// The user photo as received, owned by a single request
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Raw file bytes
    pub bytes: Bytes,
    /// Media type declared by the client
    pub media_type: String,
    /// File name declared by the client
    pub filename: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Declared media type, lowercased with `image/jpg` folded into `image/jpeg`
    pub fn normalized_media_type(&self) -> String {
        normalize_media_type(&self.media_type)
    }

    fn is_heif_family(&self) -> bool {
        let declared = self.media_type.to_ascii_lowercase();
        if HEIF_FAMILY_MARKERS.iter().any(|m| declared.contains(m)) {
            return true;
        }
        let filename = self.filename.as_deref().unwrap_or_default().to_ascii_lowercase();
        if HEIF_FAMILY_MARKERS
            .iter()
            .any(|m| filename.ends_with(&format!(".{}", m)))
        {
            return true;
        }
        is_heif_family(&self.bytes)
    }
}

/// Reasons an upload is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no user image was uploaded")]
    MissingUserImage,

    #[error("unsupported input type: {0}")]
    UnsupportedInputType(String),

    #[error("upload is too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },
}

impl ValidationError {
    /// Stable error code returned to callers
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingUserImage => "missing_user_image",
            ValidationError::UnsupportedInputType(_) => "unsupported_input_type",
            ValidationError::FileTooLarge { .. } => "file_too_large",
        }
    }
}

/// Validates uploads against the configured size ceiling
#[derive(Debug, Clone, Copy)]
pub struct InputValidator {
    max_bytes: usize,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl InputValidator {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Accept or reject an upload; pure and side-effect free
    pub fn validate<'a>(
        &self,
        upload: Option<&'a UploadedImage>,
    ) -> Result<&'a UploadedImage, ValidationError> {
        let upload = match upload {
            Some(upload) if !upload.is_empty() => upload,
            _ => return Err(ValidationError::MissingUserImage),
        };

        if upload.is_heif_family() {
            return Err(ValidationError::UnsupportedInputType(
                "HEIC/HEIF/AVIF".to_string(),
            ));
        }

        let media_type = upload.normalized_media_type();
        if !ALLOWED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(ValidationError::UnsupportedInputType(media_type));
        }

        if upload.len() > self.max_bytes {
            return Err(ValidationError::FileTooLarge {
                size: upload.len(),
                max: self.max_bytes,
            });
        }

        Ok(upload)
    }
}
