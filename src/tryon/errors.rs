// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on failure taxonomy
//!
//! Every failure maps to one stable code and one HTTP status. The friendly
//! message is fixed per code so no path, upstream body or trace reaches the
//! caller.

use thiserror::Error;

use super::validator::ValidationError;
use crate::garment::ResolutionError;
use crate::generation::GenerationError;

/// Terminal failures of a try-on request
#[derive(Debug, Error)]
pub enum TryOnError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("garment resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("real try-on requested but no image service is configured")]
    GenerationUnavailable,

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl TryOnError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TryOnError::Validation(e) => e.code(),
            TryOnError::Resolution(e) => e.code(),
            TryOnError::GenerationUnavailable => "openai_not_configured",
            TryOnError::Generation(e) => e.code(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            TryOnError::Validation(_) | TryOnError::Resolution(_) => 400,
            TryOnError::GenerationUnavailable => 503,
            TryOnError::Generation(_) => 502,
        }
    }

    /// Message safe to show end users
    pub fn user_message(&self) -> &'static str {
        user_message_for(self.code())
    }
}

/// Friendly message for a stable error code
pub fn user_message_for(code: &str) -> &'static str {
    match code {
        "missing_user_image" => "Please upload a photo to continue.",
        "unsupported_input_type" => "Please upload a JPG, JPEG, PNG, or WebP image.",
        "file_too_large" => "Images must be 5MB or smaller.",
        "invalid_dress_id" => "Selected dress could not be found.",
        "invalid_dress_path" => "Selected dress path is invalid.",
        "invalid_dress_ext" => "The selected dress file type is not supported.",
        "dress_not_found" => "We could not find that dress. Please pick another one.",
        "empty_dress_image" => "The selected dress file seems empty.",
        "openai_not_configured" => {
            "Real try-on is not available right now. Please check the server setup."
        }
        "no_image" => "The try-on did not return an image. Please try again.",
        "openai_error" => {
            "We had trouble generating your try-on. Please try again in a moment."
        }
        _ => "Something went wrong. Please try again.",
    }
}
