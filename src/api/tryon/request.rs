// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on multipart form parsing

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Multipart;
use thiserror::Error;
use tracing::debug;

use crate::api::errors::ErrorResponse;
use crate::garment::GarmentReference;
use crate::tryon::{ModeFlags, TryOnRequest, UploadedImage};

/// Media type assumed when the client omits one for the upload part
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Failures reading the multipart body itself
#[derive(Debug, Error)]
pub enum FormError {
    #[error("request body exceeds the upload limit")]
    TooLarge,

    #[error("malformed multipart body: {0}")]
    Malformed(String),
}

impl FormError {
    pub fn code(&self) -> &'static str {
        match self {
            FormError::TooLarge => "file_too_large",
            FormError::Malformed(_) => "missing_user_image",
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::from_code(self.code())),
        )
            .into_response()
    }
}

/// Fields of a `POST /api/tryon` form
///
/// - `userImage`: the photo (file part)
/// - `dressId`: garment identifier
/// - `dressSrc`: garment path hint
/// - `demoMode`: `"true"` forces demo, `"false"` requests real generation
/// - `demoOverlay`: `"false"` echoes the upload in demo mode
#[derive(Debug, Clone, Default)]
pub struct TryOnForm {
    pub user_image: Option<UploadedImage>,
    pub dress_id: Option<String>,
    pub dress_src: Option<String>,
    pub demo_mode: Option<String>,
    pub demo_overlay: Option<String>,
}

impl TryOnForm {
    /// Read every field of the form; unknown fields are skipped
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut form = TryOnForm::default();

        while let Some(field) = multipart.next_field().await.map_err(classify)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "userImage" => {
                    let media_type = field
                        .content_type()
                        .unwrap_or(UNKNOWN_MEDIA_TYPE)
                        .to_string();
                    let filename = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await.map_err(classify)?;
                    let mut upload = UploadedImage::new(bytes, media_type);
                    if let Some(filename) = filename {
                        upload = upload.with_filename(filename);
                    }
                    form.user_image = Some(upload);
                }
                "dressId" => form.dress_id = Some(field.text().await.map_err(classify)?),
                "dressSrc" => form.dress_src = Some(field.text().await.map_err(classify)?),
                "demoMode" => form.demo_mode = Some(field.text().await.map_err(classify)?),
                "demoOverlay" => {
                    form.demo_overlay = Some(field.text().await.map_err(classify)?)
                }
                other => debug!("Ignoring unknown try-on form field: {}", other),
            }
        }

        Ok(form)
    }

    pub fn into_request(self) -> TryOnRequest {
        let flags = ModeFlags::from_form(self.demo_mode.as_deref(), self.demo_overlay.as_deref());
        TryOnRequest {
            upload: self.user_image,
            garment: GarmentReference::new(non_blank(self.dress_id), non_blank(self.dress_src)),
            flags,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn classify(err: axum_extra::extract::multipart::MultipartError) -> FormError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FormError::TooLarge
    } else {
        FormError::Malformed(err.body_text())
    }
}
