// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on endpoint handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use super::request::{FormError, TryOnForm};
use super::response::TryOnResponse;
use crate::api::http_server::AppState;

/// POST /api/tryon - Render a garment onto an uploaded photo
///
/// Pipeline:
/// 1. Parse the multipart form (oversized body -> `file_too_large`)
/// 2. Validate the upload (400)
/// 3. Resolve the garment inside the trusted directory (400)
/// 4. Select demo or real mode (503 if real is required but unconfigured)
/// 5. Generate, overlay or echo; generation failures are 502
/// 6. Return `{ok, status, image, dressId, dressSrc}`
pub async fn tryon_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("tryon", request_id = %request_id);

    async move {
        let multipart = match multipart {
            Ok(multipart) => multipart,
            Err(e) => {
                warn!("Try-on request is not multipart: {}", e);
                return FormError::Malformed(e.to_string()).into_response();
            }
        };

        let form = match TryOnForm::from_multipart(multipart).await {
            Ok(form) => form,
            Err(e) => {
                warn!("Try-on form rejected: {}", e);
                return e.into_response();
            }
        };

        debug!(
            "Try-on request received: dress_id={:?}, dress_src={:?}, demo_mode={:?}, demo_overlay={:?}",
            form.dress_id, form.dress_src, form.demo_mode, form.demo_overlay
        );

        match state.pipeline.process(form.into_request()).await {
            Ok(result) => Json(TryOnResponse::from(result)).into_response(),
            Err(e) => {
                warn!(code = e.code(), "Try-on request failed: {}", e);
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
