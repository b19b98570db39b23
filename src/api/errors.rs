// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::tryon::{user_message_for, TryOnError};

/// JSON body returned for every failed try-on request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn from_code(code: &str) -> Self {
        Self {
            ok: false,
            error: user_message_for(code).to_string(),
            code: code.to_string(),
        }
    }
}

impl From<&TryOnError> for ErrorResponse {
    fn from(err: &TryOnError) -> Self {
        Self {
            ok: false,
            error: err.user_message().to_string(),
            code: err.code().to_string(),
        }
    }
}

impl IntoResponse for TryOnError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
