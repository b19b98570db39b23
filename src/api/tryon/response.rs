// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on response types

use serde::Serialize;

use crate::tryon::{TryOnResult, TryOnStatus};

/// Body of a successful (HTTP 200) try-on response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnResponse {
    pub ok: bool,
    /// `generated`, `demo_overlay`, `demo_echo` or `demo_fallback`
    pub status: TryOnStatus,
    /// Result image as a data URI
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dress_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dress_src: Option<String>,
    /// Degradation notice; present only for `demo_fallback`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TryOnResult> for TryOnResponse {
    fn from(result: TryOnResult) -> Self {
        Self {
            ok: true,
            status: result.status,
            image: result.image,
            dress_id: result.dress_id,
            dress_src: result.dress_src,
            error: result.warning,
        }
    }
}
