// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;
use crate::garment::{list_garments, GarmentEntry};
use crate::version;

pub const SERVICE_BANNER: &str = "Canaanite Dress Try-On API";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentsResponse {
    pub dresses: Vec<GarmentEntry>,
}

/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVICE_BANNER.to_string(),
    })
}

/// GET /health - liveness only
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: version::VERSION_NUMBER.to_string(),
    })
}

/// GET /api/garments - catalog derived from the garment directory
pub async fn garments_handler(State(state): State<AppState>) -> Json<GarmentsResponse> {
    let dresses = list_garments(&state.config.garment_dir, &state.config.garment_public_prefix).await;
    Json(GarmentsResponse { dresses })
}
