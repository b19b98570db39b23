// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use super::handlers::{garments_handler, health_handler, root_handler};
use super::tryon::tryon_handler;
use crate::config::TryOnConfig;
use crate::tryon::TryOnPipeline;

/// Multipart framing and the text fields on top of two uploads' worth of bytes
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TryOnPipeline>,
    pub config: Arc<TryOnConfig>,
}

impl AppState {
    pub fn new(config: TryOnConfig, pipeline: TryOnPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }

    /// Build state with the pipeline derived from `config`
    pub fn from_config(config: TryOnConfig) -> anyhow::Result<Self> {
        let pipeline = TryOnPipeline::new(&config)?;
        Ok(Self::new(config, pipeline))
    }
}

/// Request body ceiling; above the upload limit so oversize uploads reach the validator
pub fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_HEADROOM)
}

pub fn create_app(state: AppState) -> Router {
    let limit = body_limit(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/garments", get(garments_handler))
        .route("/api/tryon", post(tryon_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false)),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.listen_addr;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Try-on API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
