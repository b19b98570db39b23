// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod tryon;

pub use errors::ErrorResponse;
pub use handlers::{GarmentsResponse, HealthResponse, RootResponse, SERVICE_BANNER};
pub use http_server::{create_app, start_server, AppState};
pub use tryon::{tryon_handler, TryOnForm, TryOnResponse};
