// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on API endpoint module
//!
//! Provides POST /api/tryon for garment try-on from a multipart upload.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::tryon_handler;
pub use request::{FormError, TryOnForm};
pub use response::TryOnResponse;
