// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod tryon;

pub use tryon::{GenerationConfig, TryOnConfig, DEFAULT_MAX_UPLOAD_BYTES};
