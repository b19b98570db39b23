// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod garment;
pub mod generation;
pub mod imaging;
pub mod tryon;
pub mod version;

pub use config::{GenerationConfig, TryOnConfig};
pub use garment::{GarmentFile, GarmentReference, GarmentResolver, ResolutionError};
pub use generation::{GenerationError, ImageEditor, OpenAIImageEditor};
pub use tryon::{TryOnError, TryOnPipeline, TryOnRequest, TryOnResult, TryOnStatus};
