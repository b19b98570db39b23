// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Virtual try-on: upload validation, mode selection, demo compositing and
//! the request pipeline tying them to garment resolution and generation.

pub mod composite;
pub mod errors;
pub mod mode;
pub mod pipeline;
pub mod validator;

pub use composite::{CompositeError, CompositeRenderer, RenderedImage};
pub use errors::{user_message_for, TryOnError};
pub use mode::{DemoFlag, ModeFlags, TryOnMode, TryOnStatus};
pub use pipeline::{TryOnPipeline, TryOnRequest, TryOnResult, OVERLAY_DEGRADED_WARNING};
pub use validator::{InputValidator, UploadedImage, ValidationError};
