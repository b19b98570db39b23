// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Real try-on generation via an OpenAI-compatible image-edit service

pub mod client;

pub use client::{
    EditImage, GeneratedImage, GenerationError, ImageEditRequest, ImageEditor, OpenAIImageEditor,
    TRYON_PROMPT,
};

#[cfg(test)]
pub use client::MockImageEditor;
