// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the dress try-on service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-tryon-demo-overlay-2026-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "upload-validation",
    "heic-rejection",
    "garment-catalog",
    "garment-containment",
    "demo-overlay",
    "demo-echo",
    "openai-image-edits",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Dress Try-On {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Version info embedded in health responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
