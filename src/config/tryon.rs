// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the try-on service
//!
//! Everything the pipeline needs is carried in [`TryOnConfig`] and handed to
//! it at construction. Whether real generation is available is decided by
//! `generation` being `Some`, never by reading the environment per request.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default upload ceiling (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default image model for try-on edits
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1.5";

/// Default generation API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Configuration for the try-on service
#[derive(Debug, Clone)]
pub struct TryOnConfig {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// Trusted directory holding garment images
    pub garment_dir: PathBuf,
    /// URL prefix the catalog publishes garment files under
    pub garment_public_prefix: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Opacity used when blending the garment in demo overlays
    pub overlay_opacity: f32,
    /// External image-edit service; `None` means real mode is unavailable
    pub generation: Option<GenerationConfig>,
}

/// Connection settings for the external image-edit service
#[derive(Clone)]
pub struct GenerationConfig {
    /// Bearer token for the service
    pub api_key: String,
    /// Base URL without trailing slash
    pub base_url: String,
    /// Model used for edits
    pub model: String,
    /// Upper bound for a single edit call
    pub timeout: Duration,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GenerationConfig {
    /// Build a generation config from an API key, using defaults for the rest
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Load from environment; `None` when `OPENAI_API_KEY` is unset or blank
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            api_key: api_key.trim().to_string(),
            base_url: env::var("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: env::var("OPENAI_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
            timeout: Duration::from_secs(
                env::var("OPENAI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
            ),
        })
    }
}

impl TryOnConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(4000);
        let listen_addr = format!("{}:{}", host, port)
            .parse()
            .unwrap_or(defaults.listen_addr);

        Self {
            listen_addr,
            garment_dir: env::var("GARMENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.garment_dir),
            garment_public_prefix: env::var("GARMENT_PUBLIC_PREFIX")
                .unwrap_or(defaults.garment_public_prefix),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            overlay_opacity: env::var("DEMO_OVERLAY_OPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.overlay_opacity),
            generation: GenerationConfig::from_env(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_upload_bytes == 0 {
            return Err("Max upload size must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(format!(
                "Overlay opacity must be between 0 and 1, got {}",
                self.overlay_opacity
            ));
        }
        if !self.garment_public_prefix.starts_with('/') {
            return Err("Garment public prefix must start with '/'".to_string());
        }
        if let Some(generation) = &self.generation {
            if generation.timeout.is_zero() {
                return Err("Generation timeout must be greater than 0".to_string());
            }
            if !generation.base_url.starts_with("http://")
                && !generation.base_url.starts_with("https://")
            {
                return Err(format!(
                    "Generation base URL must be http(s), got '{}'",
                    generation.base_url
                ));
            }
        }
        Ok(())
    }

    /// Whether the external image-edit capability is configured
    pub fn generation_configured(&self) -> bool {
        self.generation.is_some()
    }

    /// Config rooted at `garment_dir` with generation disabled
    pub fn for_garment_dir(garment_dir: impl Into<PathBuf>) -> Self {
        Self {
            garment_dir: garment_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            garment_dir: PathBuf::from("./public/assets/dresses"),
            garment_public_prefix: "/assets/dresses".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            overlay_opacity: 0.55,
            generation: None,
        }
    }
}
