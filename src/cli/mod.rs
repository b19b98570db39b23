// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::TryOnConfig;

/// Dress try-on API server
#[derive(Parser, Debug, Default)]
#[command(name = "dress-tryon")]
#[command(version)]
#[command(about = "Virtual dress try-on API with demo compositing fallback", long_about = None)]
pub struct Cli {
    /// Interface to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Trusted directory holding garment images
    #[arg(long, env = "GARMENT_DIR")]
    pub garment_dir: Option<PathBuf>,

    /// URL prefix garment files are published under
    #[arg(long, env = "GARMENT_PUBLIC_PREFIX")]
    pub garment_public_prefix: Option<String>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Garment opacity in demo overlays (0.0 - 1.0)
    #[arg(long, env = "DEMO_OVERLAY_OPACITY")]
    pub overlay_opacity: Option<f32>,

    /// Never call the image-edit service, even when an API key is set
    #[arg(long)]
    pub demo_only: bool,
}

impl Cli {
    /// Environment config with command-line overrides applied
    pub fn into_config(self) -> Result<TryOnConfig> {
        self.apply(TryOnConfig::from_env())
    }

    pub fn apply(self, mut config: TryOnConfig) -> Result<TryOnConfig> {
        if self.host.is_some() || self.port.is_some() {
            let host = self
                .host
                .unwrap_or_else(|| config.listen_addr.ip().to_string());
            let port = self.port.unwrap_or(config.listen_addr.port());
            config.listen_addr = format!("{}:{}", host, port)
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
        }
        if let Some(dir) = self.garment_dir {
            config.garment_dir = dir;
        }
        if let Some(prefix) = self.garment_public_prefix {
            config.garment_public_prefix = prefix;
        }
        if let Some(max) = self.max_upload_bytes {
            config.max_upload_bytes = max;
        }
        if let Some(opacity) = self.overlay_opacity {
            config.overlay_opacity = opacity;
        }
        if self.demo_only {
            config.generation = None;
        }
        Ok(config)
    }
}
