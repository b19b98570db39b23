// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Parser;
use dress_tryon::{
    api::{start_server, AppState},
    cli::Cli,
    version,
};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting {}", version::get_version_string());

    let config = Cli::parse().into_config()?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    if !config.garment_dir.is_dir() {
        warn!(
            "Garment directory {} does not exist; every try-on will fail resolution",
            config.garment_dir.display()
        );
    }

    match &config.generation {
        Some(generation) => info!(
            "Real try-on enabled (model: {}, timeout: {:?})",
            generation.model, generation.timeout
        ),
        None => info!("OPENAI_API_KEY not set; serving demo try-ons only"),
    }

    let state = AppState::from_config(config)?;
    start_server(state).await
}
