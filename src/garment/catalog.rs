// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Garment catalog listing derived from the garment directory

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::resolver::{is_safe_identifier, GARMENT_EXTENSIONS};

/// One selectable garment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarmentEntry {
    /// Stable identifier: the file name without extension
    pub id: String,
    /// Human readable title
    pub title: String,
    pub description: String,
    /// Public URL of the garment image
    pub src: String,
}

/// Turn `linen_blue-dress` into `Linen Blue Dress`
pub fn humanize_filename(id: &str) -> String {
    id.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn catalog_entry(filename: &str, public_prefix: &str) -> Option<GarmentEntry> {
    if filename.starts_with('.') {
        return None;
    }
    let (id, ext) = filename.rsplit_once('.')?;
    if id.is_empty() || !GARMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
        return None;
    }
    // Only publish ids the resolver accepts
    if !is_safe_identifier(id) {
        debug!("Skipping garment {} with an unaddressable id", filename);
        return None;
    }
    let title = humanize_filename(id);
    Some(GarmentEntry {
        id: id.to_string(),
        description: format!("Reconstructed dress: {}", title),
        title,
        src: format!("{}/{}", public_prefix.trim_end_matches('/'), filename),
    })
}

/// List garments in `dir`, sorted by file name
///
/// Files whose stem is not a valid garment identifier are left out, so every
/// listed id resolves by itself. An unreadable directory yields an empty
/// catalog.
pub async fn list_garments(dir: &Path, public_prefix: &str) -> Vec<GarmentEntry> {
    let mut reader = match tokio::fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) => {
            error!("Error loading garments from {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut filenames = Vec::new();
    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let is_file = entry
                    .file_type()
                    .await
                    .map(|t| t.is_file())
                    .unwrap_or(false);
                if !is_file {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str() {
                    filenames.push(name.to_string());
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Error reading garment directory entry: {}", e);
                break;
            }
        }
    }
    filenames.sort();

    filenames
        .iter()
        .filter_map(|name| catalog_entry(name, public_prefix))
        .collect()
}
