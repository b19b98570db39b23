// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Garment reference resolution
//!
//! A garment is referenced by an identifier (`linen-blue`), a path hint as
//! published by the catalog (`/assets/dresses/linen-blue.jpg`), or both.
//! Resolution order:
//! 1. A supplied identifier must match `^[A-Za-z0-9_-]+$`.
//! 2. `<root>/<id>.<ext>` is probed for each allowed extension, matching the
//!    extension in any case; the first regular file wins.
//! 3. Otherwise the hint is checked lexically, normalised, canonicalised and
//!    required to stay inside the trusted root.
//! 4. The resolved extension must be allowed, and the file must be non-empty.
//!
//! Every candidate is canonicalised before use, so symlinks pointing out of
//! the root are refused just like `..` segments.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use super::containment::{is_descendant_of, is_plain_relative};
use crate::imaging::extension_to_media_type;

/// File extensions accepted for garment images, in probe order
pub const GARMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Failures while resolving a garment reference
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("garment identifier contains unsupported characters")]
    InvalidId,

    #[error("garment path is not allowed")]
    InvalidPath,

    #[error("garment file type is not allowed")]
    InvalidExtension,

    #[error("garment not found")]
    NotFound,

    #[error("garment image is empty")]
    EmptyImage,
}

impl ResolutionError {
    /// Stable error code returned to callers
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::InvalidId => "invalid_dress_id",
            ResolutionError::InvalidPath => "invalid_dress_path",
            ResolutionError::InvalidExtension => "invalid_dress_ext",
            ResolutionError::NotFound => "dress_not_found",
            ResolutionError::EmptyImage => "empty_dress_image",
        }
    }
}

/// Garment reference as submitted by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarmentReference {
    /// Catalog identifier (`dressId`)
    pub id: Option<String>,
    /// Relative path hint (`dressSrc`)
    pub src: Option<String>,
}

impl GarmentReference {
    pub fn new(id: Option<String>, src: Option<String>) -> Self {
        Self { id, src }
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            src: None,
        }
    }

    pub fn from_src(src: impl Into<String>) -> Self {
        Self {
            id: None,
            src: Some(src.into()),
        }
    }

    fn id(&self) -> Option<&str> {
        non_blank(self.id.as_deref())
    }

    fn src(&self) -> Option<&str> {
        non_blank(self.src.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A garment image loaded from inside the trusted root
#[derive(Debug, Clone)]
pub struct GarmentFile {
    /// Canonical absolute path
    pub path: PathBuf,
    /// File contents (never empty)
    pub bytes: Vec<u8>,
    /// Media type derived from the extension
    pub media_type: &'static str,
}

impl GarmentFile {
    /// File name without extension
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }
}

/// Check an identifier against the safe-character pattern
pub fn is_safe_identifier(id: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern"))
        .is_match(id)
}

fn has_allowed_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    let lower = ext.to_ascii_lowercase();
    if GARMENT_EXTENSIONS.contains(&lower.as_str()) {
        extension_to_media_type(&lower)
    } else {
        None
    }
}

/// Resolves garment references to files inside a trusted root
#[derive(Debug, Clone)]
pub struct GarmentResolver {
    root: PathBuf,
    public_prefix: String,
}

impl GarmentResolver {
    /// Create a resolver rooted at `root`
    ///
    /// The root is canonicalised once here. A missing directory is tolerated
    /// (every lookup then reports `dress_not_found`).
    pub fn new(root: impl AsRef<Path>, public_prefix: impl Into<String>) -> Self {
        let root = root.as_ref();
        let root = match std::fs::canonicalize(root) {
            Ok(canonical) => canonical,
            Err(e) => {
                warn!("Garment directory {} is not accessible: {}", root.display(), e);
                if root.is_absolute() {
                    root.to_path_buf()
                } else {
                    std::env::current_dir()
                        .map(|cwd| cwd.join(root))
                        .unwrap_or_else(|_| root.to_path_buf())
                }
            }
        };
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();

        Self {
            root,
            public_prefix,
        }
    }

    /// Canonical trusted root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference and load the garment bytes
    pub async fn resolve(
        &self,
        reference: &GarmentReference,
    ) -> Result<GarmentFile, ResolutionError> {
        let id = reference.id();
        if let Some(id) = id {
            if !is_safe_identifier(id) {
                debug!("Rejected garment identifier with unsafe characters");
                return Err(ResolutionError::InvalidId);
            }
        }

        let mut resolved = None;
        if let Some(id) = id {
            resolved = self.probe_identifier(id).await?;
        }
        if resolved.is_none() {
            if let Some(src) = reference.src() {
                resolved = Some(self.resolve_hint(src).await?);
            }
        }

        let path = resolved.ok_or(ResolutionError::NotFound)?;
        self.load(path).await
    }

    /// Resolve to a canonical path only, without reading the file
    pub async fn resolve_path(
        &self,
        reference: &GarmentReference,
    ) -> Result<PathBuf, ResolutionError> {
        self.resolve(reference).await.map(|file| file.path)
    }

    async fn probe_identifier(&self, id: &str) -> Result<Option<PathBuf>, ResolutionError> {
        for name in self.identifier_candidates(id).await {
            let candidate = self.root.join(&name);
            let Ok(canonical) = tokio::fs::canonicalize(&candidate).await else {
                continue;
            };
            if !is_descendant_of(&canonical, &self.root) {
                warn!("Garment identifier {} resolves outside the garment root", id);
                return Err(ResolutionError::InvalidPath);
            }
            match tokio::fs::metadata(&canonical).await {
                Ok(meta) if meta.is_file() => return Ok(Some(canonical)),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Root entries named `<id>.<ext>` with an allowed extension in any case,
    /// ordered by extension probe order
    async fn identifier_candidates(&self, id: &str) -> Vec<String> {
        let mut reader = match tokio::fs::read_dir(&self.root).await {
            Ok(reader) => reader,
            Err(e) => {
                debug!("Garment root is not listable: {}", e);
                return Vec::new();
            }
        };

        let mut ranked = Vec::new();
        while let Ok(Some(entry)) = reader.next_entry().await {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Some((stem, ext)) = name.rsplit_once('.') else {
                continue;
            };
            if stem != id {
                continue;
            }
            let ext = ext.to_ascii_lowercase();
            if let Some(rank) = GARMENT_EXTENSIONS.iter().position(|e| *e == ext) {
                ranked.push((rank, name));
            }
        }
        ranked.sort();
        ranked.into_iter().map(|(_, name)| name).collect()
    }

    async fn resolve_hint(&self, hint: &str) -> Result<PathBuf, ResolutionError> {
        if hint.contains("..") || hint.contains('\\') || hint.contains('\0') {
            return Err(ResolutionError::InvalidPath);
        }

        let relative = self.normalize_hint(hint);
        let relative = Path::new(relative);
        if !is_plain_relative(relative) {
            return Err(ResolutionError::InvalidPath);
        }
        if has_allowed_extension(relative).is_none() {
            return Err(ResolutionError::InvalidExtension);
        }

        let candidate = self.root.join(relative);
        let canonical = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|_| ResolutionError::NotFound)?;
        if !is_descendant_of(&canonical, &self.root) {
            warn!("Garment path hint escapes the garment root");
            return Err(ResolutionError::InvalidPath);
        }

        match tokio::fs::metadata(&canonical).await {
            Ok(meta) if meta.is_file() => Ok(canonical),
            _ => Err(ResolutionError::NotFound),
        }
    }

    /// Strip the public URL prefix, query string and leading slashes
    fn normalize_hint<'a>(&self, hint: &'a str) -> &'a str {
        let hint = hint.split(['?', '#']).next().unwrap_or_default();
        let hint = if self.public_prefix.is_empty() {
            hint
        } else {
            hint.strip_prefix(self.public_prefix.as_str())
                .filter(|rest| rest.starts_with('/'))
                .unwrap_or(hint)
        };
        hint.trim_start_matches('/')
    }

    async fn load(&self, path: PathBuf) -> Result<GarmentFile, ResolutionError> {
        let media_type = has_allowed_extension(&path).ok_or(ResolutionError::InvalidExtension)?;

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            warn!("Failed to read garment file: {}", e);
            ResolutionError::NotFound
        })?;
        if bytes.is_empty() {
            return Err(ResolutionError::EmptyImage);
        }

        Ok(GarmentFile {
            path,
            bytes,
            media_type,
        })
    }
}
