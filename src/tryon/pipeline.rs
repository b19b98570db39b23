// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on request pipeline
//!
//! validate upload → resolve garment → select mode → generate | overlay | echo
//!
//! Exactly one image comes back per request. Validation and resolution
//! failures stop the pipeline before any rendering or network work. Overlay
//! failures never fail the request: the original upload is echoed back with
//! a `demo_fallback` status and a warning.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::composite::CompositeRenderer;
use super::errors::TryOnError;
use super::mode::{ModeFlags, TryOnMode, TryOnStatus};
use super::validator::{InputValidator, UploadedImage};
use crate::config::TryOnConfig;
use crate::garment::{GarmentFile, GarmentReference, GarmentResolver};
use crate::generation::{EditImage, ImageEditRequest, ImageEditor, OpenAIImageEditor};
use crate::imaging::{detect_format, format_to_media_type, to_data_uri};

/// Warning attached to `demo_fallback` results
pub const OVERLAY_DEGRADED_WARNING: &str =
    "Demo overlay could not be rendered; returning the original photo.";

/// One try-on call, owned by the request
#[derive(Debug, Clone, Default)]
pub struct TryOnRequest {
    pub upload: Option<UploadedImage>,
    pub garment: GarmentReference,
    pub flags: ModeFlags,
}

/// Successful outcome of a try-on call
#[derive(Debug, Clone)]
pub struct TryOnResult {
    pub status: TryOnStatus,
    /// Image as a data URI
    pub image: String,
    pub dress_id: Option<String>,
    pub dress_src: Option<String>,
    /// Set when the request degraded but still produced an image
    pub warning: Option<String>,
}

/// The try-on pipeline with all collaborators injected at construction
pub struct TryOnPipeline {
    validator: InputValidator,
    resolver: GarmentResolver,
    compositor: CompositeRenderer,
    editor: Option<Arc<dyn ImageEditor>>,
    public_prefix: String,
}

impl TryOnPipeline {
    /// Build the pipeline; the image-edit client exists only when configured
    pub fn new(config: &TryOnConfig) -> anyhow::Result<Self> {
        let editor = match &config.generation {
            Some(generation) => {
                Some(Arc::new(OpenAIImageEditor::new(generation)?) as Arc<dyn ImageEditor>)
            }
            None => None,
        };
        Ok(Self::with_editor(config, editor))
    }

    /// Build the pipeline with an explicit editor (or none)
    pub fn with_editor(config: &TryOnConfig, editor: Option<Arc<dyn ImageEditor>>) -> Self {
        Self {
            validator: InputValidator::new(config.max_upload_bytes),
            resolver: GarmentResolver::new(&config.garment_dir, config.garment_public_prefix.clone()),
            compositor: CompositeRenderer::new(config.overlay_opacity),
            editor,
            public_prefix: config.garment_public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn generation_configured(&self) -> bool {
        self.editor.is_some()
    }

    pub fn resolver(&self) -> &GarmentResolver {
        &self.resolver
    }

    /// Run one try-on request to completion
    pub async fn process(&self, request: TryOnRequest) -> Result<TryOnResult, TryOnError> {
        let upload = self.validator.validate(request.upload.as_ref())?;
        let garment = self.resolver.resolve(&request.garment).await?;
        let mode = TryOnMode::select(request.flags, self.generation_configured())
            .map_err(|_| TryOnError::GenerationUnavailable)?;

        // Echo what was actually resolved; request values only fill gaps
        let stem = garment.stem().map(str::to_string);
        let resolved_by_id =
            stem.is_some() && request.garment.id.as_deref().map(str::trim) == stem.as_deref();
        let dress_id = stem.or_else(|| request.garment.id.clone());
        let requested_src = request
            .garment
            .src
            .clone()
            .filter(|src| !src.trim().is_empty());
        let dress_src = if resolved_by_id {
            self.public_src(&garment.path).or(requested_src)
        } else {
            requested_src.or_else(|| self.public_src(&garment.path))
        };

        debug!(
            "Try-on mode selected: {:?} (demo: {}, upload {} bytes, garment {} bytes)",
            mode,
            mode.is_demo(),
            upload.len(),
            garment.bytes.len()
        );

        let (status, image, warning) = match mode {
            TryOnMode::Generate => {
                let image = self.generate(upload, garment).await?;
                (TryOnStatus::Generated, image, None)
            }
            TryOnMode::DemoEcho => (TryOnStatus::DemoEcho, echo(upload), None),
            TryOnMode::DemoOverlay => self.overlay(upload, garment).await,
        };

        info!(
            "Try-on completed: status={}, dress_id={}",
            status.as_str(),
            dress_id.as_deref().unwrap_or("-")
        );

        Ok(TryOnResult {
            status,
            image,
            dress_id,
            dress_src,
            warning,
        })
    }

    async fn generate(
        &self,
        upload: &UploadedImage,
        garment: GarmentFile,
    ) -> Result<String, TryOnError> {
        let editor = self
            .editor
            .as_ref()
            .ok_or(TryOnError::GenerationUnavailable)?;

        let media_type = upload.normalized_media_type();
        let person = EditImage {
            bytes: upload.bytes.clone(),
            filename: upload
                .filename
                .clone()
                .unwrap_or_else(|| default_filename("person", &media_type)),
            media_type,
        };
        let garment_filename = garment
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| default_filename("garment", garment.media_type));
        let garment = EditImage {
            bytes: garment.bytes.into(),
            media_type: garment.media_type.to_string(),
            filename: garment_filename,
        };

        let generated = editor
            .edit(ImageEditRequest::tryon(person, garment))
            .await
            .map_err(|e| {
                warn!(
                    code = e.code(),
                    upstream_code = e.upstream_code().unwrap_or("-"),
                    "Try-on generation failed: {}",
                    e
                );
                TryOnError::Generation(e)
            })?;

        Ok(generated.to_data_uri())
    }

    async fn overlay(
        &self,
        upload: &UploadedImage,
        garment: GarmentFile,
    ) -> (TryOnStatus, String, Option<String>) {
        let compositor = self.compositor;
        let base = upload.bytes.clone();
        let garment_bytes = garment.bytes;

        let rendered = tokio::task::spawn_blocking(move || {
            compositor.render_overlay(&base, &garment_bytes)
        })
        .await;

        match rendered {
            Ok(Ok(rendered)) => (
                TryOnStatus::DemoOverlay,
                to_data_uri(rendered.media_type, &rendered.bytes),
                None,
            ),
            Ok(Err(e)) => {
                warn!("Demo overlay failed, echoing original upload: {}", e);
                degraded(upload)
            }
            Err(e) => {
                warn!("Demo overlay task aborted, echoing original upload: {}", e);
                degraded(upload)
            }
        }
    }

    /// Public catalog URL for a resolved garment
    fn public_src(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.resolver.root()).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(format!("{}/{}", self.public_prefix, parts.join("/")))
    }
}

/// Original bytes, labelled with the sniffed format when it is recognisable
fn echo(upload: &UploadedImage) -> String {
    let media_type = detect_format(&upload.bytes)
        .map(|format| format_to_media_type(format).to_string())
        .unwrap_or_else(|_| upload.normalized_media_type());
    to_data_uri(&media_type, &upload.bytes)
}

fn degraded(upload: &UploadedImage) -> (TryOnStatus, String, Option<String>) {
    (
        TryOnStatus::DemoFallback,
        echo(upload),
        Some(OVERLAY_DEGRADED_WARNING.to_string()),
    )
}

fn default_filename(stem: &str, media_type: &str) -> String {
    let ext = match media_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    };
    format!("{}.{}", stem, ext)
}
