// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible image-edit client for real try-on generation

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::imaging::image_utils::to_data_uri_from_base64;

/// Instruction sent with every try-on edit
pub const TRYON_PROMPT: &str = "Photorealistic virtual try-on. The first image is a photo of a \
person; the second image is a garment. Dress the person in the garment from the second image, \
replacing the clothing they are wearing. Preserve the person's identity exactly: face, skin \
tone, hair, body shape, pose, and expression must not change. Keep the original background, \
framing, and lighting. Reproduce the garment's cut, color, pattern, and embroidery faithfully, \
draped naturally on the body. Do not add text, logos, or extra people.";

/// Header carrying the upstream correlation id
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Failures talking to the image-edit service
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("image service request timed out")]
    Timeout,

    #[error("image service transport error: {0}")]
    Transport(String),

    #[error("image service returned {status}: {message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        error_type: Option<String>,
        message: String,
        request_id: Option<String>,
    },

    #[error("image service response contained no image")]
    NoImage,

    #[error("invalid image service response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Stable error code returned to callers
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::NoImage => "no_image",
            _ => "openai_error",
        }
    }

    /// Error code reported by the upstream service, if any
    pub fn upstream_code(&self) -> Option<&str> {
        match self {
            GenerationError::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else if e.is_decode() {
            GenerationError::InvalidResponse(e.to_string())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

/// One named image sent to the edit endpoint
#[derive(Debug, Clone)]
pub struct EditImage {
    pub bytes: Bytes,
    pub media_type: String,
    pub filename: String,
}

/// Inputs for a single try-on edit
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub person: EditImage,
    pub garment: EditImage,
    pub prompt: String,
}

impl ImageEditRequest {
    pub fn tryon(person: EditImage, garment: EditImage) -> Self {
        Self {
            person,
            garment,
            prompt: TRYON_PROMPT.to_string(),
        }
    }
}

/// Image returned by the service, still base64-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub base64_image: String,
    pub media_type: String,
}

impl GeneratedImage {
    pub fn to_data_uri(&self) -> String {
        to_data_uri_from_base64(&self.media_type, &self.base64_image)
    }
}

/// Seam between the pipeline and the external image-edit capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, request: ImageEditRequest) -> Result<GeneratedImage, GenerationError>;
}

// --- OpenAI-compatible response types ---

#[derive(Debug, Deserialize)]
pub struct OpenAIImageResponse {
    #[serde(default)]
    pub data: Vec<OpenAIImageData>,
    #[serde(default)]
    pub output_format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageData {
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorEnvelope {
    error: OpenAIErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

impl OpenAIImageResponse {
    /// Take the first non-empty image
    pub fn into_generated(self) -> Result<GeneratedImage, GenerationError> {
        let media_type = match self.output_format.as_deref() {
            Some("jpeg") | Some("jpg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "image/png",
        };
        self.data
            .into_iter()
            .filter_map(|d| d.b64_json)
            .find(|b64| !b64.trim().is_empty())
            .map(|base64_image| GeneratedImage {
                base64_image,
                media_type: media_type.to_string(),
            })
            .ok_or(GenerationError::NoImage)
    }
}

fn upstream_error(status: StatusCode, body: &str, request_id: Option<String>) -> GenerationError {
    let parsed = serde_json::from_str::<OpenAIErrorEnvelope>(body).ok();
    let (message, error_type, code) = match parsed {
        Some(envelope) => {
            let code = envelope.error.code.and_then(|c| match c {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            });
            (
                envelope
                    .error
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
                envelope.error.error_type,
                code,
            )
        }
        None => (body.chars().take(200).collect(), None, None),
    };

    GenerationError::Upstream {
        status: status.as_u16(),
        code,
        error_type,
        message,
        request_id,
    }
}

/// Client for an OpenAI-compatible `/v1/images/edits` endpoint
pub struct OpenAIImageEditor {
    client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
}

impl OpenAIImageEditor {
    /// Create a new editor; the config timeout bounds every call
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let endpoint = config.base_url.trim_end_matches('/').to_string();
        info!(
            "Image edit client configured: endpoint={}, model={}, timeout={}s",
            endpoint,
            config.model,
            config.timeout.as_secs()
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model_name: config.model.clone(),
        })
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn image_part(image: &EditImage) -> Result<Part, GenerationError> {
        Part::bytes(image.bytes.to_vec())
            .file_name(image.filename.clone())
            .mime_str(&image.media_type)
            .map_err(|e| GenerationError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ImageEditor for OpenAIImageEditor {
    async fn edit(&self, request: ImageEditRequest) -> Result<GeneratedImage, GenerationError> {
        let start = std::time::Instant::now();

        let form = Form::new()
            .text("model", self.model_name.clone())
            .text("prompt", request.prompt.clone())
            .text("n", "1")
            .part("image[]", Self::image_part(&request.person)?)
            .part("image[]", Self::image_part(&request.garment)?);

        let url = format!("{}/v1/images/edits", self.endpoint);
        debug!(
            "Image edit POST {} (person={} bytes, garment={} bytes)",
            url,
            request.person.bytes.len(),
            request.garment.bytes.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = upstream_error(status, &text, request_id);
            if let GenerationError::Upstream {
                status,
                code,
                error_type,
                request_id,
                ..
            } = &error
            {
                warn!(
                    status = *status,
                    code = code.as_deref().unwrap_or("-"),
                    error_type = error_type.as_deref().unwrap_or("-"),
                    request_id = request_id.as_deref().unwrap_or("-"),
                    "Image edit rejected by upstream"
                );
            }
            return Err(error);
        }

        let api_response: OpenAIImageResponse = response.json().await?;
        let generated = api_response.into_generated().map_err(|e| {
            warn!(
                request_id = request_id.as_deref().unwrap_or("-"),
                "Image edit response contained no image"
            );
            e
        })?;

        info!(
            "Image edit completed: model={}, {}ms, request_id={}",
            self.model_name,
            start.elapsed().as_millis(),
            request_id.as_deref().unwrap_or("-")
        );

        Ok(generated)
    }
}
