// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Try-on mode selection
//!
//! | demo flag   | overlay | generation configured | mode                      |
//! |-------------|---------|-----------------------|---------------------------|
//! | requested   | on      | any                   | `DemoOverlay`             |
//! | requested   | off     | any                   | `DemoEcho`                |
//! | declined    | any     | yes                   | `Generate`                |
//! | declined    | any     | no                    | `openai_not_configured`   |
//! | unspecified | any     | yes                   | `Generate`                |
//! | unspecified | on/off  | no                    | `DemoOverlay`/`DemoEcho`  |

use serde::Serialize;

/// The `demoMode` form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoFlag {
    /// `demoMode=true`
    Requested,
    /// `demoMode=false`: the caller explicitly wants real generation
    Declined,
    /// Field absent
    #[default]
    Unspecified,
}

impl DemoFlag {
    /// Parse a form value; anything other than true/false counts as unspecified
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("true") | Some("1") => DemoFlag::Requested,
            Some("false") | Some("0") => DemoFlag::Declined,
            _ => DemoFlag::Unspecified,
        }
    }
}

/// Mode flags carried by a try-on request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeFlags {
    pub demo: DemoFlag,
    /// Overlay compositing in demo mode; only `demoOverlay=false` disables it
    pub overlay: bool,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            demo: DemoFlag::Unspecified,
            overlay: true,
        }
    }
}

impl ModeFlags {
    pub fn from_form(demo_mode: Option<&str>, demo_overlay: Option<&str>) -> Self {
        let overlay = !matches!(
            demo_overlay.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("false") | Some("0")
        );
        Self {
            demo: DemoFlag::parse(demo_mode),
            overlay,
        }
    }

    pub fn demo(overlay: bool) -> Self {
        Self {
            demo: DemoFlag::Requested,
            overlay,
        }
    }

    pub fn real() -> Self {
        Self {
            demo: DemoFlag::Declined,
            overlay: false,
        }
    }
}

/// Resolved processing mode for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryOnMode {
    /// Call the external image-edit service
    Generate,
    /// Composite the garment over the upload locally
    DemoOverlay,
    /// Return the upload unchanged
    DemoEcho,
}

/// Real mode was explicitly requested but no generation service is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationUnavailable;

impl TryOnMode {
    pub fn select(
        flags: ModeFlags,
        generation_configured: bool,
    ) -> Result<Self, GenerationUnavailable> {
        let demo = match (flags.demo, generation_configured) {
            (DemoFlag::Requested, _) => true,
            (DemoFlag::Declined, true) | (DemoFlag::Unspecified, true) => false,
            (DemoFlag::Declined, false) => return Err(GenerationUnavailable),
            (DemoFlag::Unspecified, false) => true,
        };

        Ok(match (demo, flags.overlay) {
            (false, _) => TryOnMode::Generate,
            (true, true) => TryOnMode::DemoOverlay,
            (true, false) => TryOnMode::DemoEcho,
        })
    }

    pub fn is_demo(&self) -> bool {
        !matches!(self, TryOnMode::Generate)
    }
}

/// Status label reported with a successful result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TryOnStatus {
    /// Image produced by the external service
    Generated,
    /// Demo composite of garment over the upload
    DemoOverlay,
    /// Upload echoed back unchanged
    DemoEcho,
    /// Overlay failed; upload echoed back unchanged
    DemoFallback,
}

impl TryOnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TryOnStatus::Generated => "generated",
            TryOnStatus::DemoOverlay => "demo_overlay",
            TryOnStatus::DemoEcho => "demo_echo",
            TryOnStatus::DemoFallback => "demo_fallback",
        }
    }
}
