use serde::{Deserialize, Serialize};

use crate::protocol::ClipboardMode;

/// Client-side defaults, loaded from a JSON file (mirrors the original's
/// bundled `default.json`). The settings-editor dialog itself is a host
/// concern and out of scope here; this is just the defaults-loading
/// plumbing every caller needs regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub clipboard_mode: ClipboardMode,
    pub image_quality: u8,
    pub packet_size: u32,
    pub block_size: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            clipboard_mode: ClipboardMode::Both,
            image_quality: 80,
            packet_size: 4096,
            block_size: 64,
        }
    }
}

impl Defaults {
    /// Parses defaults from a JSON document. Missing fields fall back to
    /// `Default::default()` per field (`#[serde(default)]`), so a partial
    /// or empty `{}` document is valid.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
