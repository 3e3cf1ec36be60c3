//! Minimal, headless default implementations of the host capability
//! traits — just enough to drive the protocol end-to-end without a
//! windowing toolkit. A real viewer UI replaces every one of these.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use arcane_core::{ClipboardBridge, CursorKind, InputSource, OutboundEvent, Renderer, Screen, ScreenSelector, TrustStore};

/// Selects the first screen in the list, logging the choice since there
/// is no UI to ask the user.
pub struct AutoSelectFirstScreen;

impl ScreenSelector for AutoSelectFirstScreen {
    fn select(&self, screens: &[Screen]) -> Option<Screen> {
        let chosen = screens.first().cloned();
        if let Some(ref screen) = chosen {
            info!(screen = %screen.name, count = screens.len(), "auto-selected screen (no screen-selection UI attached)");
        }
        chosen
    }
}

/// Logs tile/cursor activity instead of painting anything.
pub struct LoggingRenderer;

impl Renderer for LoggingRenderer {
    fn paint(&self, image: &[u8], x: u32, y: u32) {
        debug!(bytes = image.len(), x, y, "dirty rect received");
    }

    fn resize_viewport(&self, screen: &Screen) {
        info!(screen = %screen.name, width = screen.width, height = screen.height, "viewport resized");
    }

    fn set_cursor(&self, cursor: CursorKind) {
        debug!(?cursor, "cursor shape changed");
    }
}

/// Logs clipboard updates without touching any real clipboard.
pub struct LoggingClipboardBridge;

impl ClipboardBridge for LoggingClipboardBridge {
    fn set_text(&self, text: &str) {
        debug!(chars = text.chars().count(), "clipboard text received from server");
    }
}

/// Never produces input — there is no input device attached.
pub struct NoInputSource;

impl InputSource for NoInputSource {
    fn poll(&self) -> Option<OutboundEvent> {
        None
    }
}

/// Trust-on-first-use fingerprint store backed by a flat JSON file.
pub struct JsonTrustStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonTrustStore {
    pub fn open(path: PathBuf) -> Self {
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        Self { path, entries: Mutex::new(entries) }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        match serde_json::to_string_pretty(entries) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!(error = %e, path = %self.path.display(), "failed to persist trusted-fingerprint store");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize trusted-fingerprint store"),
        }
    }
}

impl TrustStore for JsonTrustStore {
    fn contains(&self, fingerprint: &str) -> bool {
        self.entries.lock().unwrap().contains_key(fingerprint)
    }

    fn add(&self, fingerprint: &str, metadata: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(fingerprint.to_owned(), metadata.to_owned());
        self.persist(&entries);
    }
}
