use serde::{Deserialize, Serialize};

/// Remote monitor descriptor. `(x, y)` is the monitor's origin in the
/// remote virtual-desktop coordinate space and must be preserved when
/// forwarding pointer coordinates to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Width")]
    pub width: u32,
    #[serde(rename = "Height")]
    pub height: u32,
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    #[serde(rename = "Primary")]
    pub primary: bool,
}

/// Wire envelope for the desktop-handshake screen list: `{"List": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenList {
    #[serde(rename = "List")]
    pub list: Vec<Screen>,
}

/// A decoded tile positioned in the chosen screen's local coordinate
/// frame. The image bytes are an opaque raster blob; the renderer
/// decodes them (format is determined by server-side encoding, governed
/// by `image_quality`).
#[derive(Debug, Clone)]
pub struct DirtyRect {
    pub image: Vec<u8>,
    pub x: u32,
    pub y: u32,
}
