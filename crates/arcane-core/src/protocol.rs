//! Wire-visible identifiers: protocol version, command strings and the
//! enums that are serialized either as their text name (outbound) or as
//! their integer value (inbound). Names and values are preserved verbatim
//! because the server compares them as strings/integers.

use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "5.0.2";

/// A worker's kind, sent as its wire name (`Desktop` / `Events`) during
/// attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    Desktop,
    Events,
}

impl WorkerKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Events => "Events",
        }
    }
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Text commands exchanged on the primary and attach connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolCommand {
    Success,
    Fail,
    RequestSession,
    AttachToSession,
    BadRequest,
    ResourceFound,
    ResourceNotFound,
}

impl ProtocolCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Fail => "Fail",
            Self::RequestSession => "RequestSession",
            Self::AttachToSession => "AttachToSession",
            Self::BadRequest => "BadRequest",
            Self::ResourceFound => "ResourceFound",
            Self::ResourceNotFound => "ResourceNotFound",
        }
    }
}

/// Reconciled clipboard direction for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardMode {
    Disabled = 1,
    Receive = 2,
    Send = 3,
    Both = 4,
}

impl ClipboardMode {
    /// Recognizes the integer the server advertises in `RequestSession`'s
    /// reply. Unrecognized values fall back to `Disabled`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => Self::Disabled,
            2 => Self::Receive,
            3 => Self::Send,
            4 => Self::Both,
            _ => Self::Disabled,
        }
    }
}

/// Outbound `MouseClickMove.Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseState {
    Up,
    Down,
    Move,
}

impl MouseState {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Move => "Move",
        }
    }
}

/// Outbound `MouseClickMove.Button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Void,
}

impl MouseButton {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Middle => "Middle",
            Self::Void => "Void",
        }
    }
}

/// Local cursor shapes the renderer is asked to display, mapped from the
/// remote `IDC_*` cursor names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Arrow,
    SizeAll,
    SizeBDiag,
    SizeVer,
    SizeFDiag,
    SizeHor,
    UpArrow,
    Wait,
    Busy,
    Cross,
    PointingHand,
    WhatsThis,
    IBeam,
    Forbidden,
}

impl CursorKind {
    /// Maps a remote `IDC_*` cursor name to a local shape. `IDC_ICON` is
    /// obsolete and ignored (falls through to `Arrow` like any other
    /// unrecognized name).
    pub fn from_remote_name(name: &str) -> Self {
        match name {
            "IDC_SIZEALL" | "IDC_SIZE" => Self::SizeAll,
            "IDC_SIZENESW" => Self::SizeBDiag,
            "IDC_SIZENS" => Self::SizeVer,
            "IDC_SIZENWSE" => Self::SizeFDiag,
            "IDC_SIZEWE" => Self::SizeHor,
            "IDC_UPARROW" => Self::UpArrow,
            "IDC_WAIT" => Self::Wait,
            "IDC_APPSTARTING" => Self::Busy,
            "IDC_CROSS" => Self::Cross,
            "IDC_HAND" => Self::PointingHand,
            "IDC_HELP" => Self::WhatsThis,
            "IDC_IBEAM" => Self::IBeam,
            "IDC_NO" => Self::Forbidden,
            _ => Self::Arrow,
        }
    }
}

/// Inbound `InputEvent` integer values the events reader dispatches on.
pub mod inbound_event_id {
    pub const MOUSE_CURSOR_UPDATED: i64 = 2;
    pub const CLIPBOARD_UPDATED: i64 = 3;
}

/// Outbound `OutputEvent` wire names.
pub mod outbound_event_name {
    pub const KEYBOARD: &str = "Keyboard";
    pub const MOUSE_CLICK_MOVE: &str = "MouseClickMove";
    pub const MOUSE_WHEEL: &str = "MouseWheel";
    pub const CLIPBOARD_UPDATED: &str = "ClipboardUpdated";
}
