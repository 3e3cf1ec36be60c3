use crate::protocol::{CursorKind, MouseButton, MouseState};

/// An event read from the Events connection and handed to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    CursorShape(CursorKind),
    ClipboardText(String),
}

/// An event produced by local input and written to the Events connection.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    MouseMoveOrClick {
        x: i32,
        y: i32,
        state: MouseState,
        button: MouseButton,
    },
    MouseWheel {
        delta: i32,
    },
    Keyboard {
        keys: String,
        is_shortcut: bool,
    },
    ClipboardText {
        text: String,
    },
}
