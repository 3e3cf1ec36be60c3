//! Lifecycle signals a worker sends to the supervisor. Tile/cursor/
//! clipboard data is delivered straight to the relevant host capability
//! (`Renderer`, `ClipboardBridge`) from the worker's own thread — only
//! orchestration-relevant events cross to the supervisor.

use crate::screen::Screen;

/// Sent by `DesktopStream` on its dedicated channel to the supervisor.
#[derive(Debug, Clone)]
pub enum DesktopSignal {
    /// The active screen was (re)selected, during the initial handshake
    /// or mid-stream on a `screen_updated` frame.
    ScreenSelected(Screen),
    /// The desktop handshake completed; the supervisor should start the
    /// events worker now.
    StartEventsWorker,
    /// The stream's loop has ended.
    Finished { error: bool },
}

/// Sent by `EventStream` on its dedicated channel to the supervisor.
#[derive(Debug, Clone, Copy)]
pub enum EventsSignal {
    Finished { error: bool },
}
