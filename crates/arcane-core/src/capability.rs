//! Narrow interfaces to the host environment. The core never depends on a
//! windowing toolkit, image surface or input device abstraction — it only
//! calls through these traits, which a host (GUI, headless harness, test
//! double) implements.

use crate::events::OutboundEvent;
use crate::protocol::CursorKind;
use crate::screen::Screen;

/// Presents a screen list to the user and returns the chosen screen, or
/// `None` if the user rejected selection.
pub trait ScreenSelector: Send + Sync {
    fn select(&self, screens: &[Screen]) -> Option<Screen>;
}

/// Accepts decoded desktop tiles and paints them on the current virtual
/// desktop surface.
pub trait Renderer: Send + Sync {
    fn paint(&self, image: &[u8], x: u32, y: u32);

    /// Called whenever the active screen is (re)selected, so the host can
    /// size its viewport.
    fn resize_viewport(&self, screen: &Screen);

    /// Called when the server reports a cursor shape change.
    fn set_cursor(&self, cursor: CursorKind);
}

/// Read/write access to the local clipboard with a change-notification
/// hook the host uses to push outbound `ClipboardText` events.
pub trait ClipboardBridge: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Feeds locally-captured input (mouse, keyboard, clipboard changes) to
/// the `EventStream` writer half. The host calls `poll` from its own
/// input-handling thread or event loop; returning `None` means no event
/// is pending right now, not that input capture has ended.
pub trait InputSource: Send + Sync {
    fn poll(&self) -> Option<OutboundEvent>;
}

/// Trust-on-first-use store for server certificate fingerprints.
pub trait TrustStore: Send + Sync {
    fn contains(&self, fingerprint: &str) -> bool;
    fn add(&self, fingerprint: &str, metadata: &str);
}
