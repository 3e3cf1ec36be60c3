use crate::protocol::ClipboardMode;

/// Authoritative tuning-value choice lists (mirrors the original's
/// `PacketSize`/`BlockSize` enums) — exposed so a host-side picker UI
/// builds against the same list the protocol actually accepts.
pub const PACKET_SIZES: [u32; 7] = [1024, 2048, 4096, 8192, 9216, 12288, 16384];
pub const BLOCK_SIZES: [u32; 6] = [32, 64, 96, 128, 256, 512];
pub const IMAGE_QUALITY_RANGE: std::ops::RangeInclusive<u8> = 10..=100;

/// Client-side clipboard preference, reconciled against the server's
/// advertised capability into `Session::effective_clipboard_mode`.
pub type ClipboardPreference = ClipboardMode;

/// The logical remote-desktop session. `session_id` and
/// `server_fingerprint` are immutable once established;
/// `effective_clipboard_mode` is fixed for the session's lifetime.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub server_fingerprint: String,
    pub display_name: String,
    pub windows_version: String,
    pub view_only: bool,
    pub effective_clipboard_mode: ClipboardMode,
    pub image_quality: u8,
    pub packet_size: u32,
    pub block_size: u32,
}

impl Session {
    /// Builds a `Session` from negotiation results, clamping tuning
    /// values that fall outside the protocol's accepted ranges/lists to
    /// their nearest valid choice instead of rejecting them outright —
    /// tuning values are a local preference, not server-verified.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        server_fingerprint: String,
        display_name: String,
        windows_version: String,
        view_only: bool,
        effective_clipboard_mode: ClipboardMode,
        image_quality: u8,
        packet_size: u32,
        block_size: u32,
    ) -> Self {
        Self {
            session_id,
            server_fingerprint,
            display_name,
            windows_version,
            view_only,
            effective_clipboard_mode,
            image_quality: image_quality.clamp(*IMAGE_QUALITY_RANGE.start(), *IMAGE_QUALITY_RANGE.end()),
            packet_size: nearest_choice(&PACKET_SIZES, packet_size),
            block_size: nearest_choice(&BLOCK_SIZES, block_size),
        }
    }
}

fn nearest_choice(choices: &[u32], value: u32) -> u32 {
    *choices
        .iter()
        .min_by_key(|&&c| (c as i64 - value as i64).abs())
        .unwrap_or(&value)
}

/// Reconciles the client's clipboard preference with the server's
/// advertised capability into the effective, session-lifetime mode.
///
/// `view_only` always forces `Disabled` regardless of either side's
/// preference — callers should check that first, but this function also
/// honors it directly so it is safe to call unconditionally.
pub fn reconcile_clipboard(client_pref: ClipboardMode, server_cap: ClipboardMode, view_only: bool) -> ClipboardMode {
    use ClipboardMode::*;

    if view_only {
        return Disabled;
    }

    match (client_pref, server_cap) {
        (Disabled, _) => Disabled,
        (_, Disabled) => Disabled,
        (Receive, Receive) => Disabled,
        (Receive, Send) => Receive,
        (Receive, Both) => Receive,
        (Send, Send) => Disabled,
        (Send, Receive) => Send,
        (Send, Both) => Send,
        (Both, Receive) => Send,
        (Both, Send) => Receive,
        (Both, Both) => Both,
    }
}
