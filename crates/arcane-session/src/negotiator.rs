//! Negotiation of a `Session` on a fresh, single-use connection.

use serde::Deserialize;
use tracing::{info, warn};

use arcane_core::{
    reconcile_clipboard, ArcaneError, ClipboardMode, ProtocolCommand, Session, PROTOCOL_VERSION,
};
use arcane_transport::{authenticate, read_json, write_line, Connection};

/// Client-side preferences fed into negotiation; everything here is a
/// local choice, reconciled against what the server reports.
#[derive(Debug, Clone)]
pub struct NegotiationPreferences {
    pub clipboard_mode: ClipboardMode,
    pub image_quality: u8,
    pub packet_size: u32,
    pub block_size: u32,
}

#[derive(Debug, Deserialize)]
struct SessionReply {
    #[serde(rename = "SessionId")]
    session_id: String,
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "ViewOnly")]
    view_only: bool,
    #[serde(rename = "Clipboard")]
    clipboard: i64,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "MachineName")]
    machine_name: String,
    #[serde(rename = "WindowsVersion")]
    windows_version: String,
}

/// Negotiates a `Session` against `host:port`: opens a connection,
/// authenticates, requests a session, reconciles capabilities, and
/// closes the connection — it is negotiation-only, never reused for
/// worker traffic (each worker attaches its own fresh connection).
pub fn negotiate(
    host: &str,
    port: u16,
    password: &str,
    preferences: &NegotiationPreferences,
) -> Result<Session, ArcaneError> {
    info!(host, port, "negotiating session");

    let connection = Connection::connect(host, port)?;
    authenticate(&mut (&connection), password)?;

    write_line(&mut (&connection), ProtocolCommand::RequestSession.as_str())?;

    let reply: SessionReply = read_json(&mut (&connection)).ok_or_else(|| {
        warn!("session reply missing required fields or not valid JSON");
        ArcaneError::InvalidStructureData
    })?;

    connection.close();

    if reply.version != PROTOCOL_VERSION {
        warn!(server_version = %reply.version, client_version = PROTOCOL_VERSION, "protocol version mismatch");
        return Err(ArcaneError::UnsupportedVersion {
            client: PROTOCOL_VERSION,
            server: reply.version,
        });
    }

    let server_cb = ClipboardMode::from_wire(reply.clipboard);
    let effective_clipboard_mode = if reply.view_only {
        ClipboardMode::Disabled
    } else {
        reconcile_clipboard(preferences.clipboard_mode, server_cb, false)
    };

    info!(
        session_id = %reply.session_id,
        view_only = reply.view_only,
        clipboard = ?effective_clipboard_mode,
        "session negotiated"
    );

    Ok(Session::new(
        reply.session_id,
        connection.fingerprint().to_owned(),
        format!("{}@{}", reply.username, reply.machine_name),
        reply.windows_version,
        reply.view_only,
        effective_clipboard_mode,
        preferences.image_quality,
        preferences.packet_size,
        preferences.block_size,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_missing_a_required_key_fails_to_parse() {
        let json = r#"{"SessionId":"s","Version":"5.0.2","ViewOnly":false,"Clipboard":4,"Username":"u","MachineName":"m"}"#;
        let parsed: Result<SessionReply, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn view_only_reply_forces_disabled_regardless_of_preference() {
        let reply = SessionReply {
            session_id: "s".into(),
            version: PROTOCOL_VERSION.into(),
            view_only: true,
            clipboard: 4,
            username: "u".into(),
            machine_name: "m".into(),
            windows_version: "10".into(),
        };
        let effective = if reply.view_only {
            ClipboardMode::Disabled
        } else {
            reconcile_clipboard(ClipboardMode::Both, ClipboardMode::from_wire(reply.clipboard), false)
        };
        assert_eq!(effective, ClipboardMode::Disabled);
    }
}
