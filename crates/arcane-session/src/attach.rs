//! Opening a worker's dedicated connection and attaching it to an
//! already-negotiated session.

use tracing::{info, warn};

use arcane_core::{ArcaneError, ProtocolCommand, Session, WorkerKind};
use arcane_transport::{authenticate, read_line, write_line, Connection};

/// Opens a fresh connection for `kind`, verifies it terminates at the
/// same server the session was negotiated against (fingerprint pin),
/// attaches it to `session.session_id`, and declares the worker kind.
///
/// The fingerprint check happens **before** any `AttachToSession` bytes
/// are written — a tampered second hop is rejected without ever telling
/// an impersonating server which session it would have joined.
pub fn attach(
    host: &str,
    port: u16,
    password: &str,
    session: &Session,
    kind: WorkerKind,
) -> Result<Connection, ArcaneError> {
    info!(host, port, worker = %kind, "attaching worker connection");

    let connection = Connection::connect(host, port)?;
    authenticate(&mut (&connection), password)?;

    if connection.fingerprint() != session.server_fingerprint {
        warn!(worker = %kind, "attach connection's fingerprint does not match the pinned session fingerprint");
        connection.close();
        return Err(ArcaneError::ServerFingerprintTampered);
    }

    write_line(&mut (&connection), ProtocolCommand::AttachToSession.as_str())?;
    write_line(&mut (&connection), &session.session_id)?;

    let verdict = read_line(&mut (&connection));
    if verdict != ProtocolCommand::ResourceFound.as_str() {
        warn!(worker = %kind, session_id = %session.session_id, "attach target session not found");
        connection.close();
        return Err(ArcaneError::ResourceNotFound);
    }

    write_line(&mut (&connection), kind.wire_name())?;

    info!(worker = %kind, "worker attached");

    Ok(connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_kind_wire_names_match_attach_payload() {
        assert_eq!(WorkerKind::Desktop.wire_name(), "Desktop");
        assert_eq!(WorkerKind::Events.wire_name(), "Events");
    }
}
