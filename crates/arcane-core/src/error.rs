use thiserror::Error;

/// Single discriminated error type for the whole client core.
///
/// Every component (Transport, Authenticator, SessionNegotiator,
/// WorkerAttach, DesktopStream, EventStream) returns one of these instead
/// of a component-local error; only the Supervisor decides whether an
/// error tears the session down.
#[derive(Error, Debug)]
pub enum ArcaneError {
    #[error("server rejected the challenge solution")]
    AuthenticationFailed,

    #[error("attach request referenced an unknown session")]
    ResourceNotFound,

    #[error("server response is missing required fields or is not valid JSON")]
    InvalidStructureData,

    #[error("protocol version mismatch: client `{client}`, server `{server}`")]
    UnsupportedVersion { client: &'static str, server: String },

    #[error("TLS handshake completed but no peer certificate was presented")]
    MissingServerCertificate,

    #[error("worker attach requested before a session exists")]
    MissingSession,

    #[error("secondary connection's certificate fingerprint does not match the pinned session fingerprint")]
    ServerFingerprintTampered,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

impl ArcaneError {
    /// The exact user-visible string specified for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "Authentication failed, check your credentials",
            Self::UnsupportedVersion { .. } => "Protocol version mismatch (v5.0.2 expected)",
            _ => "Something went wrong, check console output.",
        }
    }

    /// The message for a transport-level connect timeout. Connect timeouts are
    /// surfaced as `Io` with `ErrorKind::TimedOut`; callers that want the exact
    /// wording should check that case first and fall back to `user_message`.
    pub fn connect_timeout_message() -> &'static str {
        "Connection timed out"
    }
}
