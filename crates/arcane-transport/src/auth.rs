//! PBKDF2-HMAC-SHA512 challenge-response authentication.
//!
//! The server sends a random challenge string; the client answers with
//! `PBKDF2-HMAC-SHA512(password, challenge, 1000 iterations, 64-byte
//! derived key)`, hex-encoded uppercase. There is no further handshake —
//! a wrong answer is discovered only when the server closes the
//! connection or reports a negotiation failure downstream.

use std::io::{Read, Write};

use arcane_core::{ArcaneError, ProtocolCommand};

use crate::framing::{read_line, write_line};

const PBKDF2_ITERATIONS: u32 = 1000;
const DERIVED_KEY_LEN: usize = 64;

/// Computes the hex-uppercase PBKDF2-HMAC-SHA512 solution for `challenge`
/// under `password`.
pub fn solve_challenge(password: &str, challenge: &str) -> String {
    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2::pbkdf2_hmac::<sha2::Sha512>(
        password.as_bytes(),
        challenge.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut derived,
    );
    hex::encode_upper(derived)
}

/// Runs the full authentication exchange over an already-established TLS
/// stream: read the challenge line, answer with the computed solution,
/// and read back the server's verdict line (`Success` on acceptance,
/// anything else — including an empty line on disconnect — is a
/// failure).
pub fn authenticate<S: Read + Write>(stream: &mut S, password: &str) -> Result<(), ArcaneError> {
    let challenge = read_line(stream);
    if challenge.is_empty() {
        return Err(ArcaneError::AuthenticationFailed);
    }

    let solution = solve_challenge(password, &challenge);
    write_line(stream, &solution)?;

    let verdict = read_line(stream);
    if verdict == ProtocolCommand::Success.as_str() {
        Ok(())
    } else {
        Err(ArcaneError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn solution_is_deterministic_and_uppercase_hex() {
        let solution = solve_challenge("hunter2", "abc123");
        assert_eq!(solution.len(), DERIVED_KEY_LEN * 2);
        assert!(solution.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(solution, solve_challenge("hunter2", "abc123"));
    }

    #[test]
    fn different_challenges_yield_different_solutions() {
        assert_ne!(solve_challenge("hunter2", "abc123"), solve_challenge("hunter2", "xyz789"));
    }

    struct Fake {
        inbound: Cursor<Vec<u8>>,
        outbound: Vec<u8>,
    }

    impl Read for Fake {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inbound.read(buf)
        }
    }

    impl Write for Fake {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outbound.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn successful_exchange_returns_ok() {
        let mut fake = Fake { inbound: Cursor::new(b"abc123\r\nSuccess\r\n".to_vec()), outbound: Vec::new() };
        assert!(authenticate(&mut fake, "hunter2").is_ok());

        let sent = String::from_utf8(fake.outbound).unwrap();
        assert!(sent.starts_with(&solve_challenge("hunter2", "abc123")));
    }

    #[test]
    fn rejected_verdict_is_authentication_failure() {
        let mut fake = Fake { inbound: Cursor::new(b"abc123\r\nFAIL\r\n".to_vec()), outbound: Vec::new() };
        assert!(matches!(authenticate(&mut fake, "wrong"), Err(ArcaneError::AuthenticationFailed)));
    }

    #[test]
    fn disconnect_before_challenge_is_authentication_failure() {
        let mut fake = Fake { inbound: Cursor::new(Vec::new()), outbound: Vec::new() };
        assert!(matches!(authenticate(&mut fake, "hunter2"), Err(ArcaneError::AuthenticationFailed)));
    }
}
