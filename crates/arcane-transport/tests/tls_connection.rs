//! End-to-end TLS connect + fingerprint + auth tests against a loopback
//! server with a freshly generated self-signed certificate, mirroring
//! the ephemeral-cert pattern used for local test servers elsewhere in
//! the stack.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};
use sha1::{Digest, Sha1};

use arcane_transport::{authenticate, solve_challenge, Connection};

fn ensure_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

struct TestCert {
    der: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
}

fn generate_test_cert() -> TestCert {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    let cert = params.self_signed(&key_pair).unwrap();

    let der = CertificateDer::from(cert.der().to_vec());
    let key = PrivateKeyDer::try_from(key_pair.serialize_der()).unwrap();
    TestCert { der, key }
}

/// Spawns a one-shot TLS server on loopback, running `handler` once per
/// accepted connection with a blocking `Read + Write` stream. Returns the
/// bound port and the server's certificate DER (for fingerprint checks).
fn spawn_server<F>(handler: F) -> (u16, CertificateDer<'static>)
where
    F: FnOnce(StreamOwned<ServerConnection, std::net::TcpStream>) + Send + 'static,
{
    ensure_provider();
    let cert = generate_test_cert();
    let der = cert.der.clone();

    let config = Arc::new(
        ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(vec![cert.der], cert.key)
            .unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let conn = ServerConnection::new(config).unwrap();
        let tls_stream = StreamOwned::new(conn, stream);
        handler(tls_stream);
    });

    (port, der)
}

#[test]
fn fingerprint_matches_sha1_of_peer_certificate_der() {
    let (port, der) = spawn_server(|mut stream| {
        let mut buf = [0u8; 1];
        let _ = stream.read(&mut buf);
    });

    let connection = Connection::connect("127.0.0.1", port).unwrap();

    let expected = hex::encode_upper(Sha1::digest(der.as_ref()));
    assert_eq!(connection.fingerprint(), expected);
    assert_eq!(connection.fingerprint().len(), 40);
    assert!(connection.fingerprint().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}

#[test]
fn authenticate_round_trip_succeeds_with_correct_solution() {
    let password = "correct horse battery staple";
    let (port, _der) = spawn_server(move |mut stream| {
        stream.write_all(b"challenge-xyz\n").unwrap();

        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            stream.read_exact(&mut byte).unwrap();
            if byte[0] == b'\n' {
                break;
            }
            line.push(byte[0]);
        }
        let received = String::from_utf8(line).unwrap().trim_end_matches('\r').to_owned();
        let expected = solve_challenge("correct horse battery staple", "challenge-xyz");
        assert_eq!(received, expected);

        stream.write_all(b"Success\r\n").unwrap();
    });

    let connection = Connection::connect("127.0.0.1", port).unwrap();
    authenticate(&mut (&connection), password).unwrap();
}

#[test]
fn authenticate_fails_when_server_rejects() {
    let (port, _der) = spawn_server(|mut stream| {
        stream.write_all(b"challenge\n").unwrap();
        let mut buf = [0u8; 256];
        let _ = stream.read(&mut buf);
        stream.write_all(b"Fail\r\n").unwrap();
    });

    let connection = Connection::connect("127.0.0.1", port).unwrap();
    let result = authenticate(&mut (&connection), "wrong password");
    assert!(matches!(result, Err(arcane_core::ArcaneError::AuthenticationFailed)));
}
