//! End-to-end negotiation and attach tests against loopback TLS servers.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};

use arcane_core::{ArcaneError, ClipboardMode, ProtocolCommand, Session, WorkerKind};
use arcane_session::{attach, negotiate, NegotiationPreferences};

const TEST_PASSWORD: &str = "s3cret";

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

fn spawn_server<F>(handler: F) -> u16
where
    F: FnOnce(StreamOwned<ServerConnection, std::net::TcpStream>) + Send + 'static,
{
    ensure_provider();
    let cert = generate_test_cert();
    let config =
        Arc::new(ServerConfig::builder().with_no_client_auth().with_single_cert(vec![cert.der], cert.key).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let conn = ServerConnection::new(config).unwrap();
        handler(StreamOwned::new(conn, stream));
    });

    port
}

fn serve_auth(stream: &mut StreamOwned<ServerConnection, std::net::TcpStream>, password: &str) -> bool {
    stream.write_all(b"test-challenge\n").unwrap();

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
    let expected = arcane_transport::solve_challenge(password, "test-challenge");

    if received == expected {
        stream.write_all(b"Success\r\n").unwrap();
        true
    } else {
        stream.write_all(b"Fail\r\n").unwrap();
        false
    }
}

fn read_line(stream: &mut StreamOwned<ServerConnection, std::net::TcpStream>) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
        }
    }
    String::from_utf8_lossy(&line).trim_end_matches('\r').to_string()
}

#[test]
fn negotiate_happy_path_reconciles_session() {
    let port = spawn_server(|mut stream| {
        if !serve_auth(&mut stream, TEST_PASSWORD) {
            return;
        }
        let request = read_line(&mut stream);
        assert_eq!(request, ProtocolCommand::RequestSession.as_str());

        let reply = r#"{"SessionId":"sid-1","Version":"5.0.2","ViewOnly":false,"Clipboard":4,"Username":"alice","MachineName":"WIN-ALICE","WindowsVersion":"10.0.19045"}"#;
        stream.write_all(reply.as_bytes()).unwrap();
        stream.write_all(b"\r\n").unwrap();
    });

    let preferences = NegotiationPreferences {
        clipboard_mode: ClipboardMode::Both,
        image_quality: 80,
        packet_size: 4096,
        block_size: 64,
    };

    let session = negotiate("127.0.0.1", port, TEST_PASSWORD, &preferences).unwrap();

    assert_eq!(session.session_id, "sid-1");
    assert_eq!(session.effective_clipboard_mode, ClipboardMode::Both);
    assert!(!session.view_only);
    assert_eq!(session.windows_version, "10.0.19045");
    assert_eq!(session.display_name, "alice@WIN-ALICE");
    assert_eq!(session.server_fingerprint.len(), 40);
}

#[test]
fn negotiate_rejects_unsupported_protocol_version() {
    let port = spawn_server(|mut stream| {
        if !serve_auth(&mut stream, TEST_PASSWORD) {
            return;
        }
        let _ = read_line(&mut stream);

        let reply = r#"{"SessionId":"sid-2","Version":"4.0.0","ViewOnly":false,"Clipboard":1,"Username":"bob","MachineName":"WIN-BOB","WindowsVersion":"11"}"#;
        stream.write_all(reply.as_bytes()).unwrap();
        stream.write_all(b"\r\n").unwrap();
    });

    let preferences =
        NegotiationPreferences { clipboard_mode: ClipboardMode::Disabled, image_quality: 80, packet_size: 4096, block_size: 64 };

    let result = negotiate("127.0.0.1", port, TEST_PASSWORD, &preferences);
    assert!(matches!(
        result,
        Err(ArcaneError::UnsupportedVersion { server, .. }) if server == "4.0.0"
    ));
}

#[test]
fn attach_rejects_mismatched_fingerprint_before_writing_attach_bytes() {
    // The second server only ever serves authentication — if `attach`
    // correctly detects the fingerprint mismatch, it must close the
    // connection without writing `AttachToSession`, so the server's
    // next read observes end-of-stream, never that command.
    let saw_attach_bytes = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let saw_attach_bytes_clone = saw_attach_bytes.clone();

    let port = spawn_server(move |mut stream| {
        if !serve_auth(&mut stream, TEST_PASSWORD) {
            return;
        }
        let next = read_line(&mut stream);
        if next == ProtocolCommand::AttachToSession.as_str() {
            saw_attach_bytes_clone.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    // A session pinned to a fingerprint that certainly doesn't belong
    // to the server we're about to attach to.
    let bogus_session = Session::new(
        "sid".to_owned(),
        "0000000000000000000000000000000000000000".to_owned(),
        "u@m".to_owned(),
        "10".to_owned(),
        false,
        ClipboardMode::Both,
        80,
        4096,
        64,
    );

    let result = attach("127.0.0.1", port, TEST_PASSWORD, &bogus_session, WorkerKind::Desktop);
    assert!(matches!(result, Err(ArcaneError::ServerFingerprintTampered)));

    std::thread::sleep(std::time::Duration::from_millis(50));
    assert!(!saw_attach_bytes.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn attach_succeeds_when_fingerprint_matches_and_session_is_found() {
    let cert = generate_test_cert();
    let expected_fingerprint = {
        use sha1::{Digest, Sha1};
        hex::encode_upper(Sha1::digest(cert.der.as_ref()))
    };

    ensure_provider();
    let config =
        Arc::new(ServerConfig::builder().with_no_client_auth().with_single_cert(vec![cert.der], cert.key).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let conn = ServerConnection::new(config).unwrap();
        let mut stream = StreamOwned::new(conn, stream);

        if !serve_auth(&mut stream, TEST_PASSWORD) {
            return;
        }
        let command = read_line(&mut stream);
        assert_eq!(command, ProtocolCommand::AttachToSession.as_str());
        let session_id = read_line(&mut stream);
        assert_eq!(session_id, "sid-3");

        stream.write_all(ProtocolCommand::ResourceFound.as_str().as_bytes()).unwrap();
        stream.write_all(b"\r\n").unwrap();

        let kind = read_line(&mut stream);
        assert_eq!(kind, WorkerKind::Desktop.wire_name());
    });

    let session = Session::new(
        "sid-3".to_owned(),
        expected_fingerprint,
        "u@m".to_owned(),
        "10".to_owned(),
        false,
        ClipboardMode::Both,
        80,
        4096,
        64,
    );

    let connection = attach("127.0.0.1", port, TEST_PASSWORD, &session, WorkerKind::Desktop).unwrap();
    assert_eq!(connection.fingerprint(), session.server_fingerprint);
}
