//! TLS dial, fingerprint extraction and the full-duplex `Connection`
//! handle. Certificate chain validation and hostname verification are
//! deliberately disabled — the only trust anchor is the SHA-1 fingerprint
//! of the peer certificate, pinned by a higher layer (`arcane-session`).

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};
use sha1::{Digest, Sha1};
use tracing::{debug, instrument};

use arcane_core::ArcaneError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepts any server certificate. Trust is established solely by
/// comparing the peer certificate's SHA-1 fingerprint against a pinned
/// value, not by chain validation.
#[derive(Debug)]
struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

static CRYPTO_PROVIDER_INIT: Once = Once::new();

fn ensure_crypto_provider() {
    CRYPTO_PROVIDER_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

fn client_config() -> Arc<ClientConfig> {
    ensure_crypto_provider();
    let mut config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerifier))
        .with_no_client_auth();
    config.enable_sni = false;
    Arc::new(config)
}

struct ConnectionInner {
    tls: Mutex<ClientConnection>,
    read_sock: TcpStream,
    write_sock: TcpStream,
    fingerprint: String,
    closed: AtomicBool,
}

/// An authenticated TLS stream plus its peer certificate fingerprint.
/// Cheap to clone — clones share the same underlying socket and TLS
/// state, so a reader actor and a writer actor can each hold a clone and
/// operate independently, permitting concurrent reads and writes from
/// distinct actors.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// Opens a TCP socket (10s connect timeout), upgrades it to TLS
    /// without chain/hostname validation, and extracts the peer
    /// certificate's SHA-1 fingerprint (uppercase hex, 40 chars).
    #[instrument]
    pub fn connect(host: &str, port: u16) -> Result<Self, ArcaneError> {
        let addr = resolve(host, port)?;

        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_nodelay(true).ok();

        let server_name = ServerName::try_from(host.to_owned())
            .unwrap_or_else(|_| ServerName::try_from("localhost".to_owned()).unwrap());

        let mut conn = ClientConnection::new(client_config(), server_name)
            .map_err(|e| ArcaneError::Tls(e.to_string()))?;

        // Drive the handshake to completion before handing the
        // connection to its owner: loop writing/reading TLS records
        // until rustls reports the handshake is done.
        let read_sock = stream.try_clone()?;
        let write_sock = stream.try_clone()?;

        handshake(&mut conn, &read_sock, &write_sock)?;

        let fingerprint = extract_fingerprint(&conn)?;
        debug!(%fingerprint, "TLS handshake complete");

        Ok(Self {
            inner: Arc::new(ConnectionInner {
                tls: Mutex::new(conn),
                read_sock,
                write_sock,
                fingerprint,
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }

    /// Closes the connection. Idempotent, and safe to call from a thread
    /// other than the one currently blocked in a read — shutting down
    /// the socket unblocks any pending `recv` on either cloned handle.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.inner.read_sock.shutdown(Shutdown::Both);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn do_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            {
                let mut tls = self.inner.tls.lock().unwrap();
                match tls.reader().read(buf) {
                    Ok(0) => {}
                    Ok(n) => return Ok(n),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(e),
                }
            }

            let mut raw = [0u8; 8192];
            let n = (&self.inner.read_sock).read(&mut raw)?;
            if n == 0 {
                return Ok(0);
            }

            let mut tls = self.inner.tls.lock().unwrap();
            let mut cursor = &raw[..n];
            tls.read_tls(&mut cursor)?;
            tls.process_new_packets().map_err(io::Error::other)?;
            flush_pending(&mut tls, &self.inner.write_sock)?;
        }
    }

    fn do_write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut tls = self.inner.tls.lock().unwrap();
        let n = tls.writer().write(buf)?;
        flush_pending(&mut tls, &self.inner.write_sock)?;
        Ok(n)
    }

    fn do_flush(&self) -> io::Result<()> {
        let mut tls = self.inner.tls.lock().unwrap();
        flush_pending(&mut tls, &self.inner.write_sock)
    }
}

impl Read for &Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Connection::do_read(self, buf)
    }
}

impl Write for &Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Connection::do_write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Connection::do_flush(self)
    }
}

fn flush_pending(tls: &mut ClientConnection, mut write_sock: &TcpStream) -> io::Result<()> {
    while tls.wants_write() {
        tls.write_tls(&mut write_sock)?;
    }
    Ok(())
}

fn handshake(conn: &mut ClientConnection, mut read_sock: &TcpStream, mut write_sock: &TcpStream) -> io::Result<()> {
    while conn.is_handshaking() {
        if conn.wants_write() {
            conn.write_tls(&mut write_sock)?;
        }
        if conn.wants_read() {
            let n = conn.read_tls(&mut read_sock)?;
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            conn.process_new_packets().map_err(io::Error::other)?;
        }
    }
    Ok(())
}

fn extract_fingerprint(conn: &ClientConnection) -> Result<String, ArcaneError> {
    let certs = conn.peer_certificates().ok_or(ArcaneError::MissingServerCertificate)?;
    let leaf = certs.first().ok_or(ArcaneError::MissingServerCertificate)?;

    let digest = Sha1::digest(leaf.as_ref());
    Ok(hex::encode_upper(digest))
}

fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "host resolved to no addresses"))
}
