//! In-process TLS servers for transport and client tests.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};
use smapi_proto::Response;
use tempfile::NamedTempFile;

use crate::Config;

/// Host name the test certificate is issued for.
pub(crate) const HOST: &str = "localhost";

/// A one-shot server listening on `127.0.0.1`.
pub(crate) struct Server<T> {
    /// Listening port.
    pub port: u16,
    /// PEM file holding the server certificate.
    pub ca: NamedTempFile,
    /// Server thread; yields what it observed.
    handle: JoinHandle<T>,
}

impl<T> Server<T> {
    /// Client settings trusting this server's certificate.
    pub fn config(&self) -> Config {
        Config::builder().ca_file(self.ca.path()).build()
    }

    /// Waits for the server thread.
    pub fn join(self) -> T {
        self.handle.join().unwrap()
    }
}

/// Accepts one TLS connection, reads one request frame and answers with
/// `reply`. Joining returns the request frame as received, or the error
/// that cut the session short.
pub(crate) fn smapi_server(reply: Response) -> Server<io::Result<Vec<u8>>> {
    let (cert, tls) = server_tls();
    spawn(cert, move |sock| {
        let conn = ServerConnection::new(tls).map_err(io::Error::other)?;
        let mut stream = StreamOwned::new(conn, sock);

        let mut len = [0u8; 4];
        stream.read_exact(&mut len)?;
        let mut frame = len.to_vec();
        frame.resize(4 + u32::from_be_bytes(len) as usize, 0);
        stream.read_exact(&mut frame[4..])?;

        smapi_proto::write_response(&mut stream, &reply)?;
        stream.conn.send_close_notify();
        let _ = stream.flush();
        Ok(frame)
    })
}

/// Answers the ClientHello with plain-text bytes.
pub(crate) fn plaintext_server() -> Server<()> {
    let (cert, _) = server_tls();
    spawn(cert, |mut sock| {
        sock.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").unwrap();
        drain(&mut sock);
    })
}

/// Accepts a connection and never answers.
pub(crate) fn silent_server() -> Server<()> {
    let (cert, _) = server_tls();
    spawn(cert, |mut sock| drain(&mut sock))
}

/// Reads until the client goes away.
fn drain(sock: &mut TcpStream) {
    let _ = io::copy(sock, &mut io::sink());
}

/// Binds a listener and serves its first connection with `serve`.
fn spawn<T, F>(cert_pem: String, serve: F) -> Server<T>
where
    T: Send + 'static,
    F: FnOnce(TcpStream) -> T + Send + 'static,
{
    let mut ca = NamedTempFile::new().unwrap();
    ca.write_all(cert_pem.as_bytes()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (sock, _) = listener.accept().unwrap();
        serve(sock)
    });
    Server { port, ca, handle }
}

/// Self-signed certificate for [`HOST`] and a server config presenting it.
fn server_tls() -> (String, Arc<ServerConfig>) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec![HOST.to_owned()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .unwrap();
    (cert.pem(), Arc::new(config))
}
