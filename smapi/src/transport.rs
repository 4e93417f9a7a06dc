//! TLS transport to the SMAPI server.
//!
//! One [`Connection`] carries exactly one request/response exchange. It is
//! closed explicitly by the client and again, as a no-op, on drop, so every
//! exit path releases the socket.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::{Config, Error, Result};

/// Blocking byte stream used for a single SMAPI exchange.
pub trait Transport: Read + Write {
    /// Writes all of `bytes` and flushes.
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)
            .and_then(|()| self.flush())
            .map_err(|e| Error::io(e, "send"))
    }

    /// Returns up to `max` bytes. May return fewer, and an empty buffer
    /// once the peer has closed.
    fn recv(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max];
        let n = self.read(&mut buf).map_err(|e| Error::io(e, "receive"))?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Releases the connection. Calling it more than once is harmless.
    fn close(&mut self);
}

/// Builds the rustls client configuration.
///
/// Trusts the platform certificate store plus, if set, the PEM bundle in
/// [`Config::ca_file`].
pub fn tls_config(config: &Config) -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::warn!(error = %err, "skipping unreadable platform certificates");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, ignored, "loaded platform trust store");

    if let Some(path) = &config.ca_file {
        let certs = CertificateDer::pem_file_iter(path)
            .and_then(|iter| iter.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(|e| Error::TlsConfig(format!("{}: {e}", path.display())))?;
        if certs.is_empty() {
            return Err(Error::TlsConfig(format!(
                "{}: no certificates found",
                path.display()
            )));
        }
        for cert in certs {
            roots
                .add(cert)
                .map_err(|e| Error::TlsConfig(format!("{}: {e}", path.display())))?;
        }
    }

    if roots.is_empty() {
        tracing::warn!("trust store is empty, every handshake will fail");
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let client = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::TlsConfig(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(client))
}

/// A TLS session with the SMAPI server.
#[derive(Debug)]
pub struct Connection {
    /// `None` once closed.
    stream: Option<StreamOwned<ClientConnection, TcpStream>>,
    /// Peer address, for logging.
    peer: SocketAddr,
}

impl Connection {
    /// Connects to `host:port` and completes the TLS handshake.
    ///
    /// The server certificate is verified against `host`. Each resolved
    /// address is tried in turn.
    pub fn connect(
        host: &str,
        port: u16,
        tls: Arc<ClientConfig>,
        config: &Config,
    ) -> Result<Self> {
        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|_| Error::InvalidHost(host.to_owned()))?;

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| Error::Resolve {
                host: host.to_owned(),
                source,
            })?
            .collect();

        tracing::info!(host, port, "connecting to SMAPI");
        let mut sock = open_socket(host, &addrs, config.connect_timeout)?;
        let peer = sock.peer_addr().map_err(Error::Transport)?;

        // The handshake runs under the connect timeout; the exchange itself
        // under the read/write timeouts.
        set_timeouts(&sock, config.connect_timeout, config.connect_timeout)?;
        let mut conn =
            ClientConnection::new(tls, server_name).map_err(|e| Error::TlsConfig(e.to_string()))?;
        while conn.is_handshaking() {
            conn.complete_io(&mut sock).map_err(|e| match Error::io(e, "handshake") {
                Error::Transport(e) => Error::Handshake(e),
                other => other,
            })?;
        }
        set_timeouts(&sock, config.read_timeout, config.write_timeout)?;

        tracing::debug!(%peer, "TLS session established");
        Ok(Self {
            stream: Some(StreamOwned::new(conn, sock)),
            peer,
        })
    }

    /// Address of the connected server.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Returns the open stream or a `NotConnected` error.
    fn stream(&mut self) -> io::Result<&mut StreamOwned<ClientConnection, TcpStream>> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection closed"))
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream()?.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream()?.flush()
    }
}

impl Transport for Connection {
    fn close(&mut self) {
        let Some(mut s) = self.stream.take() else {
            return;
        };
        s.conn.send_close_notify();
        while s.conn.wants_write() {
            match s.conn.write_tls(&mut s.sock) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = s.sock.shutdown(Shutdown::Both);
        tracing::debug!(peer = %self.peer, "connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens a TCP socket to the first reachable address.
fn open_socket(
    host: &str,
    addrs: &[SocketAddr],
    timeout: Option<Duration>,
) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(t) => TcpStream::connect_timeout(addr, t),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(sock) => return Ok(sock),
            Err(e) => {
                tracing::debug!(%addr, error = %e, "connect attempt failed");
                last_err = Some(if e.kind() == io::ErrorKind::TimedOut {
                    Error::Timeout { phase: "connect" }
                } else {
                    Error::Connect {
                        addr: addr.to_string(),
                        source: e,
                    }
                });
            }
        }
    }
    Err(last_err.unwrap_or_else(|| Error::Resolve {
        host: host.to_owned(),
        source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
    }))
}

/// Applies socket timeouts. A zero duration means "no timeout".
fn set_timeouts(sock: &TcpStream, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
    sock.set_read_timeout(read.filter(|d| !d.is_zero()))
        .and_then(|()| sock.set_write_timeout(write.filter(|d| !d.is_zero())))
        .map_err(Error::Transport)
}
