//! Error types for SMAPI operations.

use std::io;

pub use smapi_proto::{DecodeError, EncodeError};

/// Alias for `Result<T, smapi::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the transport, codec and client.
///
/// Domain failures (a non-zero SMAPI return code) are not errors at this
/// level; they surface through [`crate::Outcome`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request could not be encoded. Raised before any network I/O.
    #[error("encoding request: {0}")]
    Encode(#[from] EncodeError),

    /// The host name did not resolve.
    #[error("resolving {host}: {source}")]
    Resolve {
        /// Host that failed to resolve.
        host: String,
        /// Underlying resolver error.
        source: io::Error,
    },

    /// TCP connect was refused or failed for every resolved address.
    #[error("connecting to {addr}: {source}")]
    Connect {
        /// Last address tried.
        addr: String,
        /// Underlying socket error.
        source: io::Error,
    },

    /// The TLS handshake failed.
    #[error("TLS handshake: {0}")]
    Handshake(io::Error),

    /// The TLS client configuration could not be built.
    #[error("TLS configuration: {0}")]
    TlsConfig(String),

    /// The host is not a valid TLS server name.
    #[error("invalid server name: {0}")]
    InvalidHost(String),

    /// A send or receive on an established connection failed.
    #[error("transport: {0}")]
    Transport(io::Error),

    /// A configured timeout expired.
    #[error("timed out during {phase}")]
    Timeout {
        /// Exchange phase that timed out (`connect`, `handshake`, `send`, `receive`).
        phase: &'static str,
    },

    /// The response did not match the wire format.
    #[error("protocol: {0}")]
    Protocol(DecodeError),

    /// An error catalog could not be read or parsed.
    #[error("error catalog: {0}")]
    Catalog(String),
}

impl Error {
    /// Classifies an I/O error raised during `phase`, separating timeouts.
    pub(crate) fn io(err: io::Error, phase: &'static str) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout { phase },
            _ => Self::Transport(err),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(e) => Self::io(e, "receive"),
            other => Self::Protocol(other),
        }
    }
}
