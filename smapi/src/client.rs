//! SMAPI client: one connect → send → receive → close cycle per call.
//!
//! [`Client::try_call`] returns typed errors. [`Client::call`] and the free
//! [`call`] never fail: transport and protocol errors are logged and turned
//! into the [`CallResult::sentinel`] triple, which existing automation
//! already treats as a failed call.

use std::fmt;
use std::sync::Arc;

use rustls::ClientConfig;
use serde::{Deserialize, Serialize};
use smapi_proto::{Request, Response};
use zeroize::Zeroizing;

use crate::transport::{self, Connection, Transport};
use crate::{Config, ErrorCatalog, Operation, Outcome, Result, classify};

/// Default SMAPI socket server port.
pub const DEFAULT_PORT: u16 = 44444;

/// Return and reason code reported when no response was obtained.
pub const SENTINEL: i64 = 9999;

/// Status triple of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// SMAPI return code.
    pub return_code: i64,
    /// SMAPI reason code.
    pub reason_code: i64,
    /// Message lines, each terminated by `\n`.
    pub message_text: String,
}

impl CallResult {
    /// The `(9999, 9999, "")` triple returned when a call fails below the
    /// SMAPI layer.
    pub fn sentinel() -> Self {
        Self {
            return_code: SENTINEL,
            reason_code: SENTINEL,
            message_text: String::new(),
        }
    }

    /// Returns `true` if this is the sentinel triple.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

impl From<&Response> for CallResult {
    fn from(resp: &Response) -> Self {
        Self {
            return_code: i64::from(resp.return_code),
            reason_code: i64::from(resp.reason_code),
            message_text: resp.message_text(),
        }
    }
}

/// A configured SMAPI endpoint with credentials.
///
/// Holds no connection: every call opens and closes its own, so one
/// `Client` can be shared across threads.
pub struct Client {
    /// Server host name, also used for certificate verification.
    host: String,
    /// Server port.
    port: u16,
    /// Authorized SMAPI user.
    user: String,
    /// Password of `user`.
    password: Zeroizing<String>,
    /// Timeouts and trust settings.
    config: Config,
    /// Shared rustls configuration.
    tls: Arc<ClientConfig>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Starts building a client for `host:port`.
    pub fn builder(host: impl Into<String>, port: u16) -> ClientBuilder {
        ClientBuilder {
            host: host.into(),
            port,
            user: String::new(),
            password: Zeroizing::new(String::new()),
            config: Config::default(),
        }
    }

    /// Issues `api_name` against `target` and returns the decoded response.
    ///
    /// Encoding errors are reported before a connection is opened. The
    /// connection is closed on every path.
    pub fn try_call(&self, target: &str, api_name: &str, command_text: &str) -> Result<Response> {
        let request = Request::new(
            api_name,
            self.user.as_str(),
            self.password.as_str(),
            target,
            command_text,
        );
        let frame = smapi_proto::encode(&request)?;
        let tls = Arc::clone(&self.tls);
        let mut conn = Connection::connect(&self.host, self.port, tls, &self.config)?;
        run(&mut conn, &frame)
    }

    /// Like [`Client::try_call`], but failures become the sentinel triple.
    pub fn call(&self, target: &str, api_name: &str, command_text: &str) -> CallResult {
        settle(api_name, target, self.try_call(target, api_name, command_text))
    }

    /// Runs `op` against `target` and classifies the result with the
    /// catalog entry for the operation.
    pub fn apply(&self, target: &str, op: &impl Operation, catalog: &ErrorCatalog) -> Outcome {
        let api = op.api_name();
        let result = self.call(target, api, &op.command_text());
        let outcome = classify(&result, catalog.lookup(api, op.operation()));
        tracing::info!(
            api,
            target,
            op = %op.operation(),
            return_code = result.return_code,
            reason_code = result.reason_code,
            ok = outcome.is_ok(),
            "operation finished"
        );
        outcome
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    /// Server host name.
    host: String,
    /// Server port.
    port: u16,
    /// Authorized SMAPI user.
    user: String,
    /// Password of `user`.
    password: Zeroizing<String>,
    /// Connection settings.
    config: Config,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Sets the SMAPI user and password.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = Zeroizing::new(password.into());
        self
    }

    /// Replaces the connection settings.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Builds the client, loading the TLS trust store.
    pub fn build(self) -> Result<Client> {
        let tls = transport::tls_config(&self.config)?;
        Ok(Client {
            host: self.host,
            port: self.port,
            user: self.user,
            password: self.password,
            config: self.config,
            tls,
        })
    }
}

/// One-shot call with default settings; never fails.
///
/// Any failure, including a bad trust store, is logged and returned as
/// [`CallResult::sentinel`].
pub fn call(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    target: &str,
    api_name: &str,
    command_text: &str,
) -> CallResult {
    let client = Client::builder(host, port)
        .credentials(user, password)
        .build();
    match client {
        Ok(client) => client.call(target, api_name, command_text),
        Err(err) => settle(api_name, target, Err(err)),
    }
}

/// Sends `frame`, reads one response and closes `transport`, whatever the
/// outcome.
fn run<T: Transport>(transport: &mut T, frame: &[u8]) -> Result<Response> {
    let result = exchange(transport, frame);
    transport.close();
    result
}

/// One request/response exchange.
fn exchange<T: Transport>(transport: &mut T, frame: &[u8]) -> Result<Response> {
    // Size only: the frame carries the password.
    tracing::debug!(bytes = frame.len(), "sending request frame");
    transport.send(frame)?;

    let resp = smapi_proto::read_response(transport)?;
    if resp.echo != resp.request_number {
        tracing::warn!(
            echo = resp.echo,
            request_number = resp.request_number,
            "request number mismatch between response parts"
        );
    }
    tracing::debug!(
        request_number = resp.request_number,
        return_code = resp.return_code,
        reason_code = resp.reason_code,
        lines = resp.lines.len(),
        "received response"
    );
    Ok(resp)
}

/// Converts a call result, replacing errors with the sentinel.
fn settle(api_name: &str, target: &str, result: Result<Response>) -> CallResult {
    match result {
        Ok(resp) => CallResult::from(&resp),
        Err(err) => {
            tracing::error!(api = api_name, target, error = %err, "SMAPI call failed");
            CallResult::sentinel()
        }
    }
}
