//! Idempotent client for the z/VM SMAPI management interface.
//!
//! `smapi` sends one administrative command per TLS connection to the
//! SMAPI socket server and classifies the reply. A non-zero return code
//! whose message says the target state already holds is reported as
//! [`Outcome::AlreadySatisfied`], so declarative tooling can re-run
//! operations safely.
//!
//! # Quick start
//!
//! ```no_run
//! use smapi::{Client, ErrorCatalog, NicDef, NicType, DEFAULT_PORT};
//!
//! let client = Client::builder("zvm.example.com", DEFAULT_PORT)
//!     .credentials("MAINT", "secret")
//!     .build()
//!     .expect("TLS setup failed");
//!
//! let op = NicDef::define("0600", NicType::Qdio).lan(None, "VSW1");
//! let outcome = client.apply("LINUX01", &op, &ErrorCatalog::builtin());
//! println!("{}", serde_json::to_string(&outcome.report()).unwrap());
//! ```

mod catalog;
mod classify;
mod client;
mod config;
mod error;
mod ops;
#[cfg(test)]
mod testing;
mod transport;

pub use catalog::{ErrorCatalog, OpKind};
pub use classify::{Outcome, PlannedCall, Report, SKIP_NOTE, UNSET_CODE, classify};
pub use client::{CallResult, Client, ClientBuilder, DEFAULT_PORT, SENTINEL, call};
pub use config::{Config, ConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT};
pub use error::{DecodeError, EncodeError, Error, Result};
pub use ops::{DEFAULT_LAN_OWNER, NicDef, NicType, Operation, SetShare, ShareKind};
pub use smapi_proto::{MessageLine, Request, Response};
pub use transport::{Connection, Transport, tls_config};
