//! Client configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default TCP connect + TLS handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default socket read/write timeout. Directory manager calls can take
/// minutes on a busy system.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings shared by every call a [`crate::Client`] makes.
///
/// A `None` timeout blocks indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Config {
    /// Timeout for establishing the TCP connection and TLS session.
    pub connect_timeout: Option<Duration>,
    /// Timeout for each socket read.
    pub read_timeout: Option<Duration>,
    /// Timeout for each socket write.
    pub write_timeout: Option<Duration>,
    /// Extra PEM bundle trusted in addition to the platform store.
    pub ca_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Some(DEFAULT_IO_TIMEOUT),
            write_timeout: Some(DEFAULT_IO_TIMEOUT),
            ca_file: None,
        }
    }
}

impl Config {
    /// Creates a new config builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Loads settings from the environment, falling back to defaults.
    ///
    /// Reads `SMAPI_CONNECT_TIMEOUT_SECS`, `SMAPI_READ_TIMEOUT_SECS`,
    /// `SMAPI_WRITE_TIMEOUT_SECS` (`0` disables the timeout) and
    /// `SMAPI_CA_FILE`. Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Like [`Config::from_env`], reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let timeout = |name: &str| {
            let raw = var(name)?;
            parse_timeout(&raw).or_else(|| {
                tracing::warn!(var = name, value = %raw, "ignoring invalid timeout");
                None
            })
        };
        if let Some(t) = timeout("SMAPI_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = t;
        }
        if let Some(t) = timeout("SMAPI_READ_TIMEOUT_SECS") {
            config.read_timeout = t;
        }
        if let Some(t) = timeout("SMAPI_WRITE_TIMEOUT_SECS") {
            config.write_timeout = t;
        }
        if let Some(path) = var("SMAPI_CA_FILE").filter(|p| !p.is_empty()) {
            config.ca_file = Some(PathBuf::from(path));
        }
        config
    }
}

/// Parses whole seconds; `0` disables the timeout.
fn parse_timeout(raw: &str) -> Option<Option<Duration>> {
    match raw.trim().parse::<u64>().ok()? {
        0 => Some(None),
        secs => Some(Some(Duration::from_secs(secs))),
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    /// Config under construction.
    config: Config,
}

impl ConfigBuilder {
    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Trusts the certificates in `path` in addition to the platform store.
    pub fn ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_file = Some(path.into());
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> Config {
        self.config
    }
}
