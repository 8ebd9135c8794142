//! Console configuration.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default server origin. The server ships with a self-signed certificate.
pub const DEFAULT_ORIGIN: &str = "https://localhost:6060";

/// Versioned API path segment every command lives under.
pub const DEFAULT_API_PREFIX: &str = "/api/v1/";

/// Console client configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Server origin (scheme, host, port).
    pub origin: Url,
    /// Path segment prepended to every command.
    pub api_prefix: String,
    /// Per-request timeout. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Accept self-signed server certificates.
    pub accept_invalid_certs: bool,
    /// Pause before the key check is sent.
    pub verify_delay: Duration,
    /// Re-check a remembered key against the server on mount instead of
    /// trusting it.
    pub revalidate_remembered: bool,
    /// File holding the remember-me record.
    pub remember_path: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: Some(Duration::from_secs(10)),
            accept_invalid_certs: true,
            verify_delay: Duration::ZERO,
            revalidate_remembered: false,
            remember_path: PathBuf::from("console-session.json"),
        }
    }
}

fn default_origin() -> Url {
    Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL")
}

impl ConsoleConfig {
    /// Create a config builder.
    pub fn builder() -> ConsoleConfigBuilder {
        ConsoleConfigBuilder::default()
    }

    /// Defaults overlaid with `C2C_CONSOLE_*` environment variables.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(origin) = lookup("C2C_CONSOLE_ORIGIN") {
            match Url::parse(&origin) {
                Ok(url) => config.origin = url,
                Err(e) => tracing::warn!(%origin, error = %e, "ignoring invalid C2C_CONSOLE_ORIGIN"),
            }
        }
        if let Some(secs) = lookup("C2C_CONSOLE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(s) => config.timeout = Some(Duration::from_secs(s)),
                Err(e) => tracing::warn!(%secs, error = %e, "ignoring invalid C2C_CONSOLE_TIMEOUT_SECS"),
            }
        }
        if let Some(flag) = lookup("C2C_CONSOLE_INSECURE") {
            config.accept_invalid_certs = parse_flag(&flag);
        }
        if let Some(ms) = lookup("C2C_CONSOLE_VERIFY_DELAY_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => config.verify_delay = Duration::from_millis(ms),
                Err(e) => tracing::warn!(%ms, error = %e, "ignoring invalid C2C_CONSOLE_VERIFY_DELAY_MS"),
            }
        }
        if let Some(flag) = lookup("C2C_CONSOLE_REVALIDATE") {
            config.revalidate_remembered = parse_flag(&flag);
        }
        if let Some(path) = lookup("C2C_CONSOLE_REMEMBER_PATH") {
            config.remember_path = PathBuf::from(path);
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Builder for [`ConsoleConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfigBuilder {
    config: ConsoleConfig,
}

impl ConsoleConfigBuilder {
    /// Set the server origin.
    pub fn origin(mut self, origin: Url) -> Self {
        self.config.origin = origin;
        self
    }

    /// Set the API path prefix.
    pub fn api_prefix(mut self, prefix: &str) -> Self {
        self.config.api_prefix = prefix.to_string();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Accept or reject self-signed certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Set the pause before the key check.
    pub fn verify_delay(mut self, delay: Duration) -> Self {
        self.config.verify_delay = delay;
        self
    }

    /// Re-check remembered keys on mount.
    pub fn revalidate_remembered(mut self, revalidate: bool) -> Self {
        self.config.revalidate_remembered = revalidate;
        self
    }

    /// Set the remember-me file.
    pub fn remember_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.remember_path = path.into();
        self
    }

    /// Build the config.
    pub fn build(self) -> ConsoleConfig {
        self.config
    }
}
