use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::BACKEND_PORT;
use crate::dispatch::async_poll::DEFAULT_POLL_INTERVAL;
use crate::dispatch::http::BackendClient;
use crate::dispatch::StaticHost;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "mwlocal.toml";

/// Settings for the command-line front-end. The library itself reads no
/// environment; everything reaches it through [`BackendClient`] builders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host the backend runs on (the browser's `window.location.hostname`).
    pub host: String,
    pub port: u16,
    pub poll_interval_ms: u64,
    /// None waits for the transport indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: BACKEND_PORT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            timeout_ms: None,
        }
    }
}

impl Config {
    /// Defaults, then `mwlocal.toml` (or `$MWLOCAL_CONFIG`), then `MWLOCAL_*` env vars.
    pub fn load() -> Self {
        let path = env::var("MWLOCAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)
        } else {
            Self::default()
        };
        config.apply_env(|key| env::var(key).ok());
        config
    }

    /// Read a TOML file. Unreadable or invalid files fall back to defaults.
    pub fn from_file(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read config: {e}");
                return Self::default();
            }
        };
        Self::from_toml(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "invalid config, using defaults: {e}");
            Self::default()
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overlay `MWLOCAL_HOST`, `MWLOCAL_PORT`, `MWLOCAL_POLL_INTERVAL_MS` and
    /// `MWLOCAL_TIMEOUT_MS`. Unparseable values are logged and skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("MWLOCAL_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }
        if let Some(port) = parse_var(&lookup, "MWLOCAL_PORT") {
            self.port = port;
        }
        if let Some(ms) = parse_var(&lookup, "MWLOCAL_POLL_INTERVAL_MS") {
            self.poll_interval_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "MWLOCAL_TIMEOUT_MS") {
            self.timeout_ms = Some(ms);
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn client(&self) -> BackendClient {
        let client = BackendClient::new(StaticHost::new(self.host.clone())).with_port(self.port);
        match self.timeout_ms {
            Some(ms) => client.with_timeout(Duration::from_millis(ms)),
            None => client,
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("{key}={raw:?} is not a valid number, ignoring");
            None
        }
    }
}
