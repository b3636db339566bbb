//! Resolver configuration at ~/.cantiere/config.json.
//!
//! A missing file means defaults. Missing fields default individually.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "CantieriApp/1.0";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Sent as `User-Agent` on every outbound request. Nominatim rejects anonymous clients.
    pub user_agent: String,
    /// Base URL of the Nominatim-compatible geocoding service.
    pub nominatim_url: String,
    /// Per-request timeout. Zero means the default.
    pub timeout_secs: u64,
    /// How many short-link expansions a single parse may chain.
    pub max_redirect_hops: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_redirect_hops: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ResolverConfig {
    /// Load from the default location (~/.cantiere/config.json).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io { path: path.to_path_buf(), source });
            }
        };
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cantiere")
            .join("config.json")
    }

    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// `nominatim_url` joined with an endpoint path, tolerating a trailing slash.
    pub fn nominatim_endpoint(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.nominatim_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}
