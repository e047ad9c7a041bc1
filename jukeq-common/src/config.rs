//! Configuration loading
//!
//! Settings come from a TOML file with serde defaults; the binary layers
//! CLI/environment overrides on top (priority: CLI > env > file > default).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Service configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub admission: AdmissionWindow,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub moderation: ModerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on admin endpoints; None disables the check
    #[serde(default)]
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Time-of-day window during which sessions may be started
///
/// The window bound is deliberately configuration, not a constant: observed
/// deployments ran both 15:00-18:00 and all-day policies. The check is
/// advisory policy (the venue's quiet hours), not security.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionWindow {
    /// First hour (0-23) at which sessions may start
    #[serde(default)]
    pub open_hour: u32,

    /// Hour (0-23) at which the window closes; equal to `open_hour` means
    /// the window never closes
    #[serde(default)]
    pub close_hour: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Upper bound on a video metadata lookup, in milliseconds
    #[serde(default = "default_resolver_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModerationConfig {
    /// Apply the message content heuristics on submission
    #[serde(default = "default_true")]
    pub filter_messages: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_db_path() -> String {
    "jukeq.db".to_string()
}

fn default_resolver_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for AdmissionWindow {
    fn default() -> Self {
        // All-day by default
        Self {
            open_hour: 0,
            close_hour: 0,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_resolver_timeout_ms(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            filter_messages: default_true(),
        }
    }
}

impl AdmissionWindow {
    /// Whether a session may be started at the given hour of day (0-23)
    ///
    /// Supports overnight windows (`open_hour > close_hour`, e.g. 22..6).
    pub fn allows(&self, hour: u32) -> bool {
        if self.open_hour == self.close_hour {
            return true;
        }
        if self.open_hour < self.close_hour {
            (self.open_hour..self.close_hour).contains(&hour)
        } else {
            hour >= self.open_hour || hour < self.close_hour
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Load from an optional path, falling back to compiled defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Config::default()),
        }
    }
}
