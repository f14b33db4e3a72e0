//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration. File: ~/.config/celldock/config.toml or
/// /etc/celldock/config.toml.
/// Env overrides: CELLDOCK_HUB_TARGET, CELLDOCK_RETRY_MS,
/// CELLDOCK_DIRTY_CONFIDENCE.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Hub link target: the device name or bridge address the transport
    /// resolves (default 127.0.0.1:9670).
    #[serde(default = "default_hub_target")]
    pub hub_target: String,
    /// Fixed backoff between connection attempts, in milliseconds
    /// (default 5000).
    #[serde(default = "default_retry_ms")]
    pub retry_ms: u64,
    /// Confidence above which a detection marks the battery dirty
    /// (default 0.7).
    #[serde(default = "default_dirty_confidence")]
    pub dirty_confidence: f32,
}

fn default_hub_target() -> String {
    "127.0.0.1:9670".to_owned()
}
fn default_retry_ms() -> u64 {
    5000
}
fn default_dirty_confidence() -> f32 {
    0.7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_target: default_hub_target(),
            retry_ms: default_retry_ms(),
            dirty_confidence: default_dirty_confidence(),
        }
    }
}

impl Config {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_default();
    if let Ok(s) = std::env::var("CELLDOCK_HUB_TARGET") {
        if !s.is_empty() {
            c.hub_target = s;
        }
    }
    if let Ok(s) = std::env::var("CELLDOCK_RETRY_MS") {
        if let Ok(ms) = s.parse::<u64>() {
            c.retry_ms = ms;
        }
    }
    if let Ok(s) = std::env::var("CELLDOCK_DIRTY_CONFIDENCE") {
        if let Ok(v) = s.parse::<f32>() {
            c.dirty_confidence = v;
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/celldock/config.toml"));
    }
    out.push(PathBuf::from("/etc/celldock/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}
