//! Service configuration.
//!
//! Loading flow:
//! 1. Start with compiled defaults
//! 2. If a config file is given and exists, deep-merge its values over the
//!    defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules: objects merge recursively (source overrides target
//! per-key), arrays and primitives are replaced entirely, nulls in the
//! source are skipped.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// HTTP listener configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `8080`).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Event database configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the `SQLite` database file.
    pub db_path: String,
    /// Maximum connection pool size.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "chronicle.db".into(),
            pool_size: 8,
            busy_timeout_ms: 30_000,
        }
    }
}

/// Complete service configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronicleConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Event database settings.
    pub storage: StorageConfig,
}

/// Load configuration: defaults, then the optional file, then env vars.
pub fn load_config(path: Option<&Path>) -> Result<ChronicleConfig, ConfigError> {
    let defaults = serde_json::to_value(ChronicleConfig::default())?;

    let merged = match path {
        Some(path) if path.exists() => {
            debug!(?path, "loading config from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        }
        Some(path) => {
            debug!(?path, "config file not found, using defaults");
            defaults
        }
        None => defaults,
    };

    let mut config: ChronicleConfig = serde_json::from_value(merged)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Recursive deep merge of two JSON values.
fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides. Invalid values are silently
/// ignored, falling back to file/default.
fn apply_env_overrides(config: &mut ChronicleConfig) {
    if let Some(v) = read_env_string("CHRONICLE_HOST") {
        config.server.host = v;
    }
    if let Some(v) = read_env_parsed::<u16>("CHRONICLE_PORT") {
        config.server.port = v;
    }
    if let Some(v) = read_env_string("CHRONICLE_DB_PATH") {
        config.storage.db_path = v;
    }
    if let Some(v) = read_env_parsed::<u32>("CHRONICLE_POOL_SIZE") {
        config.storage.pool_size = v;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
