use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub handlers: HandlersConfig,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            handlers: HandlersConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Limits and switches of the HTTP layer.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bytes requested from the socket per read.
    pub read_buffer_size: usize,
    /// Largest accepted header block (and chunk-size or trailer line).
    pub max_header_bytes: usize,
    /// Largest accepted chunk of a chunked request body.
    pub max_chunk_size: usize,
    /// Refuse requests that carry both `Content-Length` and
    /// `Transfer-Encoding: chunked`. When off, the length wins.
    pub reject_ambiguous_framing: bool,
    /// Offer gzip to clients that accept it.
    pub compression: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 8192,
            max_header_bytes: 64 * 1024,
            max_chunk_size: 16 * 1024 * 1024,
            reject_ambiguous_framing: true,
            compression: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// Directory served under `/files/`.
    pub files_root: PathBuf,
    /// Delay between lines of the `/sheep` stream.
    pub sheep_interval_ms: u64,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            files_root: PathBuf::from("."),
            sheep_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Loads the config from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config using `lookup` in place of the environment: the file
    /// named by `CONFIG` (if any) first, then the `LISTEN` override.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_yaml(&text).with_context(|| format!("parsing config file {path}"))?
            }
            None => Self::default(),
        };

        if let Some(listen_addr) = lookup(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
