//! Configuration types for devldap.
//!
//! [`Config::load`] layers, in order: the embedded defaults, an optional TOML
//! file, and `DEVLDAP_*` environment variables (`DEVLDAP_SERVER__LISTEN`,
//! `DEVLDAP_DATA__PATH`, ...). Command-line flags are applied on top by the
//! binary. [`Config::defaults`] returns the embedded defaults without touching
//! the filesystem or environment (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[server]
listen       = "127.0.0.1:10389"
authenticate = true

[data]
path        = "data.json"
watch       = true
debounce_ms = 250

[root_dse]
vendor_name     = "devldap"
naming_contexts = []

[log]
filter = "info"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub root_dse: RootDseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// When false, no bind route is registered and every bind succeeds.
    #[serde(default = "default_authenticate")]
    pub authenticate: bool,
}

fn default_listen() -> String { "127.0.0.1:10389".to_string() }
fn default_authenticate() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            authenticate: default_authenticate(),
        }
    }
}

/// `[data]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    #[serde(default = "default_watch")]
    pub watch: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_data_path() -> PathBuf { PathBuf::from("data.json") }
fn default_watch() -> bool { true }
fn default_debounce_ms() -> u64 { 250 }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            watch: default_watch(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[root_dse]` section: what the server says about itself.
#[derive(Debug, Clone, Deserialize)]
pub struct RootDseConfig {
    #[serde(default = "default_vendor_name")]
    pub vendor_name: String,
    #[serde(default = "default_vendor_version")]
    pub vendor_version: String,
    #[serde(default)]
    pub naming_contexts: Vec<String>,
}

fn default_vendor_name() -> String { "devldap".to_string() }
fn default_vendor_version() -> String { env!("CARGO_PKG_VERSION").to_string() }

impl Default for RootDseConfig {
    fn default() -> Self {
        Self {
            vendor_name: default_vendor_name(),
            vendor_version: default_vendor_version(),
            naming_contexts: Vec::new(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the layered configuration. A missing `path` is an error; `None`
    /// skips the file layer.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("DEVLDAP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
