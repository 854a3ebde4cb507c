//! Module configuration with TOML file and environment variable support.
//!
//! Configuration covers the *harness* side of a run (which tool to invoke,
//! where the cluster-manager API lives, credentials, timeouts). Per-run
//! parameters such as the principal name stay on the command line.
//!
//! Precedence, lowest to highest: built-in defaults, TOML file, `KRBKIT_*`
//! environment variables. Command-line flags override all of these in the
//! binaries.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "krbkit.toml",
    "./config/krbkit.toml",
    "/etc/krbkit/config.toml",
];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root module configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub kadmin: KadminConfig,
    pub cluster_manager: ClusterManagerConfig,
}

/// Settings for invoking the Kerberos administration tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KadminConfig {
    /// Path of the admin tool binary. Resolved through PATH when relative.
    pub path: String,
    /// Deadline for one tool invocation, in seconds.
    pub timeout_secs: u64,
}

impl Default for KadminConfig {
    fn default() -> Self {
        Self {
            path: "kadmin.local".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Settings for the cluster-manager user API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterManagerConfig {
    /// Base URL, scheme included (e.g. "https://cm.example.com:7183").
    pub url: String,
    /// API login.
    pub username: String,
    /// API password.
    pub password: String,
    /// REST API version segment (`/api/v{n}`).
    pub api_version: u32,
    /// Deadline for one API request, in seconds.
    pub timeout_secs: u64,
    /// Skip TLS certificate verification (self-signed lab clusters only).
    pub accept_invalid_certs: bool,
}

impl Default for ClusterManagerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            api_version: 12,
            timeout_secs: 60,
            accept_invalid_certs: false,
        }
    }
}

impl ModuleConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ModuleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Load from an explicit file (if given), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => ConfigLoader::with_path(p).load(),
            None => Self::load(),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<ModuleConfig, ConfigError> {
        let mut config = ModuleConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = ModuleConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        // Explicit path wins even when missing on disk would be an error; the
        // loader only skips silently for the search-path fallbacks.
        if let Some(path) = &self.config_path {
            return Some(path.clone());
        }

        if let Ok(path) = env::var("KRBKIT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn apply_env_overrides(&self, config: &mut ModuleConfig) {
        // kadmin
        if let Ok(val) = env::var("KRBKIT_KADMIN_PATH") {
            config.kadmin.path = val;
        }
        if let Ok(val) = env::var("KRBKIT_KADMIN_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.kadmin.timeout_secs = secs;
            }
        }

        // cluster manager
        if let Ok(val) = env::var("KRBKIT_CM_URL") {
            config.cluster_manager.url = val;
        }
        if let Ok(val) = env::var("KRBKIT_CM_USERNAME") {
            config.cluster_manager.username = val;
        }
        if let Ok(val) = env::var("KRBKIT_CM_PASSWORD") {
            config.cluster_manager.password = val;
        }
        if let Ok(val) = env::var("KRBKIT_CM_API_VERSION") {
            if let Ok(version) = val.parse() {
                config.cluster_manager.api_version = version;
            }
        }
        if let Ok(val) = env::var("KRBKIT_CM_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.cluster_manager.timeout_secs = secs;
            }
        }
        if let Ok(val) = env::var("KRBKIT_CM_ACCEPT_INVALID_CERTS") {
            config.cluster_manager.accept_invalid_certs = val.parse().unwrap_or(false);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
