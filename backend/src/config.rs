//! # Configuration
//!
//! Runtime settings are read from a single YAML file. Every field has a
//! default, so a missing file or a partial file is fine.
//!
//! ```yaml
//! server:
//!   host: "127.0.0.1"
//!   port: 3000
//!   cors_origin: "http://localhost:8080"
//! database_url: "sqlite:guardian_safety.db"
//! log_level: "info"
//! monitoring:
//!   default_daily_limit_minutes: 120
//!   warning_threshold_minutes: 15
//!   context_excerpt_chars: 500
//!   usage_summary_max_days: 90
//! lexicon_path: null
//! ```
//!
//! `DATABASE_URL` and `SERVER_PORT` in the environment override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_PATH_ENV: &str = "GUARDIAN_SAFETY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "guardian_safety.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS; `None` allows any origin
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origin: Some("http://localhost:8080".to_string()),
        }
    }
}

/// Thresholds used by the monitoring services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Daily limit applied when a child's rule sets none
    pub default_daily_limit_minutes: u32,
    /// Remaining minutes at or below which a warning is raised
    pub warning_threshold_minutes: u32,
    /// Characters of the original content kept in an incident's context
    pub context_excerpt_chars: usize,
    pub usage_summary_max_days: u32,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            default_daily_limit_minutes: 120,
            warning_threshold_minutes: 15,
            context_excerpt_chars: 500,
            usage_summary_max_days: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    /// Default `tracing` filter, used when `RUST_LOG` is unset
    pub log_level: String,
    pub monitoring: MonitoringConfig,
    /// YAML threat lexicon replacing the built-in one
    pub lexicon_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database_url: "sqlite:guardian_safety.db".to_string(),
            log_level: "info".to_string(),
            monitoring: MonitoringConfig::default(),
            lexicon_path: None,
        }
    }
}

impl AppConfig {
    /// Load from the file named by `GUARDIAN_SAFETY_CONFIG` (or the default
    /// path), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(
            std::env::var("DATABASE_URL").ok(),
            std::env::var("SERVER_PORT").ok(),
        )?;
        Ok(config)
    }

    /// Missing files yield the defaults; unreadable or malformed files fail
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, database_url: Option<String>, port: Option<String>) -> Result<()> {
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            self.database_url = url;
        }
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("SERVER_PORT must be a port number, got '{}'", port))?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
