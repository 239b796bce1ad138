//! Application configuration management

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use super::models::{AppError, AppResult};

/// Default secret matching the upstream development fallback. Deployments
/// must override it via `VIDFETCH_SECRET_KEY`.
const DEV_SECRET: &str = "dev-secret-key-change-in-production";

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Secret used to sign flash cookies
    pub secret_key: String,

    /// Directory downloaded and converted files land in
    pub download_dir: PathBuf,

    /// Path of the SQLite job database
    pub database_path: PathBuf,

    /// Number of background worker slots
    pub workers: usize,

    /// Capacity of the pending-job channel
    pub queue_capacity: usize,

    /// yt-dlp binary to invoke
    pub yt_dlp_bin: PathBuf,

    /// ffmpeg binary to invoke
    pub ffmpeg_bin: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 5000).into(),
            secret_key: DEV_SECRET.to_string(),
            download_dir: PathBuf::from("downloads"),
            database_path: PathBuf::from("downloads.db"),
            workers: 2,
            queue_capacity: 64,
            yt_dlp_bin: PathBuf::from("yt-dlp"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional `vidfetch.toml` next to the
    /// binary, overridden by `VIDFETCH_*` environment variables.
    pub fn load() -> AppResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name("vidfetch").required(false))
            .add_source(config::Environment::with_prefix("VIDFETCH"))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let cfg: Self = cfg
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        if self.workers == 0 {
            return Err(AppError::Config(
                "workers must be greater than 0".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(AppError::Config("secret_key must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn using_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.using_dev_secret());
        assert_eq!(cfg.workers, 2);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cfg = AppConfig {
            workers: 0,
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let cfg = AppConfig {
            secret_key: String::new(),
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
