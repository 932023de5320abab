//! Configuration module for CelebA preparation
//!
//! Every value has a default; the environment may override any of them.
//! Defaults come from utils/constants.rs.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_CHUNK_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DRIVE_URL,
    DEFAULT_MAX_RETRIES, BASE_RETRY_MS,
};

pub const ENV_ROOT: &str = "CELEBA_ROOT";
pub const ENV_DRIVE_URL: &str = "CELEBA_DRIVE_URL";
pub const ENV_MAX_RETRIES: &str = "CELEBA_MAX_RETRIES";
pub const ENV_CONNECT_TIMEOUT: &str = "CELEBA_CONNECT_TIMEOUT_SECS";
pub const ENV_CHUNK_TIMEOUT: &str = "CELEBA_CHUNK_TIMEOUT_SECS";
pub const ENV_PROGRESS: &str = "CELEBA_PROGRESS";

/// Configuration for dataset provisioning
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Directory the `celeba/` folder is created in
    pub root: PathBuf,
    /// Drive direct-download endpoint
    pub drive_url: String,
    /// Attempts per file (at least 1)
    pub max_retries: u32,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Max wait for the next body chunk
    pub chunk_timeout: Duration,
    /// Draw progress bars while downloading
    pub show_progress: bool,
    /// First retry delay, doubled on every further attempt
    pub retry_base: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            drive_url: DEFAULT_DRIVE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            chunk_timeout: Duration::from_secs(DEFAULT_CHUNK_TIMEOUT_SECS),
            show_progress: true,
            retry_base: Duration::from_millis(BASE_RETRY_MS),
        }
    }
}

impl ProvisionConfig {
    /// Build the configuration from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.is_empty()) {
            config.root = PathBuf::from(root);
        }
        if let Some(url) = lookup(ENV_DRIVE_URL).filter(|v| !v.is_empty()) {
            info!("🔧 Using Drive endpoint override {}", url);
            config.drive_url = url;
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            let retries: u32 = parse_value(ENV_MAX_RETRIES, &raw)?;
            if retries == 0 {
                return Err(AppError::invalid_config(ENV_MAX_RETRIES, &raw));
            }
            config.max_retries = retries;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout = Duration::from_secs(parse_value(ENV_CONNECT_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CHUNK_TIMEOUT) {
            config.chunk_timeout = Duration::from_secs(parse_value(ENV_CHUNK_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_PROGRESS) {
            config.show_progress = parse_flag(ENV_PROGRESS, &raw)?;
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_config(key, raw))
}

fn parse_flag(key: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::invalid_config(key, raw)),
    }
}
