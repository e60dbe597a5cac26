use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::TransferOptions;

/// Network and chunking parameters (`[transfer]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Hard wall-clock limit for a whole artifact transfer.
    pub transfer_timeout_secs: u64,
    /// Wall-clock limit for fetching a checksum manifest.
    pub manifest_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/sec...
    pub low_speed_limit_bytes: u32,
    /// ...for this many seconds.
    pub low_speed_time_secs: u64,
    /// Receive chunk size in bytes (curl buffer size).
    pub chunk_size_bytes: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            transfer_timeout_secs: 3600,
            manifest_timeout_secs: 60,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            chunk_size_bytes: 32 * 1024,
        }
    }
}

impl From<&TransferConfig> for TransferOptions {
    fn from(cfg: &TransferConfig) -> Self {
        TransferOptions {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs),
            manifest_timeout: Duration::from_secs(cfg.manifest_timeout_secs),
            low_speed_limit: cfg.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            chunk_size: cfg.chunk_size_bytes,
        }
    }
}

/// Global configuration loaded from `~/.config/imgrepo/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImgConfig {
    /// Directory holding materialized images. Defaults to `$XDG_DATA_HOME/imgrepo/images`.
    #[serde(default)]
    pub storage_root: Option<PathBuf>,
    /// Optional TOML catalog replacing the built-in one.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Upper bound on waiting for a progress sink to drain after a transfer.
    #[serde(default)]
    pub progress_timeout_ms: Option<u64>,
    #[serde(default)]
    pub transfer: TransferConfig,
}

const DEFAULT_PROGRESS_TIMEOUT_MS: u64 = 2000;

impl ImgConfig {
    pub fn progress_timeout(&self) -> Duration {
        Duration::from_millis(self.progress_timeout_ms.unwrap_or(DEFAULT_PROGRESS_TIMEOUT_MS))
    }

    /// Configured storage root, or the XDG data default.
    pub fn storage_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.storage_root {
            return Ok(root.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("imgrepo")?;
        Ok(xdg_dirs.get_data_home().join("images"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("imgrepo")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ImgConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ImgConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ImgConfig = toml::from_str(&data)?;
    Ok(cfg)
}
