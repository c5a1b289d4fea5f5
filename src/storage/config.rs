//! Host Configuration
//!
//! `config.json` in the data directory. Absent fields take their defaults;
//! a missing file is created with the defaults written out in full.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_app_dir};

#[derive(Debug)]
pub struct ConfigService {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load `config.json` from the data directory
    pub fn new() -> AppResult<Self> {
        ensure_app_dir()?;
        Self::open(config_path()?)
    }

    pub fn open(path: PathBuf) -> AppResult<Self> {
        let config = if path.exists() {
            read_config(&path)?
        } else {
            let config = AppConfig::default();
            fs::write(&path, serde_json::to_string_pretty(&config)?)?;
            tracing::info!("[Config] wrote defaults to {}", path.display());
            config
        };
        Ok(Self { path, config })
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_config(path: &Path) -> AppResult<AppConfig> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)
        .map_err(|e| AppError::config(format!("{}: {}", path.display(), e)))?;
    config.validate().map_err(AppError::config)?;
    Ok(config)
}
