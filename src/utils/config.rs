// Centralized configuration for the welcome bot

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_CONFIG_PATH: &str = "guild_configs.json";
pub const DEFAULT_BACKUP_PREFIX: &str = "guild_configs_backup";

/// Discord embed colors
pub mod colors {
    pub const SUCCESS: u32 = 0x00ff00;
    pub const INFO: u32 = 0x0099ff;
    pub const WARNING: u32 = 0xff9900;
    pub const ERROR: u32 = 0xff0000;
}

/// Process settings read from the environment (`.env` honored)
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    /// Primary guild config file
    pub config_path: PathBuf,
    /// Backups are written to `<prefix>_<YYYYMMDD_HHMMSS>.json`
    pub backup_prefix: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;
        Ok(Self::with_lookup(token, |key| env::var(key).ok()))
    }

    fn with_lookup(token: String, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config_path = lookup("GUILD_CONFIG_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let backup_prefix = lookup("BACKUP_PREFIX")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKUP_PREFIX.to_string());

        Self {
            token,
            config_path: PathBuf::from(config_path),
            backup_prefix,
        }
    }
}
