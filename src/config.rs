use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::database::{AppContext, DEFAULT_DATABASE_NAME};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BusScheduleConfig {
    pub asset_dir: Option<String>,
    pub data_dir: Option<String>,
    pub database_name: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

impl BusScheduleConfig {
    /// Environment handle for the database accessor, relative to `base`
    pub fn context(&self, base: &Path) -> AppContext {
        let asset_dir = self
            .asset_dir
            .as_deref()
            .map(|p| base.join(p))
            .unwrap_or_else(|| base.join("assets"));
        let data_dir = self
            .data_dir
            .as_deref()
            .map(|p| base.join(p))
            .unwrap_or_else(|| default_data_dir_in(base));

        AppContext::new(asset_dir, data_dir)
            .with_database_name(self.database_name.as_deref().unwrap_or(DEFAULT_DATABASE_NAME))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS).max(1))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("busschedule.toml")
}

pub fn default_data_dir_in(base: &Path) -> PathBuf {
    base.join(".busschedule")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BusScheduleConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: BusScheduleConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BusScheduleConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
