use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite file standing in for the warehouse.
    #[serde(default = "default_warehouse_path")]
    pub warehouse_path: String,
    #[serde(default = "default_view")]
    pub default_view: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_warehouse_path() -> String {
    data_dir().join("warehouse.db").to_string_lossy().to_string()
}

fn default_view() -> String {
    "monthly".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warehouse_path: default_warehouse_path(),
            default_view: default_view(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("procure")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("procure")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ReportError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Resolve the warehouse file: explicit override first, then settings.
pub fn warehouse_path(settings: &Settings, override_path: Option<&str>) -> PathBuf {
    let raw = override_path.unwrap_or(&settings.warehouse_path);
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

/// Expand a leading `~` and make existing paths absolute.
pub fn shellexpand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
