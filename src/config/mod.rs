/// Database configuration and connection management
pub mod database;

/// Seed catalog loading from config.toml
pub mod catalog;

/// Store settings (company block, session policy, retention, debounce) from config.toml
pub mod settings;

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Store-wide settings
    #[serde(flatten)]
    pub settings: settings::StoreSettings,
    /// Materials to seed on first run
    #[serde(default)]
    pub materials: Vec<catalog::MaterialSeed>,
}

/// Parses an [`AppConfig`] from TOML text.
///
/// # Errors
/// Returns `Error::Config` if the TOML syntax is invalid, a field has the wrong type, or a
/// policy value is out of range.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.settings.validate()?;
    Ok(config)
}

/// Loads the application configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: every section has defaults, so the service
/// starts with an empty seed catalog and default policies.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        tracing::warn!("Config file {} not found, using defaults", path);
        return Ok(AppConfig::default());
    }
    let config = load_config(&path)?;
    tracing::info!(
        "Loaded configuration from {} ({} seed materials)",
        path,
        config.materials.len()
    );
    Ok(config)
}
