//! Settings persistence for `settings.toml`

use std::path::{Path, PathBuf};

use super::types::Settings;
use roverdeck_core::prelude::*;

pub const CONFIG_FILENAME: &str = "settings.toml";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "ROVERDECK_CONFIG_DIR";

const APP_DIR: &str = "roverdeck";

/// Resolve the configuration directory.
///
/// `ROVERDECK_CONFIG_DIR` wins; otherwise the platform config directory
/// (e.g. `~/.config/roverdeck`).
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| Error::config("Could not determine a configuration directory"))
}

/// Load settings from `settings.toml` in `dir`.
///
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_settings(dir: &Path) -> Settings {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No settings file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Save settings to `settings.toml` in `dir`.
///
/// Creates the directory if needed. Uses atomic write (temp file + rename).
pub fn save_settings(dir: &Path, settings: &Settings) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create {:?}: {}", dir, e)))?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    let temp_path = dir.join(".settings.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("{}{}", generate_config_header(), content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

fn generate_config_header() -> String {
    r#"# Rover Deck Configuration
# Generated by roverdeck; [endpoint] is rewritten when the operator saves.

"#
    .to_string()
}
