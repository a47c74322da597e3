//! Settings persistence: load and save settings to disk.
//!
//! Settings are stored in the platform-specific configuration folder:
//! - macOS: ~/Library/Application Support/dev.zod-tester.zod-tester/
//! - Windows: %APPDATA%/zod-tester/zod-tester/config/
//! - Linux: ~/.config/zod-tester/

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use zt_loader::CdnSettings;
use zt_registry::RegistrySettings;

const APP_QUALIFIER: &str = "dev";
const APP_ORG: &str = "zod-tester";
const APP_NAME: &str = "zod-tester";
const CONFIG_FILENAME: &str = "settings.toml";

/// Everything the command line can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Package registry access.
    pub registry: RegistrySettings,
    /// Module and declaration CDN access.
    pub cdn: CdnSettings,
}

/// Get the path to the settings file.
///
/// Returns `None` if the platform-specific directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load settings from `path`.
///
/// Returns default settings if the file doesn't exist or cannot be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Settings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file found at {:?}, using defaults", path);
            Settings::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read settings file: {}, using defaults", e);
            Settings::default()
        }
    }
}

/// Save settings to `path`, creating the parent directory if needed.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config directory")?;
    }
    let content = toml::to_string_pretty(settings).context("serialize settings")?;
    fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
    tracing::info!("Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_path_names_file() {
        if let Some(path) = settings_path() {
            assert!(path.ends_with(CONFIG_FILENAME));
        }
    }

    #[test]
    fn test_default_settings_round_trip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[cdn]"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let parsed: Settings = toml::from_str(
            "[registry]\nfallback_version = \"3.23.8\"\n\n[cdn]\ncdn_url = \"http://localhost:9000\"\n",
        )
        .unwrap();
        assert_eq!(parsed.registry.fallback_version, "3.23.8");
        assert_eq!(parsed.registry.ttl_hours, 24);
        assert_eq!(parsed.cdn.cdn_url, "http://localhost:9000");
        assert_eq!(parsed.cdn.package, "zod");
    }
}
