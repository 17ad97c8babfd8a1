// Persistence configuration, read from the optional `layout` section of
// settings.json in the platform config dir, e.g.
// ~/Library/Application Support/tessel/settings.json on macOS,
// ~/.config/tessel/settings.json on Linux.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "tessel:editor-layout";
pub const DEFAULT_APP_DIR: &str = "tessel";
pub const DEFAULT_STORE_FILE: &str = "editor-layout.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Key the snapshot is stored under in every backend.
    pub storage_key: String,
    /// Directory name under the platform config/data dirs.
    pub app_dir: String,
    /// File name of the host store document.
    pub store_file: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            app_dir: DEFAULT_APP_DIR.to_string(),
            store_file: DEFAULT_STORE_FILE.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    layout: PersistConfig,
}

fn settings_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join(DEFAULT_APP_DIR).join("settings.json"))
}

impl PersistConfig {
    pub fn load() -> Self {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<SettingsFile>(&data) {
                Ok(settings) => settings.layout,
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
