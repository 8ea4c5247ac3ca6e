use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::session::TestMode;
use crate::words::Language;

/// Preferences used when the command line leaves an option unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub default_language: Language,
    pub default_mode: TestMode,
    /// Seconds, for time mode
    pub default_duration: usize,
    /// Words, for word mode
    pub default_length: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            default_language: Language::En,
            default_mode: TestMode::Time,
            default_duration: 30,
            default_length: 25,
        }
    }
}

impl UserSettings {
    pub fn config_value_for(&self, mode: TestMode) -> usize {
        match mode {
            TestMode::Time => self.default_duration,
            TestMode::Words => self.default_length,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> UserSettings;
    fn save(&self, settings: &UserSettings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "monkeytyper") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("monkeytyper_settings.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> UserSettings {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("no settings at {}: {}, using defaults", self.path.display(), e);
                return UserSettings::default();
            }
        };

        match serde_json::from_slice::<UserSettings>(&bytes) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "invalid settings file {}: {}, using defaults",
                    self.path.display(),
                    e
                );
                UserSettings::default()
            }
        }
    }

    fn save(&self, settings: &UserSettings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("settings.json"));
        let settings = UserSettings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileConfigStore::with_path(&path);
        let settings = UserSettings {
            default_language: Language::Id,
            default_mode: TestMode::Words,
            default_duration: 60,
            default_length: 50,
        };
        store.save(&settings).unwrap();
        assert!(path.exists());
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), UserSettings::default());
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), UserSettings::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "default_mode": "words", "default_language": "id" }"#).unwrap();

        let settings = FileConfigStore::with_path(&path).load();
        assert_eq!(settings.default_mode, TestMode::Words);
        assert_eq!(settings.default_language, Language::Id);
        assert_eq!(settings.default_duration, 30);
        assert_eq!(settings.config_value_for(TestMode::Words), 25);
    }
}
