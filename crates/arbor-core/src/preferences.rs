use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::session::{DEFAULT_UNDO_LIMIT, EditPolicy, SessionOptions};
use crate::utils::paths::AppPaths;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Preferences {
    pub default_model: Option<String>,

    #[serde(default)]
    pub branching: BranchingPreferences,

    #[serde(default)]
    pub history: HistoryPreferences,

    #[serde(default)]
    pub storage: StoragePreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BranchingPreferences {
    #[serde(default)]
    pub edit: EditPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPreferences {
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoragePreferences {
    pub data_dir: Option<PathBuf>,
}

fn default_undo_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

impl Default for HistoryPreferences {
    fn default() -> Self {
        Self {
            undo_limit: default_undo_limit(),
        }
    }
}

impl Preferences {
    /// Get the path to the preferences file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("arbor").join("preferences.toml"))
    }

    /// Load preferences from disk, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        match toml::from_str(&contents) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                tracing::warn!(
                    target: "arbor::preferences",
                    "Failed to parse preferences file at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save preferences to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize preferences: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Where conversations are stored: the configured directory, or the
    /// platform data directory.
    pub fn conversations_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => AppPaths::conversations_dir().ok_or_else(|| {
                Error::Configuration("Could not determine data directory".to_string())
            }),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            edit_policy: self.branching.edit,
            undo_limit: self.history.undo_limit,
        }
    }
}
