use std::path::PathBuf;

/// Standardized application directories for Arbor. Preferences resolve
/// their own location through `dirs`; everything else lives under the
/// platform data directory.
pub struct AppPaths;

impl AppPaths {
    /// Return the user-level data directory (platform-specific)
    pub fn user_data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "arbor").map(|d| d.data_dir().to_path_buf())
    }

    /// One JSON file per conversation lives here
    pub fn conversations_dir() -> Option<PathBuf> {
        Self::user_data_dir().map(|d| d.join("conversations"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        Self::user_data_dir().map(|d| d.join("logs"))
    }
}
