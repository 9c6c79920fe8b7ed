//! Per-user storage layout

use std::path::PathBuf;

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Directory under the home directory holding tool configuration
const CONFIG_DIR_NAME: &str = ".logcollect";

/// Per-user paths used by the tool outside of a collection run
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// The user's home directory
    pub home_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
        }
    }

    /// Get the configuration directory
    pub fn config_dir(&self) -> Dir {
        Dir::new(self.home_dir.join(CONFIG_DIR_NAME))
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        self.config_dir().file("settings.json")
    }

    /// Get the singleton lock file path
    pub fn lock_file(&self, file_name: &str) -> File {
        File::new(self.home_dir.join(file_name))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home_dir)
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
    }
}
