use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::config::StorageBackend;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/plank`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("plank"))
        } else {
            ProjectDirs::from("", "", "plank").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// Location of the history for the given backend: a database file or a directory
    pub fn history_location(data_dir: &Path, backend: StorageBackend) -> PathBuf {
        match backend {
            StorageBackend::Sqlite => data_dir.join("history.db"),
            StorageBackend::File => data_dir.to_path_buf(),
        }
    }

    pub fn log_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("logs")
    }
}
