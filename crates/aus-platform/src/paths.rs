use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "aus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

/// Where the service keeps its settings, data sets and logs.
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform.
    ///
    /// # Errors
    /// Returns an error when a required base directory (for example the user
    /// home/config/data directory) cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
            Ok(Self::rooted_at(
                &home.join("Library/Application Support").join(APP_DIR),
                &home.join("Library/Application Support").join(APP_DIR),
            ))
        }

        #[cfg(not(target_os = "macos"))]
        {
            let config = dirs::config_dir().ok_or(AppPathsError::ConfigDirUnavailable)?;
            let data = dirs::data_dir().ok_or(AppPathsError::DataDirUnavailable)?;
            Ok(Self::rooted_at(&config.join(APP_DIR), &data.join(APP_DIR)))
        }
    }

    #[must_use]
    pub fn rooted_at(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn data_set_file(&self) -> PathBuf {
        self.data_dir.join("data.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("aus.log")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::AppPaths;

    fn test_paths() -> AppPaths {
        let root = std::env::temp_dir().join("aus-platform-paths-test");
        AppPaths::rooted_at(&root.join("config"), &root.join("data"))
    }

    #[test]
    fn file_paths_use_expected_filenames() {
        let paths = test_paths();

        assert!(
            paths
                .settings_file()
                .ends_with(Path::new("config").join("settings.json"))
        );
        assert!(
            paths
                .data_set_file()
                .ends_with(Path::new("data").join("data.json"))
        );
        assert!(
            paths
                .log_file()
                .ends_with(Path::new("data").join("aus.log"))
        );
    }
}
