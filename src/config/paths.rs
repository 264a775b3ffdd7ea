//! Path management for moodtunes
//!
//! Resolves the config directory once at startup and hands out the paths
//! derived from it.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static PATHS: OnceCell<Arc<Paths>> = OnceCell::new();

/// Filesystem locations used by the service
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
}

impl Paths {
    /// Initialize the paths singleton
    pub fn init(config: Option<PathBuf>) -> Result<Arc<Paths>> {
        let paths = PATHS.get_or_try_init(|| {
            let paths = Self::new(config)?;
            Ok::<_, anyhow::Error>(Arc::new(paths))
        })?;
        Ok(Arc::clone(paths))
    }

    /// Get the global paths instance
    pub fn get() -> Result<Arc<Paths>> {
        PATHS.get().map(Arc::clone).context("Paths not initialized")
    }

    fn new(config_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_override {
            Some(parent) => parent.join("moodtunes"),
            None => directories::ProjectDirs::from("", "", "moodtunes")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".moodtunes")),
        };

        let paths = Self { config_dir };
        paths.create_directories()?;

        Ok(paths)
    }

    fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir).with_context(|| {
            format!("Failed to create config directory {:?}", self.config_dir)
        })?;
        std::fs::create_dir_all(self.snapshots_dir())?;
        Ok(())
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }

    /// Catalog location used when settings don't name one
    pub fn default_catalog_path(&self) -> PathBuf {
        self.config_dir.join("spotify_dataset.csv")
    }

    /// Where annotated final-mood frames are written
    pub fn snapshots_dir(&self) -> PathBuf {
        self.config_dir.join("snapshots")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_creation() {
        let temp_dir = TempDir::new().unwrap();

        // Note: Can't use init() in tests due to OnceCell
        let paths = Paths::new(Some(temp_dir.path().to_path_buf())).unwrap();

        assert!(paths.config_dir().exists());
        assert!(paths.snapshots_dir().exists());
        assert_eq!(
            paths.settings_path(),
            temp_dir.path().join("moodtunes").join("settings.toml")
        );
        assert!(paths
            .default_catalog_path()
            .ends_with("moodtunes/spotify_dataset.csv"));
    }
}
