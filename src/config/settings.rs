//! Service settings
//!
//! Layered as built-in defaults, then `settings.toml` in the config directory,
//! then `MOODTUNES__SECTION__KEY` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Paths, FINAL_MOOD_PAUSE, MOOD_TIME_BUDGET};

/// Settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub catalog: CatalogSettings,
    pub camera: CameraSettings,
    pub sampler: SamplerSettings,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// CSV file with `track_name`, `artist_name` and `valence` columns
    pub path: Option<PathBuf>,
}

/// Capture device passed to ffmpeg as `-f <format> -i <device>`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub format: String,
    pub device: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub framerate: Option<u32>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            format: default_camera_format(),
            device: default_camera_device(),
            width: None,
            height: None,
            framerate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub time_budget_secs: f64,
    /// Stop after this many captured frames, even if time remains
    pub max_frames: Option<usize>,
    pub final_pause_ms: u64,
    /// Write an annotated snapshot of the last frame after each sampling run
    pub snapshots: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            time_budget_secs: MOOD_TIME_BUDGET.as_secs_f64(),
            max_frames: None,
            final_pause_ms: FINAL_MOOD_PAUSE.as_millis() as u64,
            snapshots: false,
        }
    }
}

impl SamplerSettings {
    /// Non-positive or NaN budgets mean zero; ones too large for a `Duration`
    /// fall back to the default
    pub fn time_budget(&self) -> Duration {
        if self.time_budget_secs.is_nan() || self.time_budget_secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.time_budget_secs).unwrap_or(MOOD_TIME_BUDGET)
    }

    pub fn final_pause(&self) -> Duration {
        Duration::from_millis(self.final_pause_ms)
    }
}

/// DeepFace-compatible emotion analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub detector_backend: String,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5005/analyze".to_string(),
            timeout_ms: 2000,
            detector_backend: "opencv".to_string(),
        }
    }
}

impl ClassifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    /// Load settings, layering the file and environment over the defaults
    pub fn load(settings_path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(settings_path).required(false))
            .add_source(
                ::config::Environment::with_prefix("MOODTUNES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings from {:?}", settings_path))?
            .try_deserialize()
            .context("Failed to parse settings")?;

        Ok(settings)
    }

    /// Catalog path from settings, falling back to the config directory
    pub fn catalog_path(&self, paths: &Paths) -> PathBuf {
        self.catalog
            .path
            .clone()
            .unwrap_or_else(|| paths.default_catalog_path())
    }
}

fn default_camera_format() -> String {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
    .to_string()
}

fn default_camera_device() -> String {
    if cfg!(target_os = "macos") {
        "0"
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera"
    } else {
        "/dev/video0"
    }
    .to_string()
}
