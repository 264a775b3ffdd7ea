//! Configuration module for moodtunes
//!
//! Path management, layered settings and the fixed policy values used by the
//! mood sampler and the song selector.

mod paths;
mod settings;

use std::time::Duration;

pub use paths::Paths;
pub use settings::{CameraSettings, ClassifierSettings, SamplerSettings, Settings};

/// Valence above this is an upbeat track, at or below it a subdued one
pub const VALENCE_SPLIT: f64 = 0.5;

/// Upper bound on songs in one recommendation
pub const MAX_RECOMMENDATIONS: usize = 6;

/// How long the webcam is sampled per request
pub const MOOD_TIME_BUDGET: Duration = Duration::from_secs(7);

/// How long the final mood stays on screen before the camera is released
pub const FINAL_MOOD_PAUSE: Duration = Duration::from_millis(1000);
