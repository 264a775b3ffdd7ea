//! Core library functions for moodtunes

pub mod camera;
pub mod classifier;
pub mod feedback;
pub mod frame;
pub mod sampler;
pub mod selector;

pub use sampler::{CameraMoodDetector, MoodDetector};
pub use selector::select_songs;
