//! Data models for moodtunes

mod mood;
mod recommendation;
mod song;

pub use mood::{EmotionSample, Mood};
pub use recommendation::{ErrorPayload, Recommendation, RecommendError};
pub use song::{CatalogRow, Song};
