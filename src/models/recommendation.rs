//! Recommendation results and failures

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Mood, Song};

/// Songs picked for a detected mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub mood: Mood,
    pub songs: Vec<Song>,
}

/// Why no recommendation could be made.
///
/// The display strings are what clients see in the `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("Dataset not found.")]
    CatalogUnavailable,
    #[error("No songs found for that artist.")]
    ArtistNotFound,
    #[error("No songs found for this mood.")]
    NoSongsForMood,
}

/// Error body returned in place of a recommendation
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl From<RecommendError> for ErrorPayload {
    fn from(err: RecommendError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
