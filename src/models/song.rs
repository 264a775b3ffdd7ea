//! Catalog rows and recommended songs

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the song catalog.
///
/// Deserialized by header name, so datasets with extra columns load as-is.
/// A valence that isn't a number reads as NaN, which fits neither mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub track_name: String,
    pub artist_name: String,
    #[serde(deserialize_with = "lenient_valence")]
    pub valence: f64,
}

fn lenient_valence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse().unwrap_or(f64::NAN))
}

impl CatalogRow {
    #[cfg(test)]
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>, valence: f64) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            valence,
        }
    }

    /// Valence must be a finite number in [0, 1]
    pub fn has_valid_valence(&self) -> bool {
        self.valence.is_finite() && (0.0..=1.0).contains(&self.valence)
    }

    pub fn to_song(&self) -> Song {
        Song::new(self.track_name.clone(), self.artist_name.clone())
    }
}

/// A recommended song as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Song {
    pub track: String,
    pub artist: String,
}

impl Song {
    pub fn new(track: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            artist: artist.into(),
        }
    }
}
