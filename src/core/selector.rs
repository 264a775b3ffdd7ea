//! Song selection by artist and mood

use std::collections::HashSet;

use crate::config::MAX_RECOMMENDATIONS;
use crate::models::{CatalogRow, Mood, Recommendation, RecommendError, Song};
use crate::stores::Catalog;

/// Pick up to `MAX_RECOMMENDATIONS` songs by matching artists that fit `mood`.
///
/// Artist matching is a case-insensitive substring test, so an empty query
/// matches every row. Results keep catalog order and never repeat a
/// `(track, artist)` pair.
pub fn select_songs(
    catalog: &Catalog,
    artist_query: &str,
    mood: Mood,
) -> Result<Recommendation, RecommendError> {
    if catalog.is_empty() {
        return Err(RecommendError::CatalogUnavailable);
    }

    let query = artist_query.to_lowercase();
    let by_artist: Vec<&CatalogRow> = catalog
        .rows()
        .iter()
        .filter(|row| row.artist_name.to_lowercase().contains(&query))
        .collect();

    if by_artist.is_empty() {
        return Err(RecommendError::ArtistNotFound);
    }

    let by_mood: Vec<&CatalogRow> = by_artist
        .into_iter()
        .filter(|row| mood.accepts_valence(row.valence))
        .collect();

    if by_mood.is_empty() {
        return Err(RecommendError::NoSongsForMood);
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let songs: Vec<Song> = by_mood
        .into_iter()
        .filter(|&row| seen.insert((row.track_name.as_str(), row.artist_name.as_str())))
        .take(MAX_RECOMMENDATIONS)
        .map(CatalogRow::to_song)
        .collect();

    Ok(Recommendation { mood, songs })
}
