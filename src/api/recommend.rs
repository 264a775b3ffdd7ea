//! Mood-based recommendation route
//!
//! Always answers 200 with either `{mood, songs}` or `{error}`.

use std::sync::Arc;

use actix_web::{post, web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::{info, warn};

use super::AppState;
use crate::core::select_songs;
use crate::models::{ErrorPayload, Mood, RecommendError};

/// Form body for a recommendation request
#[derive(Debug, Default, Deserialize)]
pub struct RecommendForm {
    #[serde(default)]
    pub artist: String,
}

/// Detect the user's mood, then pick songs by the requested artist
#[post("/recommend")]
pub async fn recommend(
    state: web::Data<AppState>,
    form: Option<web::Form<RecommendForm>>,
) -> impl Responder {
    let artist = form
        .map(|f| f.into_inner().artist)
        .unwrap_or_default()
        .to_lowercase();

    // no point opening the camera without songs to pick from
    if state.catalog.is_empty() {
        return HttpResponse::Ok().json(ErrorPayload::from(RecommendError::CatalogUnavailable));
    }

    let detector = Arc::clone(&state.detector);
    let cancel = state.shutdown.child_token();
    let mood = match web::block(move || detector.detect(&cancel)).await {
        Ok(mood) => mood,
        Err(e) => {
            warn!("Mood detection did not finish: {}", e);
            Mood::default()
        }
    };

    match select_songs(&state.catalog, &artist, mood) {
        Ok(recommendation) => {
            info!(
                "Recommending {} song(s) for '{}' ({})",
                recommendation.songs.len(),
                artist,
                mood
            );
            HttpResponse::Ok().json(recommendation)
        }
        Err(e) => {
            info!("No recommendation for '{}' ({}): {}", artist, mood, e);
            HttpResponse::Ok().json(ErrorPayload::from(e))
        }
    }
}
