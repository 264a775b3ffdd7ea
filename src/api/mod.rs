//! HTTP routes for moodtunes

pub mod home;
pub mod recommend;

use std::sync::Arc;

use actix_web::web;
use tokio_util::sync::CancellationToken;

use crate::core::MoodDetector;
use crate::stores::Catalog;

/// Shared by every worker; nothing in here is mutated after startup
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub detector: Arc<dyn MoodDetector>,
    /// Cancelled on shutdown so an in-flight sampling run stops early
    pub shutdown: CancellationToken,
}

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home::status).service(recommend::recommend);
}
