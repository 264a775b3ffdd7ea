//! Service status route

use actix_web::{get, web, HttpResponse, Responder};

use super::AppState;

/// Name, version and catalog size
#[get("/")]
pub async fn status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "catalog_rows": state.catalog.len(),
    }))
}
