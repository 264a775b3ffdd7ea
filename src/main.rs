//! moodtunes - webcam mood detection with mood-matched song recommendations

mod api;
mod config;
mod core;
mod models;
mod stores;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// moodtunes - songs for the mood on your face
#[derive(Parser, Debug)]
#[command(name = "moodtunes")]
#[command(version)]
#[command(about = "Recommends songs matching the mood read from your webcam")]
struct Args {
    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Parent of the config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Song catalog CSV
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Don't show or save anything while sampling
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::new(format!(
        "{},hyper=warn,reqwest=warn",
        log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("moodtunes v{} starting...", env!("CARGO_PKG_VERSION"));

    let paths = config::Paths::init(args.config.clone())?;
    info!("Config directory: {:?}", paths.config_dir());

    let mut settings = config::Settings::load(&paths.settings_path())?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(catalog) = args.catalog {
        settings.catalog.path = Some(catalog);
    }

    run(settings, args.headless).await
}

async fn run(settings: config::Settings, headless: bool) -> Result<()> {
    use crate::api::AppState;
    use crate::core::camera::ensure_ffmpeg;
    use crate::core::{CameraMoodDetector, MoodDetector};
    use crate::stores::Catalog;

    info!("Checking ffmpeg availability...");
    if let Err(e) = tokio::task::spawn_blocking(ensure_ffmpeg).await? {
        tracing::warn!("Failed to ensure ffmpeg: {}. Mood detection will fall back to the default mood.", e);
    }

    let paths = config::Paths::get()?;

    info!("Loading catalog...");
    let catalog_path = settings.catalog_path(&paths);
    let catalog = Arc::new(Catalog::load(&catalog_path));
    if catalog.is_empty() {
        tracing::warn!(
            "Catalog is empty; every recommendation will report a missing dataset. \
             Put a CSV at {:?} or pass --catalog.",
            catalog_path
        );
    }

    let snapshot_dir = settings.sampler.snapshots.then(|| paths.snapshots_dir());
    let detector: Arc<dyn MoodDetector> =
        Arc::new(CameraMoodDetector::new(&settings, snapshot_dir, headless));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down, cancelling mood sampling");
                shutdown.cancel();
            }
        });
    }

    let state = actix_web::web::Data::new(AppState {
        catalog,
        detector,
        shutdown,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on http://{}", addr);

    use actix_cors::Cors;
    use actix_web::{middleware, App, HttpServer};

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
