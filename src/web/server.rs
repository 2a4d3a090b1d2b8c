// HTTP server setup using actix-web

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use super::routes;
use crate::config::{FetchSettings, ServerSettings};
use crate::job::ImportJobs;
use crate::writer::open_database;

/// Shared by every worker of the server
pub struct AppState {
    pub database: PathBuf,
    pub secret: String,
    pub jobs: ImportJobs,
    pub fetch: FetchSettings,
}

impl AppState {
    pub fn new(settings: &ServerSettings) -> Self {
        Self {
            database: settings.database.clone(),
            secret: settings.secret.clone(),
            jobs: ImportJobs::new(),
            fetch: settings.fetch.clone(),
        }
    }
}

/// Create the schema if needed, then serve until shutdown
pub async fn run(settings: ServerSettings) -> Result<()> {
    let bind_addr = settings.bind_addr();

    open_database(&settings.database)?;

    info!(
        host = %settings.host,
        port = settings.port,
        database = %settings.database.display(),
        "Starting Wiki Visualizer server"
    );

    let state = web::Data::new(AppState::new(&settings));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure_routes)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind to {}", bind_addr))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
