// Landing page and import trigger handlers

use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpResponse, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::pages;
use super::server::AppState;
use crate::job::JobError;
use crate::queries;
use crate::writer::open_reader;

#[derive(Debug, Deserialize)]
pub struct ScrapeForm {
    pub secret_key: Option<String>,
}

pub(crate) fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body)
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Run `f` against a fresh connection on the blocking thread pool
pub(crate) async fn with_connection<T, F>(state: &web::Data<AppState>, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let path = state.database.clone();
    web::block(move || {
        let conn = open_reader(&path)?;
        f(&conn)
    })
    .await
    .map_err(ErrorInternalServerError)?
    .map_err(|err| {
        error!(error = %format!("{:#}", err), "Database query failed");
        ErrorInternalServerError(err)
    })
}

pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    let counts = with_connection(&state, queries::dataset_counts).await?;
    Ok(html(pages::landing(&counts)))
}

pub async fn scrape_form() -> HttpResponse {
    html(pages::scrape_form(None))
}

pub async fn scrape_submit(
    state: web::Data<AppState>,
    form: web::Form<ScrapeForm>,
) -> Result<HttpResponse> {
    if form.secret_key.as_deref() != Some(state.secret.as_str()) {
        warn!("Import trigger rejected: invalid secret key");
        return Ok(html(pages::scrape_form(Some(pages::INVALID_SECRET))));
    }

    match state
        .jobs
        .spawn_import(state.fetch.clone(), state.database.clone())
    {
        Ok(_) => {
            info!("Background import started");
            Ok(see_other("/scrape/progress"))
        }
        Err(err @ JobError::AlreadyRunning) => Ok(html(pages::scrape_form(Some(&err.to_string())))),
        Err(err) => Err(ErrorInternalServerError(err)),
    }
}

pub async fn scrape_progress() -> HttpResponse {
    html(pages::progress_page())
}

pub async fn scrape_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.jobs.status())
}

pub async fn scrape_completed(state: web::Data<AppState>) -> HttpResponse {
    let status = state.jobs.status();
    if status.is_finished() {
        html(pages::completed_page(&status))
    } else {
        see_other("/scrape/progress")
    }
}
