// Chart page handlers

use actix_web::{web, HttpResponse, Result};

use super::charts::{self, Figure};
use super::handlers::{html, with_connection};
use super::pages;
use super::server::AppState;
use crate::queries::{self, TOP_DENSITY_LIMIT, TOP_LANGUAGE_LIMIT};

const NO_COUNTRY_DATA: &str = "No country data available. Please run the scraper first.";

/// Chart page, or the "no data" page when there were no rows
fn chart_or_empty<T>(
    rows: Vec<T>,
    title: &str,
    empty_message: &str,
    build: impl FnOnce(&[T]) -> Figure,
) -> HttpResponse {
    if rows.is_empty() {
        html(pages::no_data(empty_message))
    } else {
        html(pages::chart_page(title, &build(&rows)))
    }
}

pub async fn index() -> HttpResponse {
    html(pages::visualize_index())
}

pub async fn countries() -> HttpResponse {
    html(pages::countries_index())
}

pub async fn population_area(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rows = with_connection(&state, queries::population_area).await?;
    Ok(chart_or_empty(
        rows,
        "Countries: Population vs Area",
        NO_COUNTRY_DATA,
        charts::population_area,
    ))
}

pub async fn population_density(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rows = with_connection(&state, |conn| queries::top_density(conn, TOP_DENSITY_LIMIT)).await?;
    Ok(chart_or_empty(
        rows,
        "Countries: Population Density",
        NO_COUNTRY_DATA,
        charts::population_density,
    ))
}

pub async fn by_region(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = with_connection(&state, queries::region_stats).await?;
    Ok(chart_or_empty(
        stats,
        "Countries: Regional Analysis",
        "No regional data available.",
        charts::region_dashboard,
    ))
}

pub async fn world_map(state: web::Data<AppState>) -> Result<HttpResponse> {
    let points = with_connection(&state, queries::map_points).await?;
    Ok(chart_or_empty(
        points,
        "World Population Map",
        "No geographic data available.",
        charts::world_map,
    ))
}

pub async fn continents(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = with_connection(&state, queries::continent_stats).await?;
    Ok(chart_or_empty(
        stats,
        "Continental Analysis",
        "No continental data available.",
        charts::continent_treemap,
    ))
}

pub async fn languages(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats =
        with_connection(&state, |conn| queries::language_stats(conn, TOP_LANGUAGE_LIMIT)).await?;
    Ok(chart_or_empty(
        stats,
        "Language Distribution",
        "No language data available.",
        charts::language_bars,
    ))
}
