// Route table

use super::{handlers, visualize};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        // Import trigger and job status
        .route("/scrape", web::get().to(handlers::scrape_form))
        .route("/scrape", web::post().to(handlers::scrape_submit))
        .route("/scrape/progress", web::get().to(handlers::scrape_progress))
        .route("/scrape/status", web::get().to(handlers::scrape_status))
        .route("/scrape/completed", web::get().to(handlers::scrape_completed))
        // Charts
        .route("/visualize", web::get().to(visualize::index))
        .route("/visualize/countries", web::get().to(visualize::countries))
        .route(
            "/visualize/countries/population-area",
            web::get().to(visualize::population_area),
        )
        .route(
            "/visualize/countries/population-density",
            web::get().to(visualize::population_density),
        )
        .route(
            "/visualize/countries/by-region",
            web::get().to(visualize::by_region),
        )
        .route(
            "/visualize/countries/world-map",
            web::get().to(visualize::world_map),
        )
        .route("/visualize/continents", web::get().to(visualize::continents))
        .route("/visualize/languages", web::get().to(visualize::languages));
}
