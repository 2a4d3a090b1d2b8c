//! HTTP interface: landing page, import trigger and chart pages.

pub mod charts;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod server;
pub mod visualize;

pub use routes::configure_routes;
pub use server::{run, AppState};
