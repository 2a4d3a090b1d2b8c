pub mod cli;
pub mod config;
pub mod fetch;
pub mod import;
pub mod job;
pub mod logging;
pub mod parser;
pub mod paths;
pub mod queries;
pub mod schema;
pub mod ui;
pub mod web;
pub mod writer;

pub use cli::{Cli, Commands};
pub use import::run_import;
pub use job::{ImportJobs, JobStatus};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
pub use writer::{ImportSummary, SqliteWriter};
