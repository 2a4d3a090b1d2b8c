use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    FetchSettings, DEFAULT_COUNTRIES_URL, DEFAULT_HOST, DEFAULT_INDICATOR_URL, DEFAULT_PORT,
    DEFAULT_TIMEOUT_SECS,
};

#[derive(Parser, Debug)]
#[command(name = "wiki-visualizer")]
#[command(version, about = "Import country reference data into SQLite and chart it over HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Address to bind
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Secret required by the import trigger form
        #[arg(long, env = "SCRAPE_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// Fetch countries and replace the database contents
    Import {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(flatten)]
        fetch: FetchArgs,

        /// No terminal UI, only warnings and the final summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Delete the database and create an empty schema
    InitDb {
        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// List all table names in creation order
    ListTables,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// SQLite database path (defaults to the user data directory)
    #[arg(long = "database", env = "DATABASE_PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Bulk countries endpoint
    #[arg(long, env = "COUNTRIES_API_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    /// Economic indicator API base URL
    #[arg(long, env = "INDICATOR_API_URL", default_value = DEFAULT_INDICATOR_URL)]
    pub indicator_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Use the bundled sample instead of the API
    #[arg(long)]
    pub offline: bool,

    /// Skip GDP lookups
    #[arg(long)]
    pub no_indicators: bool,
}

impl FetchArgs {
    pub fn settings(&self) -> FetchSettings {
        FetchSettings {
            countries_url: self.countries_url.clone(),
            indicator_url: self.indicator_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            offline: self.offline,
            indicators: !self.no_indicators,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_flags() {
        let cli = Cli::try_parse_from([
            "wiki-visualizer",
            "import",
            "--database",
            "/tmp/wiki.db",
            "--offline",
            "--timeout-secs",
            "5",
            "--quiet",
        ])
        .unwrap();

        match cli.command {
            Commands::Import {
                database,
                fetch,
                quiet,
            } => {
                assert_eq!(database.path, Some(PathBuf::from("/tmp/wiki.db")));
                assert!(quiet);
                let settings = fetch.settings();
                assert!(settings.offline);
                assert!(settings.indicators);
                assert_eq!(settings.timeout, Duration::from_secs(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_requires_secret() {
        let cli = Cli::try_parse_from([
            "wiki-visualizer",
            "serve",
            "--secret",
            "hunter2",
            "--port",
            "8080",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve { secret, port, .. } => {
                assert_eq!(secret, "hunter2");
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
