//! Runtime settings shared by the CLI, the import pipeline and the server.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Once;
use std::time::Duration;

pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all";
pub const DEFAULT_INDICATOR_URL: &str = "https://api.worldbank.org/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

static DOTENV: Once = Once::new();

/// Load `.env` from the working directory once. Safe to call many times.
pub fn load_dotenv() {
    DOTENV.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Where and how the import pipeline fetches its data
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub countries_url: String,
    pub indicator_url: String,
    pub timeout: Duration,
    /// Skip the remote request and use the bundled sample
    pub offline: bool,
    /// Look up GDP figures for the first countries of a remote dataset
    pub indicators: bool,
}

impl FetchSettings {
    /// Deterministic settings: bundled sample, no indicator lookups
    pub fn offline() -> Self {
        Self {
            offline: true,
            indicators: false,
            ..Self::default()
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            indicator_url: DEFAULT_INDICATOR_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            offline: false,
            indicators: true,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Shared secret required to trigger an import
    pub secret: String,
    pub database: PathBuf,
    pub fetch: FetchSettings,
}

impl ServerSettings {
    pub fn new(
        host: String,
        port: u16,
        secret: String,
        database: PathBuf,
        fetch: FetchSettings,
    ) -> Result<Self> {
        if secret.trim().is_empty() {
            bail!("SCRAPE_SECRET must not be empty");
        }

        Ok(Self {
            host,
            port,
            secret,
            database,
            fetch,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
