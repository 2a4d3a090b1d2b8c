use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{info, warn};

use super::sample::sample_countries;
use crate::config::FetchSettings;

const USER_AGENT: &str = concat!("wiki-visualizer/", env!("CARGO_PKG_VERSION"));

/// Where an imported dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Fallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Remote => write!(f, "remote API"),
            DataSource::Fallback => write!(f, "bundled sample"),
        }
    }
}

/// Raw country records ready for normalization
#[derive(Debug, Clone)]
pub struct FetchedDataset {
    pub records: Vec<Value>,
    pub source: DataSource,
}

impl FetchedDataset {
    pub fn fallback() -> Self {
        Self {
            records: sample_countries(),
            source: DataSource::Fallback,
        }
    }
}

/// Build the blocking HTTP client used for every outbound request
pub fn build_http_client(settings: &FetchSettings) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.timeout)
        .build()
        .context("Failed to create HTTP client")
}

pub struct CountriesClient {
    client: Client,
    url: String,
}

impl CountriesClient {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(settings)?,
            url: settings.countries_url.clone(),
        })
    }

    /// Fetch the bulk dataset, substituting the bundled sample on any failure
    pub fn fetch_countries(&self) -> FetchedDataset {
        match self.fetch_remote() {
            Ok(records) => {
                info!(count = records.len(), url = %self.url, "Fetched country records");
                FetchedDataset {
                    records,
                    source: DataSource::Remote,
                }
            }
            Err(err) => {
                warn!(url = %self.url, error = %format!("{:#}", err), "Country API unavailable, using bundled sample");
                FetchedDataset::fallback()
            }
        }
    }

    fn fetch_remote(&self) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .context("Failed to fetch country data")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Country API returned {}", status);
        }

        let text = response.text().context("Failed to read response")?;
        parse_countries_body(&text)
    }
}

/// The bulk endpoint must return a non-empty JSON array of records
pub fn parse_countries_body(text: &str) -> Result<Vec<Value>> {
    let body: Value = serde_json::from_str(text).context("Failed to parse country data")?;
    match body {
        Value::Array(records) if !records.is_empty() => Ok(records),
        Value::Array(_) => bail!("Country API returned no records"),
        other => bail!(
            "Expected a JSON array of countries, got {}",
            match other {
                Value::Object(_) => "an object",
                _ => "a scalar",
            }
        ),
    }
}

/// Fetch according to `settings`; never fails
pub fn fetch_dataset(settings: &FetchSettings) -> FetchedDataset {
    if settings.offline {
        info!("Offline mode, using bundled sample");
        return FetchedDataset::fallback();
    }

    match CountriesClient::new(settings) {
        Ok(client) => client.fetch_countries(),
        Err(err) => {
            warn!(error = %format!("{:#}", err), "Could not build HTTP client, using bundled sample");
            FetchedDataset::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_countries_body() {
        let records = parse_countries_body(r#"[{"name": {"common": "Japan"}}, {"name": "Chad"}]"#).unwrap();
        assert_eq!(records.len(), 2);

        assert!(parse_countries_body("[]").is_err());
        assert!(parse_countries_body(r#"{"status": 404, "message": "Not Found"}"#).is_err());
        assert!(parse_countries_body("<html>").is_err());
    }

    #[test]
    fn test_offline_fetch_uses_sample() {
        let dataset = fetch_dataset(&FetchSettings::offline());
        assert_eq!(dataset.source, DataSource::Fallback);
        assert_eq!(dataset.records.len(), 13);
    }

    #[test]
    fn test_unreachable_endpoint_falls_back() {
        let settings = FetchSettings {
            // Reserved port on loopback; the connection is refused immediately
            countries_url: "http://127.0.0.1:9/v3.1/all".to_string(),
            timeout: Duration::from_secs(2),
            ..FetchSettings::default()
        };
        let dataset = fetch_dataset(&settings);
        assert_eq!(dataset.source, DataSource::Fallback);
        assert_eq!(dataset.records.len(), 13);
    }
}
