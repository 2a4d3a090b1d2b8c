//! Economic indicator lookups (World Bank GDP).
//!
//! Lookups are best-effort: any failure yields `None` and the country is
//! stored without GDP figures.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use super::client::build_http_client;
use crate::config::FetchSettings;

/// Only the first countries processed in a run are looked up
pub const INDICATOR_LOOKUP_LIMIT: usize = 50;

const GDP_INDICATOR: &str = "NY.GDP.MKTP.CD";

/// GDP in current US dollars for the most recent reported year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gdp {
    pub value: f64,
    pub year: Option<i32>,
}

pub trait IndicatorLookup {
    /// GDP for an ISO 3166 alpha-3 (or alpha-2) code
    fn gdp(&self, iso_code: &str) -> Option<Gdp>;
}

/// Lookup used when indicators are disabled or the dataset is the sample
pub struct NoIndicators;

impl IndicatorLookup for NoIndicators {
    fn gdp(&self, _iso_code: &str) -> Option<Gdp> {
        None
    }
}

pub struct WorldBankClient {
    client: Client,
    base_url: String,
}

impl WorldBankClient {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(settings)?,
            base_url: settings.indicator_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch_gdp(&self, iso_code: &str) -> Result<Option<Gdp>> {
        let url = format!(
            "{}/country/{}/indicator/{}?format=json&mrnev=1",
            self.base_url, iso_code, GDP_INDICATOR
        );
        let response = self
            .client
            .get(&url)
            .send()
            .context("Failed to fetch indicator")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Indicator API returned {}", status);
        }

        let text = response.text().context("Failed to read response")?;
        parse_indicator_body(&text)
    }
}

impl IndicatorLookup for WorldBankClient {
    fn gdp(&self, iso_code: &str) -> Option<Gdp> {
        match self.fetch_gdp(iso_code) {
            Ok(gdp) => gdp,
            Err(err) => {
                debug!(iso_code, error = %format!("{:#}", err), "GDP lookup failed");
                None
            }
        }
    }
}

/// Parse `[paging, [entry, ...]]`, taking the first entry with a value.
/// Error bodies (`[{"message": [...]}]`) carry no entries and yield `None`.
pub fn parse_indicator_body(text: &str) -> Result<Option<Gdp>> {
    let body: Value = serde_json::from_str(text).context("Failed to parse indicator data")?;

    let Some(entries) = body.get(1).and_then(Value::as_array) else {
        return Ok(None);
    };

    Ok(entries.iter().find_map(|entry| {
        let value = entry.get("value")?.as_f64()?;
        let year = entry
            .get("date")
            .and_then(Value::as_str)
            .and_then(|date| date.parse().ok());
        Some(Gdp { value, year })
    }))
}

/// GDP divided by population, when both are usable
pub fn gdp_per_capita(gdp: Option<f64>, population: Option<i64>) -> Option<f64> {
    match (gdp, population) {
        (Some(gdp), Some(population)) if population > 0 => Some(gdp / population as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indicator_body() {
        let body = r#"[
            {"page": 1, "pages": 1, "per_page": 1, "total": 1},
            [{"indicator": {"id": "NY.GDP.MKTP.CD"}, "countryiso3code": "JPN", "date": "2023", "value": 4212945000000.0}]
        ]"#;
        assert_eq!(
            parse_indicator_body(body).unwrap(),
            Some(Gdp {
                value: 4212945000000.0,
                year: Some(2023)
            })
        );
    }

    #[test]
    fn test_parse_indicator_body_without_values() {
        let nulls = r#"[{"page": 1}, [{"date": "2023", "value": null}]]"#;
        assert_eq!(parse_indicator_body(nulls).unwrap(), None);

        let error = r#"[{"message": [{"id": "120", "key": "Invalid value"}]}]"#;
        assert_eq!(parse_indicator_body(error).unwrap(), None);

        assert!(parse_indicator_body("not json").is_err());
    }

    #[test]
    fn test_gdp_per_capita() {
        assert_eq!(gdp_per_capita(Some(1000.0), Some(10)), Some(100.0));
        assert_eq!(gdp_per_capita(Some(1000.0), Some(0)), None);
        assert_eq!(gdp_per_capita(None, Some(10)), None);
    }
}
