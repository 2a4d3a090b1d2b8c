use serde::Serialize;
use serde_json::Value;

use super::error::{DecodeError, FieldError};
use super::fields::{self, FieldResult};

/// A country decoded from one raw API record, ready for insertion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRecord {
    pub name: String,
    pub official_name: Option<String>,
    pub capital: Option<String>,
    /// Also the continent name
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub iso_code_alpha2: Option<String>,
    pub iso_code_alpha3: Option<String>,
    pub iso_code_numeric: Option<String>,
    pub population: Option<i64>,
    pub area: Option<f64>,
    pub population_density: Option<f64>,
    pub gini_coefficient: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub landlocked: bool,
    pub flag_url: Option<String>,
    pub coat_of_arms_url: Option<String>,
    pub currencies: Value,
    pub timezones: Vec<String>,
    pub calling_codes: Vec<String>,
    pub top_level_domains: Vec<String>,
    pub borders: Vec<String>,
    pub languages: Vec<String>,
}

/// Collects field failures so one pass reports every bad field
#[derive(Default)]
struct Failures(Vec<FieldError>);

impl Failures {
    fn take<T: Default>(&mut self, field: &'static str, result: FieldResult<T>) -> T {
        match result {
            Ok(value) => value,
            Err(reason) => {
                self.0.push(FieldError::new(field, reason));
                T::default()
            }
        }
    }
}

/// Decode one raw country record into a fully-valid [`CountryRecord`].
///
/// A record without a usable name fails with [`DecodeError::MissingName`];
/// otherwise every malformed field is reported together in
/// [`DecodeError::InvalidFields`]. Absent or null fields are not failures.
pub fn decode_country(raw: &Value) -> Result<CountryRecord, DecodeError> {
    let name = fields::extract_name(raw.get("name")).ok_or(DecodeError::MissingName)?;
    let mut failures = Failures::default();

    let population = failures.take("population", fields::coerce_count(raw.get("population")));
    let area = failures.take("area", fields::coerce_measure(raw.get("area")));
    let (latitude, longitude) = failures.take("latlng", fields::coordinates(raw.get("latlng")));

    let record = CountryRecord {
        official_name: name.official,
        capital: failures.take("capital", fields::first_text(raw.get("capital"))),
        region: failures.take("region", fields::optional_text(raw.get("region"))),
        subregion: failures.take("subregion", fields::optional_text(raw.get("subregion"))),
        iso_code_alpha2: failures.take("cca2", fields::optional_text(raw.get("cca2"))),
        iso_code_alpha3: failures.take("cca3", fields::optional_text(raw.get("cca3"))),
        iso_code_numeric: failures.take("ccn3", fields::optional_text(raw.get("ccn3"))),
        population,
        area,
        population_density: fields::population_density(population, area),
        gini_coefficient: failures.take("gini", fields::latest_year_value(raw.get("gini"))),
        latitude,
        longitude,
        landlocked: failures.take("landlocked", fields::flag(raw.get("landlocked"))),
        flag_url: failures.take("flags", fields::pick_image_url(raw.get("flags"))),
        coat_of_arms_url: failures.take(
            "coatOfArms",
            fields::pick_image_url(raw.get("coatOfArms")),
        ),
        currencies: failures.take("currencies", fields::object_or_empty(raw.get("currencies"))),
        timezones: failures.take("timezones", fields::string_list(raw.get("timezones"))),
        calling_codes: failures.take("idd", fields::calling_codes(raw.get("idd"))),
        top_level_domains: failures.take("tld", fields::string_list(raw.get("tld"))),
        borders: failures.take("borders", fields::string_list(raw.get("borders"))),
        languages: failures.take("languages", fields::language_names(raw.get("languages"))),
        name: name.common,
    };

    if failures.0.is_empty() {
        Ok(record)
    } else {
        Err(DecodeError::InvalidFields {
            name: record.name,
            failures: failures.0,
        })
    }
}

/// Best identifier for a raw record in log messages
pub fn record_label(raw: &Value) -> String {
    if let Some(name) = fields::extract_name(raw.get("name")) {
        return name.common;
    }
    ["cca3", "cca2"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| "<unnamed>".to_string())
}
