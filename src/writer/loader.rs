use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashMap;

use super::schema_gen::generate_insert;
use crate::fetch::{gdp_per_capita, IndicatorLookup};
use crate::parser::{CountryRecord, DecodeError};
use crate::schema::{TableSchema, CONTINENT, COUNTRY, COUNTRY_LANGUAGE, LANGUAGE};

/// Inserts decoded countries, sharing continent and language rows by name.
///
/// The caches live for one import run and are filled in first-seen order.
/// Each country is written inside its own savepoint, so a failing record
/// leaves neither rows nor cache entries behind.
pub struct Loader {
    continents: HashMap<String, i64>,
    languages: HashMap<String, i64>,
    links: u64,
    country_sql: String,
    link_sql: String,
}

/// Reference rows created by the record currently being loaded
#[derive(Default)]
struct Staged {
    continents: Vec<(String, i64)>,
    languages: Vec<(String, i64)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            continents: HashMap::new(),
            languages: HashMap::new(),
            links: 0,
            country_sql: generate_insert(&COUNTRY),
            link_sql: generate_insert(&COUNTRY_LANGUAGE),
        }
    }

    /// Insert one country with its continent and language links, returning its id
    pub fn load(
        &mut self,
        tx: &mut Transaction,
        record: &CountryRecord,
        gdp: Option<f64>,
    ) -> Result<i64> {
        let per_capita = gdp_per_capita(gdp, record.population);

        let sp = tx.savepoint().context("Failed to open savepoint")?;
        let mut staged = Staged::default();

        let continent_id = match &record.region {
            Some(name) => Some(resolve_reference(
                &sp,
                &CONTINENT,
                &self.continents,
                &mut staged.continents,
                name,
            )?),
            None => None,
        };

        sp.prepare_cached(&self.country_sql)?
            .execute(params![
                record.name,
                record.official_name,
                record.capital,
                record.region,
                record.subregion,
                record.iso_code_alpha2,
                record.iso_code_alpha3,
                record.iso_code_numeric,
                record.population,
                record.area,
                record.population_density,
                gdp,
                per_capita,
                record.gini_coefficient,
                record.latitude,
                record.longitude,
                record.landlocked,
                record.flag_url,
                record.coat_of_arms_url,
                serde_json::to_string(&record.currencies)?,
                serde_json::to_string(&record.timezones)?,
                serde_json::to_string(&record.calling_codes)?,
                serde_json::to_string(&record.top_level_domains)?,
                serde_json::to_string(&record.borders)?,
                continent_id,
            ])
            .with_context(|| format!("Failed to insert country {}", record.name))?;
        // Row id is assigned now, before the run commits
        let country_id = sp.last_insert_rowid();

        let mut links = 0;
        for language in &record.languages {
            let language_id = resolve_reference(
                &sp,
                &LANGUAGE,
                &self.languages,
                &mut staged.languages,
                language,
            )?;
            sp.prepare_cached(&self.link_sql)?
                .execute(params![country_id, language_id, true])
                .with_context(|| format!("Failed to link {} to {}", record.name, language))?;
            links += 1;
        }

        sp.commit().context("Failed to release savepoint")?;

        self.continents.extend(staged.continents);
        self.languages.extend(staged.languages);
        self.links += links;

        Ok(country_id)
    }

    pub fn continent_count(&self) -> usize {
        self.continents.len()
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }

    pub fn link_count(&self) -> u64 {
        self.links
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// GDP for the first `budget` decoded records, `None` for everything else.
/// Called before the import transaction opens.
pub fn lookup_gdp(
    decoded: &[Result<CountryRecord, DecodeError>],
    indicators: &dyn IndicatorLookup,
    budget: usize,
) -> Vec<Option<f64>> {
    let mut remaining = budget;
    decoded
        .iter()
        .map(|entry| {
            let record = entry.as_ref().ok()?;
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            record
                .iso_code_alpha3
                .as_deref()
                .or(record.iso_code_alpha2.as_deref())
                .and_then(|iso| indicators.gdp(iso))
                .map(|gdp| gdp.value)
        })
        .collect()
}

/// Id of a named reference row, inserting it on first sight
fn resolve_reference(
    conn: &Connection,
    table: &TableSchema,
    cache: &HashMap<String, i64>,
    staged: &mut Vec<(String, i64)>,
    name: &str,
) -> Result<i64> {
    if let Some(id) = cache.get(name) {
        return Ok(*id);
    }
    if let Some((_, id)) = staged.iter().find(|(staged_name, _)| staged_name == name) {
        return Ok(*id);
    }

    conn.prepare_cached(&format!("INSERT INTO {} (name) VALUES (?1)", table.name))?
        .execute([name])
        .with_context(|| format!("Failed to insert {} {}", table.name, name))?;
    let id = conn.last_insert_rowid();
    staged.push((name.to_string(), id));

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Gdp;
    use crate::parser::decode_country;
    use crate::writer::create_tables;
    use serde_json::json;
    use std::cell::RefCell;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn record(name: &str, region: &str, languages: &[&str]) -> CountryRecord {
        let langs: serde_json::Map<String, serde_json::Value> = languages
            .iter()
            .enumerate()
            .map(|(i, l)| (format!("l{}", i), json!(l)))
            .collect();
        decode_country(&json!({
            "name": {"common": name},
            "region": region,
            "cca3": name.to_uppercase().chars().take(3).collect::<String>(),
            "population": 1000,
            "area": 10.0,
            "languages": langs
        }))
        .unwrap()
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    struct FixedGdp {
        calls: RefCell<Vec<String>>,
    }

    impl IndicatorLookup for FixedGdp {
        fn gdp(&self, iso_code: &str) -> Option<Gdp> {
            self.calls.borrow_mut().push(iso_code.to_string());
            Some(Gdp {
                value: 5000.0,
                year: Some(2023),
            })
        }
    }

    #[test]
    fn test_shared_references_are_inserted_once() {
        let mut conn = memory_db();
        let mut tx = conn.transaction().unwrap();
        let mut loader = Loader::new();

        loader.load(&mut tx, &record("Ireland", "Europe", &["English", "Irish"]), None).unwrap();
        loader.load(&mut tx, &record("Malta", "Europe", &["English", "Maltese"]), None).unwrap();
        loader.load(&mut tx, &record("Fiji", "Oceania", &["English"]), None).unwrap();
        tx.commit().unwrap();

        assert_eq!(count(&conn, "country"), 3);
        assert_eq!(count(&conn, "continent"), 2);
        assert_eq!(count(&conn, "language"), 3);
        assert_eq!(count(&conn, "country_language"), 5);
        assert_eq!(loader.continent_count(), 2);
        assert_eq!(loader.language_count(), 3);
        assert_eq!(loader.link_count(), 5);
    }

    #[test]
    fn test_repeated_language_creates_duplicate_links() {
        let mut conn = memory_db();
        let mut tx = conn.transaction().unwrap();
        let mut loader = Loader::new();

        loader.load(&mut tx, &record("Twinland", "Europe", &["Twin", "Twin"]), None).unwrap();
        tx.commit().unwrap();

        assert_eq!(count(&conn, "language"), 1);
        assert_eq!(count(&conn, "country_language"), 2);
    }

    #[test]
    fn test_failed_record_leaves_no_rows_or_cache_entries() {
        let mut conn = memory_db();
        conn.execute_batch(
            "CREATE TRIGGER reject_klingon BEFORE INSERT ON country_language
             WHEN (SELECT name FROM language WHERE id = NEW.language_id) = 'Klingon'
             BEGIN SELECT RAISE(ABORT, 'Klingon is not allowed'); END;",
        )
        .unwrap();

        let mut tx = conn.transaction().unwrap();
        let mut loader = Loader::new();

        let result = loader.load(&mut tx, &record("Qonos", "Beta Quadrant", &["Klingon"]), None);
        assert!(result.is_err());
        assert_eq!(loader.continent_count(), 0);
        assert_eq!(loader.language_count(), 0);

        // The continent is created again, this time for good
        loader.load(&mut tx, &record("Vulcan", "Beta Quadrant", &["Vulcan"]), None).unwrap();
        tx.commit().unwrap();

        assert_eq!(count(&conn, "country"), 1);
        assert_eq!(count(&conn, "continent"), 1);
        assert_eq!(count(&conn, "language"), 1);

        let continent_id: i64 = conn
            .query_row("SELECT continent_id FROM country WHERE name = 'Vulcan'", [], |r| r.get(0))
            .unwrap();
        let continent_name: String = conn
            .query_row("SELECT name FROM continent WHERE id = ?1", [continent_id], |r| r.get(0))
            .unwrap();
        assert_eq!(continent_name, "Beta Quadrant");
    }

    #[test]
    fn test_indicator_lookups_are_bounded() {
        let indicators = FixedGdp {
            calls: RefCell::new(Vec::new()),
        };
        let decoded = vec![
            Ok(record("Aland", "Europe", &[])),
            decode_country(&json!({"region": "Europe"})),
            Ok(record("Bland", "Europe", &[])),
            Ok(record("Cland", "Europe", &[])),
        ];

        let gdp = lookup_gdp(&decoded, &indicators, 2);

        assert_eq!(gdp, vec![Some(5000.0), None, Some(5000.0), None]);
        assert_eq!(*indicators.calls.borrow(), vec!["ALA", "BLA"]);
    }

    #[test]
    fn test_gdp_per_capita_is_stored() {
        let mut conn = memory_db();
        let mut tx = conn.transaction().unwrap();
        let mut loader = Loader::new();

        loader.load(&mut tx, &record("Aland", "Europe", &[]), Some(5000.0)).unwrap();
        loader.load(&mut tx, &record("Bland", "Europe", &[]), None).unwrap();
        tx.commit().unwrap();

        let with_gdp: i64 = conn
            .query_row("SELECT COUNT(*) FROM country WHERE gdp IS NOT NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(with_gdp, 1);

        let per_capita: f64 = conn
            .query_row("SELECT gdp_per_capita FROM country WHERE name = 'Aland'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(per_capita, 5.0);
    }
}
