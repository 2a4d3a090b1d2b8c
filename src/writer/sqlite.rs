use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Transaction};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::loader::{lookup_gdp, Loader};
use super::schema_gen::{generate_create_table, generate_indexes};
use crate::fetch::{DataSource, FetchedDataset, IndicatorLookup, INDICATOR_LOOKUP_LIMIT};
use crate::parser::{decode_country, record_label, CountryRecord, DecodeError};
use crate::schema::{table_names, DependencyResolver};
use crate::ui::{Phase, Ui};

/// Counts reported at the end of an import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub source: DataSource,
    pub processed: u64,
    pub skipped: u64,
    pub continents: usize,
    pub languages: usize,
    pub links: u64,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} countries from the {} ({} skipped): {} continents, {} languages, {} language links",
            self.processed, self.source, self.skipped, self.continents, self.languages, self.links
        )
    }
}

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Open (or create) the database and make sure every table exists
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_database(db_path)?,
        })
    }

    /// Delete the database file and start from an empty schema
    pub fn reset(db_path: &Path) -> Result<Self> {
        if db_path.exists() {
            fs::remove_file(db_path).context("Failed to remove existing database")?;
        }
        Self::open(db_path)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace the stored dataset, see [`import_records`]
    pub fn import(
        &mut self,
        dataset: &FetchedDataset,
        indicators: &dyn IndicatorLookup,
        ui: &mut impl Ui,
    ) -> Result<ImportSummary> {
        import_records(&mut self.conn, dataset, indicators, ui)
    }
}

/// Replace the stored dataset with `dataset` in a single transaction.
///
/// Existing rows are cleared inside the same transaction, so a failed
/// run leaves the previous data in place. Records are decoded and their
/// GDP looked up before the transaction opens.
pub fn import_records(
    conn: &mut Connection,
    dataset: &FetchedDataset,
    indicators: &dyn IndicatorLookup,
    ui: &mut impl Ui,
) -> Result<ImportSummary> {
    let decoded: Vec<_> = dataset.records.iter().map(decode_country).collect();
    let gdp = lookup_gdp(&decoded, indicators, INDICATOR_LOOKUP_LIMIT);
    let found = gdp.iter().filter(|value| value.is_some()).count();
    if found > 0 {
        ui.log(format!("Found GDP figures for {} countries", found));
    }

    let mut tx = conn
        .transaction()
        .context("Failed to start import transaction")?;

    match load_dataset(&mut tx, dataset, &decoded, &gdp, ui) {
        Ok(summary) => {
            ui.set_phase(Phase::Committing);
            tx.commit().context("Failed to commit import")?;
            info!(
                processed = summary.processed,
                skipped = summary.skipped,
                source = %summary.source,
                "Import committed"
            );
            Ok(summary)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Open a connection with the pragmas and tables every caller expects
pub fn open_database(db_path: &Path) -> Result<Connection> {
    let conn = connect(db_path)?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Open for reading; the schema is only created when it is missing
pub fn open_reader(db_path: &Path) -> Result<Connection> {
    let conn = connect(db_path)?;
    if !schema_exists(&conn)? {
        create_tables(&conn)?;
    }
    Ok(conn)
}

fn connect(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    // Readers keep working while an import transaction is open
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    conn.busy_timeout(Duration::from_secs(5))?;

    Ok(conn)
}

/// Whether every registered table is present
pub fn schema_exists(conn: &Connection) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    for name in table_names() {
        let count: i64 = stmt.query_row([name], |row| row.get(0))?;
        if count == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Create every table and index that does not exist yet
pub fn create_tables(conn: &Connection) -> Result<()> {
    let tables = DependencyResolver::new()
        .creation_order()
        .map_err(|e| anyhow!(e))?;

    for schema in tables {
        conn.execute(&generate_create_table(schema), [])
            .with_context(|| format!("Failed to create table: {}", schema.name))?;

        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])
                .with_context(|| format!("Failed to create index for: {}", schema.name))?;
        }
    }

    Ok(())
}

/// Delete every row, link tables first. Returns the number of rows removed.
pub fn clear_existing(conn: &Connection) -> Result<usize> {
    let tables = DependencyResolver::new()
        .deletion_order()
        .map_err(|e| anyhow!(e))?;

    let mut removed = 0;
    for schema in tables {
        removed += conn
            .execute(&format!("DELETE FROM {}", schema.name), [])
            .with_context(|| format!("Failed to clear table: {}", schema.name))?;
    }

    Ok(removed)
}

fn load_dataset(
    tx: &mut Transaction,
    dataset: &FetchedDataset,
    decoded: &[Result<CountryRecord, DecodeError>],
    gdp: &[Option<f64>],
    ui: &mut impl Ui,
) -> Result<ImportSummary> {
    ui.set_phase(Phase::Clearing);
    let cleared = clear_existing(tx)?;
    ui.log(format!("Cleared {} existing rows", cleared));

    ui.set_phase(Phase::Importing);
    ui.set_info(format!(
        "{} records from the {}",
        dataset.records.len(),
        dataset.source
    ));

    let mut loader = Loader::new();
    let total = dataset.records.len() as u64;
    let mut processed = 0;
    let mut skipped = 0;

    for (i, (raw, entry)) in dataset.records.iter().zip(decoded).enumerate() {
        match entry {
            Ok(record) => match loader.load(tx, record, gdp[i]) {
                Ok(_) => {
                    processed += 1;
                    ui.log(format!("Processed: {}", record.name));
                }
                Err(err) => {
                    skipped += 1;
                    warn!(record = %record.name, error = %format!("{:#}", err), "Skipped record");
                    ui.log(format!("Skipped {}: {:#}", record.name, err));
                }
            },
            Err(err) => {
                skipped += 1;
                let label = record_label(raw);
                warn!(record = %label, error = %err, "Skipped record");
                ui.log(format!("Skipped {}: {}", label, err));
            }
        }
        ui.set_progress(i as u64 + 1, total, "Countries");
    }

    ui.clear_progress();

    Ok(ImportSummary {
        source: dataset.source,
        processed,
        skipped,
        continents: loader.continent_count(),
        languages: loader.language_count(),
        links: loader.link_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::NoIndicators;
    use crate::ui::SilentUi;
    use serde_json::json;

    fn memory_writer() -> SqliteWriter {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        create_tables(&conn).unwrap();
        SqliteWriter { conn }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    fn dataset(records: Vec<serde_json::Value>) -> FetchedDataset {
        FetchedDataset {
            records,
            source: DataSource::Remote,
        }
    }

    #[test]
    fn test_import_counts_processed_and_skipped() {
        let mut writer = memory_writer();
        let data = dataset(vec![
            json!({"name": {"common": "Chad"}, "region": "Africa", "languages": {"fra": "French"}}),
            json!({"cca3": "XXX", "region": "Africa"}),
            json!({"name": "Bad", "population": "many"}),
        ]);

        let summary = writer.import(&data, &NoIndicators, &mut SilentUi::new()).unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.continents, 1);
        assert_eq!(summary.languages, 1);
        assert_eq!(summary.links, 1);
        assert_eq!(count(writer.connection(), "country"), 1);
    }

    #[test]
    fn test_import_replaces_previous_rows() {
        let mut writer = memory_writer();
        let first = dataset(vec![json!({"name": "Old", "region": "Asia"})]);
        let second = dataset(vec![json!({"name": "New", "region": "Europe"})]);

        writer.import(&first, &NoIndicators, &mut SilentUi::new()).unwrap();
        writer.import(&second, &NoIndicators, &mut SilentUi::new()).unwrap();

        let names: Vec<String> = writer
            .connection()
            .prepare("SELECT name FROM continent")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["Europe".to_string()]);
        assert_eq!(count(writer.connection(), "country"), 1);
    }

    #[test]
    fn test_schema_exists() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!schema_exists(&conn).unwrap());
        create_tables(&conn).unwrap();
        assert!(schema_exists(&conn).unwrap());
    }

    #[test]
    fn test_clear_existing_handles_empty_tables() {
        let writer = memory_writer();
        assert_eq!(clear_existing(writer.connection()).unwrap(), 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = ImportSummary {
            source: DataSource::Fallback,
            processed: 13,
            skipped: 0,
            continents: 4,
            languages: 10,
            links: 17,
        };
        assert_eq!(
            summary.to_string(),
            "Imported 13 countries from the bundled sample (0 skipped): 4 continents, 10 languages, 17 language links"
        );
    }
}
