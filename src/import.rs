//! The import pipeline: fetch, normalize, load.

use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::config::FetchSettings;
use crate::fetch::{
    fetch_dataset, DataSource, FetchedDataset, IndicatorLookup, NoIndicators, WorldBankClient,
};
use crate::ui::{Phase, Ui};
use crate::writer::{ImportSummary, SqliteWriter};

/// Fetch the country dataset and replace the contents of `db_path` with it
pub fn run_import(
    settings: &FetchSettings,
    db_path: &Path,
    ui: &mut impl Ui,
) -> Result<ImportSummary> {
    ui.set_phase(Phase::Fetching);
    ui.set_info(if settings.offline {
        "Using bundled sample".to_string()
    } else {
        format!("Requesting {}", settings.countries_url)
    });

    let dataset = fetch_dataset(settings);
    ui.log(format!(
        "Fetched {} records from the {}",
        dataset.records.len(),
        dataset.source
    ));

    import_dataset(settings, &dataset, db_path, ui)
}

/// Load an already fetched dataset
pub fn import_dataset(
    settings: &FetchSettings,
    dataset: &FetchedDataset,
    db_path: &Path,
    ui: &mut impl Ui,
) -> Result<ImportSummary> {
    let indicators = indicator_lookup(settings, dataset.source);
    let mut writer = SqliteWriter::open(db_path)?;
    let summary = writer.import(dataset, indicators.as_ref(), ui)?;

    ui.set_phase(Phase::Complete);
    ui.set_info(summary.to_string());

    Ok(summary)
}

/// GDP lookups only make sense for live data
fn indicator_lookup(settings: &FetchSettings, source: DataSource) -> Box<dyn IndicatorLookup> {
    if !settings.indicators || settings.offline || source == DataSource::Fallback {
        return Box::new(NoIndicators);
    }

    match WorldBankClient::new(settings) {
        Ok(client) => Box::new(client),
        Err(err) => {
            warn!(error = %format!("{:#}", err), "Indicator lookups disabled");
            Box::new(NoIndicators)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SilentUi;
    use tempfile::TempDir;

    #[test]
    fn test_offline_import_loads_sample() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("wiki.db");

        let summary =
            run_import(&FetchSettings::offline(), &db_path, &mut SilentUi::new()).unwrap();

        assert_eq!(summary.source, DataSource::Fallback);
        assert_eq!(summary.processed, 13);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.continents, 4);
        assert!(db_path.exists());
    }
}
