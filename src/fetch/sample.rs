use serde_json::Value;

/// Representative countries bundled for offline and fallback imports
const SAMPLE_JSON: &str = include_str!("sample_countries.json");

/// Raw records of the bundled sample dataset, in the same shape as the API
pub fn sample_countries() -> Vec<Value> {
    serde_json::from_str(SAMPLE_JSON).expect("bundled sample_countries.json is a JSON array")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_sample_has_thirteen_countries() {
        let records = sample_countries();
        assert_eq!(records.len(), 13);
        assert!(records.iter().all(|r| r["name"]["common"].is_string()));
    }

    #[test]
    fn test_sample_regions() {
        let regions: BTreeSet<_> = sample_countries()
            .iter()
            .filter_map(|r| r["region"].as_str().map(str::to_string))
            .collect();
        let expected: BTreeSet<_> = ["Americas", "Asia", "Europe", "Oceania"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(regions, expected);
    }
}
