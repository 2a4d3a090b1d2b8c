//! Table schema definitions for the country dataset

use super::types::*;

// =============================================================================
// Reference Tables (no FK dependencies)
// =============================================================================

pub static CONTINENT: TableSchema = TableSchema {
    name: "continent",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text).unique(),
        // Denormalized aggregates, not recomputed by the import
        Column::new("population", ColumnType::Integer),
        Column::new("area", ColumnType::Real),
    ],
    foreign_keys: &[],
};

pub static LANGUAGE: TableSchema = TableSchema {
    name: "language",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text).unique(),
    ],
    foreign_keys: &[],
};

// =============================================================================
// Countries
// =============================================================================

pub static COUNTRY: TableSchema = TableSchema {
    name: "country",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("official_name", ColumnType::Text),
        Column::new("capital", ColumnType::Text),
        Column::new("region", ColumnType::Text),
        Column::new("subregion", ColumnType::Text),
        Column::new("iso_code_alpha2", ColumnType::Text),
        Column::new("iso_code_alpha3", ColumnType::Text),
        Column::new("iso_code_numeric", ColumnType::Text),
        Column::new("population", ColumnType::Integer),
        Column::new("area", ColumnType::Real),
        Column::new("population_density", ColumnType::Real),
        Column::new("gdp", ColumnType::Real),
        Column::new("gdp_per_capita", ColumnType::Real),
        Column::new("gini_coefficient", ColumnType::Real),
        Column::new("latitude", ColumnType::Real),
        Column::new("longitude", ColumnType::Real),
        Column::required("landlocked", ColumnType::Boolean),
        Column::new("flag_url", ColumnType::Text),
        Column::new("coat_of_arms_url", ColumnType::Text),
        Column::new("currencies", ColumnType::Json),
        Column::new("timezones", ColumnType::Json),
        Column::new("calling_codes", ColumnType::Json),
        Column::new("top_level_domains", ColumnType::Json),
        Column::new("borders", ColumnType::Json),
        Column::new("continent_id", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::new("continent_id", "continent")],
};

// =============================================================================
// Junction Tables
// =============================================================================

/// No uniqueness on (country_id, language_id): repeated source entries
/// produce repeated links.
pub static COUNTRY_LANGUAGE: TableSchema = TableSchema {
    name: "country_language",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("country_id", ColumnType::Integer),
        Column::required("language_id", ColumnType::Integer),
        Column::required("is_official", ColumnType::Boolean),
    ],
    foreign_keys: &[
        ForeignKey::new("country_id", "country"),
        ForeignKey::new("language_id", "language"),
    ],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[&CONTINENT, &LANGUAGE, &COUNTRY, &COUNTRY_LANGUAGE];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
