//! Read-side queries backing the landing page and the chart pages.
//!
//! Every function takes a plain connection and returns owned rows; callers
//! run them on a blocking thread.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

pub const TOP_DENSITY_LIMIT: usize = 30;
pub const TOP_LANGUAGE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub countries: i64,
    pub continents: i64,
    pub languages: i64,
}

impl DatasetCounts {
    pub fn is_empty(&self) -> bool {
        self.countries == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationArea {
    pub name: String,
    pub population: i64,
    pub area: f64,
    pub region: String,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityRow {
    pub name: String,
    pub density: f64,
    pub population: i64,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub region: String,
    pub country_count: i64,
    pub total_population: f64,
    pub avg_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub name: String,
    pub iso_alpha3: String,
    pub population: f64,
    pub area: f64,
    pub density: f64,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinentStats {
    pub name: String,
    pub country_count: i64,
    pub total_population: f64,
    pub total_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageStats {
    pub name: String,
    pub country_count: i64,
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .with_context(|| format!("Failed to count {}", table))
}

pub fn dataset_counts(conn: &Connection) -> Result<DatasetCounts> {
    Ok(DatasetCounts {
        countries: count_rows(conn, "country")?,
        continents: count_rows(conn, "continent")?,
        languages: count_rows(conn, "language")?,
    })
}

/// Countries with a positive population and area
pub fn population_area(conn: &Connection) -> Result<Vec<PopulationArea>> {
    let mut stmt = conn.prepare(
        "SELECT name, population, area, COALESCE(region, 'Unknown'),
                COALESCE(population_density, population * 1.0 / area)
         FROM country
         WHERE population > 0 AND area > 0
         ORDER BY name",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PopulationArea {
                name: row.get(0)?,
                population: row.get(1)?,
                area: row.get(2)?,
                region: row.get(3)?,
                density: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query population and area")?;

    Ok(rows)
}

/// Densest countries first
pub fn top_density(conn: &Connection, limit: usize) -> Result<Vec<DensityRow>> {
    let mut stmt = conn.prepare(
        "SELECT name, COALESCE(population_density, population * 1.0 / area) AS density,
                population, area
         FROM country
         WHERE population > 0 AND area > 0
         ORDER BY density DESC, name
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(DensityRow {
                name: row.get(0)?,
                density: row.get(1)?,
                population: row.get(2)?,
                area: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query population density")?;

    Ok(rows)
}

pub fn region_stats(conn: &Connection) -> Result<Vec<RegionStats>> {
    let mut stmt = conn.prepare(
        "SELECT region, COUNT(id), COALESCE(SUM(population), 0), COALESCE(AVG(area), 0)
         FROM country
         WHERE region IS NOT NULL
         GROUP BY region
         ORDER BY region",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RegionStats {
                region: row.get(0)?,
                country_count: row.get(1)?,
                total_population: row.get(2)?,
                avg_area: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query region statistics")?;

    Ok(rows)
}

/// Countries that can be placed on the world map
pub fn map_points(conn: &Connection) -> Result<Vec<MapPoint>> {
    let mut stmt = conn.prepare(
        "SELECT name, iso_code_alpha3, COALESCE(population, 0), COALESCE(area, 0),
                COALESCE(population_density, 0), COALESCE(region, 'Unknown'),
                latitude, longitude
         FROM country
         WHERE latitude IS NOT NULL AND longitude IS NOT NULL
           AND iso_code_alpha3 IS NOT NULL AND iso_code_alpha3 != ''
         ORDER BY name",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MapPoint {
                name: row.get(0)?,
                iso_alpha3: row.get(1)?,
                population: row.get(2)?,
                area: row.get(3)?,
                density: row.get(4)?,
                region: row.get(5)?,
                latitude: row.get(6)?,
                longitude: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query map data")?;

    Ok(rows)
}

/// Every continent, including those without countries
pub fn continent_stats(conn: &Connection) -> Result<Vec<ContinentStats>> {
    let mut stmt = conn.prepare(
        "SELECT ct.name, COUNT(c.id), COALESCE(SUM(c.population), 0), COALESCE(SUM(c.area), 0)
         FROM continent ct
         LEFT JOIN country c ON c.continent_id = ct.id
         GROUP BY ct.name
         ORDER BY ct.name",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ContinentStats {
                name: row.get(0)?,
                country_count: row.get(1)?,
                total_population: row.get(2)?,
                total_area: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query continent statistics")?;

    Ok(rows)
}

/// Languages spoken in the most countries
pub fn language_stats(conn: &Connection, limit: usize) -> Result<Vec<LanguageStats>> {
    let mut stmt = conn.prepare(
        "SELECT l.name, COUNT(cl.country_id) AS countries
         FROM language l
         JOIN country_language cl ON cl.language_id = l.id
         GROUP BY l.name
         ORDER BY countries DESC, l.name
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(LanguageStats {
                name: row.get(0)?,
                country_count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query language statistics")?;

    Ok(rows)
}
