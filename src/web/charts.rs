//! Plotly figures built from query rows.
//!
//! A figure is plain JSON (`data` traces plus `layout`) handed to
//! `Plotly.newPlot` in the browser.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::queries::{
    ContinentStats, DensityRow, LanguageStats, MapPoint, PopulationArea, RegionStats,
};

const BACKGROUND: &str = "#111";
const GRID: &str = "#333";

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    fn new(data: Vec<Value>, layout: Value) -> Self {
        Self {
            data,
            layout: merge(dark_layout(), layout),
        }
    }
}

fn dark_layout() -> Value {
    json!({
        "font": {"color": "white"},
        "plot_bgcolor": BACKGROUND,
        "paper_bgcolor": BACKGROUND,
        "xaxis": {"gridcolor": GRID, "zerolinecolor": GRID},
        "yaxis": {"gridcolor": GRID, "zerolinecolor": GRID},
    })
}

/// Recursively overlay `overlay` onto `base`
fn merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => merge(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

fn plot_config() -> Value {
    json!({
        "displayModeBar": true,
        "displaylogo": false,
        "modeBarButtonsToRemove": ["lasso2d", "select2d"],
        "responsive": true,
    })
}

/// `Plotly.newPlot` call for the element `div_id`.
///
/// `<` is written as `\u003c` so no data value can close the script tag.
pub fn figure_script(div_id: &str, figure: &Figure) -> String {
    let encode = |value: &Value| value.to_string().replace('<', "\\u003c");
    let data = Value::Array(figure.data.clone());

    format!(
        "Plotly.newPlot({}, {}, {}, {});",
        encode(&Value::String(div_id.to_string())),
        encode(&data),
        encode(&figure.layout),
        encode(&plot_config()),
    )
}

/// Log-log scatter of area against population, one trace per region
pub fn population_area(rows: &[PopulationArea]) -> Figure {
    let max_population = rows.iter().map(|r| r.population).max().unwrap_or(1).max(1) as f64;

    let mut by_region: BTreeMap<&str, Vec<&PopulationArea>> = BTreeMap::new();
    for row in rows {
        by_region.entry(row.region.as_str()).or_default().push(row);
    }

    let data = by_region
        .into_iter()
        .map(|(region, rows)| {
            json!({
                "type": "scatter",
                "mode": "markers",
                "name": region,
                "x": rows.iter().map(|r| r.area).collect::<Vec<_>>(),
                "y": rows.iter().map(|r| r.population).collect::<Vec<_>>(),
                "text": rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
                "customdata": rows.iter().map(|r| r.density).collect::<Vec<_>>(),
                "hovertemplate": "<b>%{text}</b><br>Area: %{x:,.0f} km²<br>Population: %{y:,}<br>Density: %{customdata:,.1f}/km²<extra></extra>",
                "marker": {
                    "size": rows
                        .iter()
                        .map(|r| 6.0 + 44.0 * (r.population as f64 / max_population).sqrt())
                        .collect::<Vec<_>>(),
                    "opacity": 0.8,
                },
            })
        })
        .collect();

    Figure::new(
        data,
        json!({
            "title": {"text": "Countries by Area vs Population (Log Scale)"},
            "height": 700,
            "xaxis": {"type": "log", "title": {"text": "Area (km²)"}},
            "yaxis": {"type": "log", "title": {"text": "Population"}},
            "legend": {"title": {"text": "Region"}},
        }),
    )
}

/// Horizontal bars, densest country on top
pub fn population_density(rows: &[DensityRow]) -> Figure {
    let densities: Vec<f64> = rows.iter().map(|r| r.density).collect();

    let data = vec![json!({
        "type": "bar",
        "orientation": "h",
        "x": densities,
        "y": rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "marker": {
            "color": densities,
            "colorscale": "Viridis",
            "showscale": true,
            "colorbar": {"title": {"text": "People per km²"}},
        },
        "hovertemplate": "<b>%{y}</b><br>%{x:,.1f} people per km²<extra></extra>",
    })];

    Figure::new(
        data,
        json!({
            "title": {"text": "Top 30 Countries by Population Density"},
            "height": 800,
            "xaxis": {"title": {"text": "People per km²"}},
            "yaxis": {"categoryorder": "total ascending"},
        }),
    )
}

/// 2x2 dashboard: counts, population and area bars plus a population pie
pub fn region_dashboard(stats: &[RegionStats]) -> Figure {
    let regions: Vec<&str> = stats.iter().map(|s| s.region.as_str()).collect();
    let populations: Vec<f64> = stats.iter().map(|s| s.total_population).collect();

    let data = vec![
        json!({
            "type": "bar",
            "name": "Countries",
            "x": regions,
            "y": stats.iter().map(|s| s.country_count).collect::<Vec<_>>(),
            "marker": {"color": "#3b82f6"},
            "xaxis": "x",
            "yaxis": "y",
        }),
        json!({
            "type": "bar",
            "name": "Population",
            "x": regions,
            "y": populations,
            "marker": {"color": "#10b981"},
            "xaxis": "x2",
            "yaxis": "y2",
        }),
        json!({
            "type": "bar",
            "name": "Avg Area",
            "x": regions,
            "y": stats.iter().map(|s| s.avg_area).collect::<Vec<_>>(),
            "marker": {"color": "#f59e0b"},
            "xaxis": "x3",
            "yaxis": "y3",
        }),
        json!({
            "type": "pie",
            "name": "Population Share",
            "labels": regions,
            "values": populations,
            "domain": {"x": [0.55, 1.0], "y": [0.0, 0.42]},
        }),
    ];

    let axis = |domain: [f64; 2], anchor: &str| {
        json!({"domain": domain, "anchor": anchor, "gridcolor": GRID, "zerolinecolor": GRID})
    };
    let subplot_title = |text: &str, x: f64, y: f64| {
        json!({
            "text": text,
            "x": x,
            "y": y,
            "xref": "paper",
            "yref": "paper",
            "xanchor": "center",
            "yanchor": "bottom",
            "showarrow": false,
            "font": {"size": 16},
        })
    };

    Figure::new(
        data,
        json!({
            "title": {"text": "Regional Analysis Dashboard"},
            "height": 800,
            "showlegend": false,
            "xaxis": axis([0.0, 0.45], "y"),
            "yaxis": axis([0.58, 1.0], "x"),
            "xaxis2": axis([0.55, 1.0], "y2"),
            "yaxis2": axis([0.58, 1.0], "x2"),
            "xaxis3": axis([0.0, 0.45], "y3"),
            "yaxis3": axis([0.0, 0.42], "x3"),
            "annotations": [
                subplot_title("Countries per Region", 0.225, 1.0),
                subplot_title("Total Population by Region", 0.775, 1.0),
                subplot_title("Average Area by Region", 0.225, 0.42),
                subplot_title("Population Distribution", 0.775, 0.42),
            ],
        }),
    )
}

/// Choropleth of population keyed by ISO alpha-3 code
pub fn world_map(points: &[MapPoint]) -> Figure {
    let data = vec![json!({
        "type": "choropleth",
        "locationmode": "ISO-3",
        "locations": points.iter().map(|p| p.iso_alpha3.as_str()).collect::<Vec<_>>(),
        "z": points.iter().map(|p| p.population).collect::<Vec<_>>(),
        "text": points.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "customdata": points
            .iter()
            .map(|p| json!([p.area, p.region]))
            .collect::<Vec<_>>(),
        "hovertemplate": "<b>%{text}</b><br>Population: %{z:,}<br>Area: %{customdata[0]:,.0f} km²<br>Region: %{customdata[1]}<extra></extra>",
        "colorscale": "Viridis",
        "colorbar": {"title": {"text": "Population"}},
    })];

    Figure::new(
        data,
        json!({
            "title": {"text": "World Population Map"},
            "height": 600,
            "geo": {
                "showframe": false,
                "showcoastlines": true,
                "projection": {"type": "equirectangular"},
                "bgcolor": BACKGROUND,
            },
        }),
    )
}

/// Treemap rooted at "World", sized by population, coloured by country count
pub fn continent_treemap(stats: &[ContinentStats]) -> Figure {
    let total_population: f64 = stats.iter().map(|s| s.total_population).sum();
    let total_countries: i64 = stats.iter().map(|s| s.country_count).sum();

    let mut labels = vec!["World".to_string()];
    let mut parents = vec![String::new()];
    let mut values = vec![total_population];
    let mut colors = vec![total_countries as f64];
    for s in stats {
        labels.push(s.name.clone());
        parents.push("World".to_string());
        values.push(s.total_population);
        colors.push(s.country_count as f64);
    }

    let data = vec![json!({
        "type": "treemap",
        "labels": labels,
        "parents": parents,
        "values": values,
        "branchvalues": "total",
        "marker": {
            "colors": colors,
            "colorscale": "RdYlBu",
            "showscale": true,
            "colorbar": {"title": {"text": "Countries"}},
        },
        "hovertemplate": "<b>%{label}</b><br>Population: %{value:,}<br>Countries: %{color}<extra></extra>",
    })];

    Figure::new(
        data,
        json!({
            "title": {"text": "Continental Population Distribution"},
            "height": 600,
        }),
    )
}

/// Horizontal bars of languages by number of countries
pub fn language_bars(stats: &[LanguageStats]) -> Figure {
    let counts: Vec<i64> = stats.iter().map(|s| s.country_count).collect();

    let data = vec![json!({
        "type": "bar",
        "orientation": "h",
        "x": counts,
        "y": stats.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "marker": {"color": counts, "colorscale": "Blues", "showscale": true},
        "hovertemplate": "<b>%{y}</b><br>%{x} countries<extra></extra>",
    })];

    Figure::new(
        data,
        json!({
            "title": {"text": "Top 20 Languages by Number of Countries"},
            "height": 700,
            "xaxis": {"title": {"text": "Countries"}},
            "yaxis": {"categoryorder": "total ascending"},
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_row(name: &str, region: &str, population: i64) -> PopulationArea {
        PopulationArea {
            name: name.to_string(),
            population,
            area: 100.0,
            region: region.to_string(),
            density: population as f64 / 100.0,
        }
    }

    #[test]
    fn test_population_area_groups_by_region() {
        let figure = population_area(&[
            area_row("Chad", "Africa", 100),
            area_row("Peru", "Americas", 400),
            area_row("Mali", "Africa", 25),
        ]);

        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[0]["name"], "Africa");
        assert_eq!(figure.data[0]["text"], json!(["Chad", "Mali"]));
        assert_eq!(figure.data[1]["marker"]["size"], json!([50.0]));
        assert_eq!(figure.layout["xaxis"]["type"], "log");
        // Dark theme survives the overlay
        assert_eq!(figure.layout["xaxis"]["gridcolor"], GRID);
        assert_eq!(figure.layout["paper_bgcolor"], BACKGROUND);
    }

    #[test]
    fn test_treemap_root_totals_children() {
        let figure = continent_treemap(&[
            ContinentStats {
                name: "Asia".to_string(),
                country_count: 2,
                total_population: 300.0,
                total_area: 10.0,
            },
            ContinentStats {
                name: "Europe".to_string(),
                country_count: 1,
                total_population: 100.0,
                total_area: 5.0,
            },
        ]);

        let trace = &figure.data[0];
        assert_eq!(trace["labels"], json!(["World", "Asia", "Europe"]));
        assert_eq!(trace["parents"], json!(["", "World", "World"]));
        assert_eq!(trace["values"], json!([400.0, 300.0, 100.0]));
    }

    #[test]
    fn test_region_dashboard_has_four_panels() {
        let figure = region_dashboard(&[RegionStats {
            region: "Asia".to_string(),
            country_count: 4,
            total_population: 10.0,
            avg_area: 2.0,
        }]);

        assert_eq!(figure.data.len(), 4);
        assert_eq!(figure.data[3]["type"], "pie");
        assert_eq!(figure.layout["annotations"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_figure_script_cannot_close_script_tag() {
        let figure = language_bars(&[LanguageStats {
            name: "</script><script>alert(1)</script>".to_string(),
            country_count: 1,
        }]);

        let script = figure_script("chart", &figure);

        assert!(script.starts_with("Plotly.newPlot(\"chart\", "));
        assert!(!script.contains("</script>"));
        assert!(script.contains("\\u003c/script>"));
    }
}
