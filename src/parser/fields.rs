//! Field-level extraction from loosely-typed country JSON.
//!
//! Every helper treats an absent key and an explicit `null` the same way and
//! returns `Err(reason)` only when a value is present but has the wrong shape.

use serde_json::{Map, Value};

pub type FieldResult<T> = Result<T, String>;

/// Common and official name of a country
#[derive(Debug, Clone, PartialEq)]
pub struct CountryName {
    pub common: String,
    pub official: Option<String>,
}

/// Accepts `{"common": .., "official": ..}` or a bare string
pub fn extract_name(value: Option<&Value>) -> Option<CountryName> {
    match value? {
        Value::Object(obj) => {
            let common = non_empty(obj.get("common").and_then(Value::as_str))?;
            let official = non_empty(obj.get("official").and_then(Value::as_str));
            Some(CountryName { common, official })
        }
        Value::String(s) => non_empty(Some(s.as_str())).map(|common| CountryName {
            common,
            official: None,
        }),
        _ => None,
    }
}

/// Numbers and numeric strings; empty strings count as missing
pub fn coerce_number(value: Option<&Value>) -> FieldResult<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| format!("number {} is out of range", n)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Some)
                .ok_or_else(|| format!("expected a number, got {:?}", s))
        }
        Some(other) => Err(format!("expected a number, got {}", kind(other))),
    }
}

/// Non-negative whole count (population)
pub fn coerce_count(value: Option<&Value>) -> FieldResult<Option<i64>> {
    match coerce_number(value)? {
        Some(n) if n < 0.0 => Err(format!("must not be negative, got {}", n)),
        Some(n) if n.fract() != 0.0 => Err(format!("expected a whole number, got {}", n)),
        Some(n) if n >= i64::MAX as f64 => Err(format!("number {} is out of range", n)),
        Some(n) => Ok(Some(n as i64)),
        None => Ok(None),
    }
}

/// Non-negative measurement (area)
pub fn coerce_measure(value: Option<&Value>) -> FieldResult<Option<f64>> {
    match coerce_number(value)? {
        Some(n) if n < 0.0 => Err(format!("must not be negative, got {}", n)),
        other => Ok(other),
    }
}

/// People per km², `None` unless both inputs are positive
pub fn population_density(population: Option<i64>, area: Option<f64>) -> Option<f64> {
    match (population, area) {
        (Some(p), Some(a)) if p > 0 && a > 0.0 => Some(p as f64 / a),
        _ => None,
    }
}

/// Value for the numerically latest year in a `{"2016": 38.5, ...}` mapping
pub fn latest_year_value(value: Option<&Value>) -> FieldResult<Option<f64>> {
    let map = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(format!(
                "expected a year-keyed object, got {}",
                kind(other)
            ))
        }
    };

    let mut latest: Option<(i32, f64)> = None;
    for (key, entry) in map {
        let Ok(year) = key.trim().parse::<i32>() else {
            continue;
        };
        let Some(number) = coerce_number(Some(entry)).map_err(|e| format!("year {}: {}", key, e))?
        else {
            continue;
        };
        if latest.map_or(true, |(seen, _)| year > seen) {
            latest = Some((year, number));
        }
    }

    Ok(latest.map(|(_, number)| number))
}

/// Prefer the raster image, fall back to the vector one
pub fn pick_image_url(value: Option<&Value>) -> FieldResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(non_empty(obj.get("png").and_then(Value::as_str))
            .or_else(|| non_empty(obj.get("svg").and_then(Value::as_str)))),
        Some(other) => Err(format!("expected an object, got {}", kind(other))),
    }
}

/// `idd.root` joined with each `idd.suffixes` entry
pub fn calling_codes(value: Option<&Value>) -> FieldResult<Vec<String>> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(obj)) => obj,
        Some(other) => return Err(format!("expected an object, got {}", kind(other))),
    };

    let root = optional_text(obj.get("root")).map_err(|e| format!("root: {}", e))?;
    let suffixes = string_list(obj.get("suffixes")).map_err(|e| format!("suffixes: {}", e))?;

    match root {
        Some(root) if !suffixes.is_empty() => Ok(suffixes
            .iter()
            .map(|suffix| format!("{}{}", root, suffix))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Array of strings; a bare string is read as a one-element list
pub fn string_list(value: Option<&Value>) -> FieldResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(format!("element {} is {}", i, kind(other))),
            })
            .collect(),
        Some(other) => Err(format!("expected a list of strings, got {}", kind(other))),
    }
}

/// First entry of a list such as `capital`, or a bare string
pub fn first_text(value: Option<&Value>) -> FieldResult<Option<String>> {
    match value {
        Some(Value::Array(items)) => optional_text(items.first()),
        other => optional_text(other),
    }
}

/// Strings (and numbers, e.g. numeric ISO codes) as text
pub fn optional_text(value: Option<&Value>) -> FieldResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_empty(Some(s.as_str()))),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(format!("expected text, got {}", kind(other))),
    }
}

/// First two elements of a `[lat, lng]` pair
pub fn coordinates(value: Option<&Value>) -> FieldResult<(Option<f64>, Option<f64>)> {
    match value {
        None | Some(Value::Null) => Ok((None, None)),
        Some(Value::Array(items)) => {
            let latitude = coerce_number(items.first()).map_err(|e| format!("latitude: {}", e))?;
            let longitude = coerce_number(items.get(1)).map_err(|e| format!("longitude: {}", e))?;
            Ok((latitude, longitude))
        }
        Some(other) => Err(format!("expected a [lat, lng] array, got {}", kind(other))),
    }
}

pub fn flag(value: Option<&Value>) -> FieldResult<bool> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(format!("expected a boolean, got {}", kind(other))),
    }
}

/// JSON object kept as-is, `{}` when missing
pub fn object_or_empty(value: Option<&Value>) -> FieldResult<Value> {
    match value {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(Value::Object(obj)) => Ok(Value::Object(obj.clone())),
        Some(other) => Err(format!("expected an object, got {}", kind(other))),
    }
}

/// Language names from a `{"eng": "English"}` mapping, in source order
pub fn language_names(value: Option<&Value>) -> FieldResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(obj)) => obj
            .iter()
            .filter_map(|(code, name)| match name {
                Value::String(s) => non_empty(Some(s.as_str())).map(Ok),
                other => Some(Err(format!("{} is {}", code, kind(other)))),
            })
            .collect(),
        Some(Value::Array(_)) => string_list(value),
        Some(other) => Err(format!("expected an object, got {}", kind(other))),
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_name_from_object_and_string() {
        let obj = json!({"common": "Japan", "official": "Japan"});
        assert_eq!(
            extract_name(Some(&obj)),
            Some(CountryName {
                common: "Japan".to_string(),
                official: Some("Japan".to_string()),
            })
        );

        let bare = json!("Monaco");
        assert_eq!(extract_name(Some(&bare)).unwrap().common, "Monaco");
    }

    #[test]
    fn test_extract_name_rejects_unusable_values() {
        assert_eq!(extract_name(None), None);
        assert_eq!(extract_name(Some(&json!({"official": "Nowhere"}))), None);
        assert_eq!(extract_name(Some(&json!({"common": "  "}))), None);
        assert_eq!(extract_name(Some(&json!(42))), None);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&json!(12.5))), Ok(Some(12.5)));
        assert_eq!(coerce_number(Some(&json!("1000"))), Ok(Some(1000.0)));
        assert_eq!(coerce_number(Some(&json!(""))), Ok(None));
        assert_eq!(coerce_number(Some(&Value::Null)), Ok(None));
        assert_eq!(coerce_number(None), Ok(None));
        assert!(coerce_number(Some(&json!("lots"))).is_err());
        assert!(coerce_number(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_coerce_count_rejects_negative() {
        assert_eq!(coerce_count(Some(&json!(331900000))), Ok(Some(331900000)));
        assert!(coerce_count(Some(&json!(-5))).is_err());
    }

    #[test]
    fn test_coerce_count_rejects_fractions() {
        assert_eq!(coerce_count(Some(&json!(1000.0))), Ok(Some(1000)));
        assert_eq!(coerce_count(Some(&json!("1000"))), Ok(Some(1000)));
        assert_eq!(
            coerce_count(Some(&json!("1000.7"))),
            Err("expected a whole number, got 1000.7".to_string())
        );
        assert!(coerce_count(Some(&json!(2.5))).is_err());
    }

    #[test]
    fn test_population_density_never_divides_by_zero() {
        assert_eq!(population_density(Some(100), Some(4.0)), Some(25.0));
        assert_eq!(population_density(Some(100), Some(0.0)), None);
        assert_eq!(population_density(Some(100), None), None);
        assert_eq!(population_density(None, Some(10.0)), None);
        assert_eq!(population_density(Some(0), Some(10.0)), None);
    }

    #[test]
    fn test_latest_year_value_picks_latest_year() {
        let gini = json!({"2016": 38.5, "2018": 41.4});
        assert_eq!(latest_year_value(Some(&gini)), Ok(Some(41.4)));

        // Numeric, not lexicographic
        let gini = json!({"999": 10.0, "2001": 20.0});
        assert_eq!(latest_year_value(Some(&gini)), Ok(Some(20.0)));
    }

    #[test]
    fn test_latest_year_value_empty_and_invalid() {
        assert_eq!(latest_year_value(Some(&json!({}))), Ok(None));
        assert_eq!(latest_year_value(Some(&json!({"latest": 3.0}))), Ok(None));
        assert!(latest_year_value(Some(&json!({"2018": "high"}))).is_err());
        assert!(latest_year_value(Some(&json!([41.4]))).is_err());
    }

    #[test]
    fn test_pick_image_url_prefers_png() {
        let both = json!({"png": "https://flagcdn.com/w320/us.png", "svg": "https://flagcdn.com/us.svg"});
        assert_eq!(
            pick_image_url(Some(&both)),
            Ok(Some("https://flagcdn.com/w320/us.png".to_string()))
        );

        let svg_only = json!({"svg": "https://flagcdn.com/us.svg"});
        assert_eq!(
            pick_image_url(Some(&svg_only)),
            Ok(Some("https://flagcdn.com/us.svg".to_string()))
        );

        assert_eq!(pick_image_url(Some(&json!({}))), Ok(None));
    }

    #[test]
    fn test_calling_codes() {
        let idd = json!({"root": "+3", "suffixes": ["77"]});
        assert_eq!(calling_codes(Some(&idd)), Ok(vec!["+377".to_string()]));

        let shared = json!({"root": "+1", "suffixes": ["201", "202"]});
        assert_eq!(
            calling_codes(Some(&shared)),
            Ok(vec!["+1201".to_string(), "+1202".to_string()])
        );

        let empty_suffix = json!({"root": "+1", "suffixes": [""]});
        assert_eq!(calling_codes(Some(&empty_suffix)), Ok(vec!["+1".to_string()]));

        assert_eq!(calling_codes(Some(&json!({"root": "+1"}))), Ok(vec![]));
        assert_eq!(calling_codes(Some(&json!({}))), Ok(vec![]));
    }

    #[test]
    fn test_first_text_and_coordinates() {
        assert_eq!(
            first_text(Some(&json!(["Washington, D.C."]))),
            Ok(Some("Washington, D.C.".to_string()))
        );
        assert_eq!(first_text(Some(&json!([]))), Ok(None));
        assert_eq!(
            coordinates(Some(&json!([38.0, -97.0, 12.0]))),
            Ok((Some(38.0), Some(-97.0)))
        );
        assert_eq!(coordinates(Some(&json!([1.5]))), Ok((Some(1.5), None)));
        assert!(coordinates(Some(&json!("north"))).is_err());
    }

    #[test]
    fn test_language_names_keep_source_order() {
        let langs = json!({"zho": "Chinese", "eng": "English", "msa": "Malay", "tam": "Tamil"});
        assert_eq!(
            language_names(Some(&langs)),
            Ok(vec![
                "Chinese".to_string(),
                "English".to_string(),
                "Malay".to_string(),
                "Tamil".to_string()
            ])
        );
        assert!(language_names(Some(&json!({"eng": 1}))).is_err());
    }
}
