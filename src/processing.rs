use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::reproject;
use crate::types::{BoundaryRecord, DatasetRecord, SportsDataset};
use geojson::Feature;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Strips a trailing decimal artifact from an identifier that arrived through
/// a float column, e.g. `"40123456789.0"` -> `"40123456789"`. Anchored to the
/// suffix: a `.0` anywhere else in the string is left alone, and identifiers
/// that never had a decimal tail pass through unchanged.
pub fn normalize_identifier(raw: &str) -> String {
    if let Some((stem, frac)) = raw.rsplit_once('.') {
        if !stem.is_empty() && !frac.is_empty() && frac.bytes().all(|b| b == b'0') {
            return stem.to_string();
        }
    }
    raw.to_string()
}

/// Joins one sport's rows against the boundary collection and encodes the
/// matches as a feature collection in the output CRS.
///
/// Returns `Ok(None)` when no boundary identifier matches any row — the
/// dataset is skipped, which is an expected outcome, not an error. The join
/// is driven by the dataset rows so that several rows sharing one region
/// each produce their own feature.
pub fn join_dataset(
    boundaries: &[BoundaryRecord],
    name: &str,
    records: &[DatasetRecord],
    config: &AppConfig,
) -> Result<Option<SportsDataset>, PipelineError> {
    let wanted: HashSet<String> = records
        .iter()
        .map(|r| normalize_identifier(&r.id))
        .collect();

    let matched: HashMap<&str, &BoundaryRecord> = boundaries
        .iter()
        .filter(|b| wanted.contains(b.id.as_str()))
        .map(|b| (b.id.as_str(), b))
        .collect();

    if matched.is_empty() {
        return Ok(None);
    }

    let mut features = Vec::new();
    for record in records {
        let id = normalize_identifier(&record.id);
        let Some(boundary) = matched.get(id.as_str()) else {
            continue;
        };

        let geometry = reproject::to_output_crs(
            boundary.geometry.clone(),
            config.input.source_epsg,
            config.output.output_epsg,
        )?;

        // Boundary attributes first, dataset columns second: on a name
        // collision the dataset's value wins.
        let mut properties = boundary.attributes.clone();
        properties.insert(
            config.input.dataset_join_column.clone(),
            Value::String(id.clone()),
        );
        for (column, value) in &record.fields {
            properties.insert(column.clone(), value.clone());
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(Some(SportsDataset {
        name: name.to_string(),
        collection: features.into_iter().collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, InputConfig, OutputConfig};
    use crate::reproject::EPSG_WGS84;
    use geo::{polygon, MultiPolygon};
    use serde_json::{json, Map};

    fn test_config() -> AppConfig {
        AppConfig {
            input: InputConfig {
                boundary_file: "boundaries.geojson".into(),
                boundary_join_field: "SA1_CODE21".into(),
                dataset_dir: ".".into(),
                dataset_pattern: "map_*_input.csv".into(),
                dataset_join_column: "Level0_Identifier".into(),
                source_epsg: EPSG_WGS84,
            },
            output: OutputConfig {
                js_file: "sports_data.js".into(),
                output_epsg: EPSG_WGS84,
            },
        }
    }

    fn boundary(id: &str, extra: &[(&str, Value)]) -> BoundaryRecord {
        let mut attributes = Map::new();
        attributes.insert("SA1_CODE21".into(), Value::String(id.to_string()));
        for (k, v) in extra {
            attributes.insert((*k).to_string(), v.clone());
        }
        BoundaryRecord {
            id: id.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 138.60, y: -34.70),
                (x: 138.61, y: -34.70),
                (x: 138.61, y: -34.69),
                (x: 138.60, y: -34.69),
                (x: 138.60, y: -34.70),
            ]]),
            attributes,
        }
    }

    fn row(id: &str, fields: &[(&str, Value)]) -> DatasetRecord {
        DatasetRecord {
            id: id.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn normalization_strips_trailing_decimal_artifact() {
        assert_eq!(normalize_identifier("40123456789.0"), "40123456789");
        assert_eq!(normalize_identifier("123.00"), "123");
        assert_eq!(normalize_identifier("B.0"), "B");
    }

    #[test]
    fn normalization_is_identity_without_artifact() {
        assert_eq!(normalize_identifier("40123456789"), "40123456789");
        assert_eq!(normalize_identifier("120"), "120");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn normalization_leaves_real_decimals_alone() {
        assert_eq!(normalize_identifier("10.05"), "10.05");
        assert_eq!(normalize_identifier("12.5"), "12.5");
        assert_eq!(normalize_identifier(".0"), ".0");
    }

    #[test]
    fn zero_matches_produce_no_dataset() {
        let boundaries = vec![boundary("A", &[]), boundary("B", &[])];
        let records = vec![row("X", &[("count", json!(1))])];
        let result = join_dataset(&boundaries, "Cricket", &records, &test_config()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn fan_out_is_preserved() {
        let boundaries = vec![boundary("A", &[])];
        let records = vec![
            row("A", &[("count", json!(1))]),
            row("A", &[("count", json!(2))]),
        ];
        let dataset = join_dataset(&boundaries, "Hockey", &records, &test_config())
            .unwrap()
            .unwrap();
        assert_eq!(dataset.collection.features.len(), 2);
    }

    #[test]
    fn unmatched_rows_are_dropped_but_join_succeeds() {
        let boundaries = vec![boundary("A", &[])];
        let records = vec![
            row("A", &[("count", json!(5))]),
            row("Z", &[("count", json!(9))]),
        ];
        let dataset = join_dataset(&boundaries, "Hockey", &records, &test_config())
            .unwrap()
            .unwrap();
        assert_eq!(dataset.collection.features.len(), 1);
    }

    #[test]
    fn dataset_value_wins_on_name_collision() {
        let boundaries = vec![boundary("A", &[("count", json!(99))])];
        let records = vec![row("A", &[("count", json!(5))])];
        let dataset = join_dataset(&boundaries, "Hockey", &records, &test_config())
            .unwrap()
            .unwrap();
        let props = dataset.collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props.get("count"), Some(&json!(5)));
    }

    #[test]
    fn merged_properties_union_both_sides() {
        let boundaries = vec![boundary("A", &[("STATE", json!("SA"))])];
        let records = vec![row("A.0", &[("count", json!(5))])];
        let dataset = join_dataset(&boundaries, "Hockey", &records, &test_config())
            .unwrap()
            .unwrap();
        let props = dataset.collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props.get("STATE"), Some(&json!("SA")));
        assert_eq!(props.get("count"), Some(&json!(5)));
        assert_eq!(props.get("SA1_CODE21"), Some(&json!("A")));
        assert_eq!(props.get("Level0_Identifier"), Some(&json!("A")));
    }
}
