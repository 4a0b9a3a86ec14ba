use crate::config::InputConfig;
use crate::error::PipelineError;
use crate::types::{BoundaryRecord, DatasetRecord};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use serde_json::{Map, Value};
use shapefile::dbase::FieldValue;
use shapefile::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;

const NAME_PREFIX: &str = "map_";
const NAME_SUFFIX: &str = "_input.csv";

/// Loads the boundary collection, dispatching on file extension.
/// Any failure here is fatal: every dataset join depends on this collection.
pub fn load_boundaries(input: &InputConfig) -> Result<Vec<BoundaryRecord>, PipelineError> {
    let extension = input
        .boundary_file
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "shp" => load_boundary_shapefile(input),
        "json" | "geojson" => load_boundary_geojson(input),
        other => Err(PipelineError::load(
            input.boundary_file.clone(),
            format!("unsupported boundary format: '{other}'"),
        )),
    }
}

fn load_boundary_shapefile(input: &InputConfig) -> Result<Vec<BoundaryRecord>, PipelineError> {
    let path = &input.boundary_file;
    let mut reader =
        Reader::from_path(path).map_err(|e| PipelineError::load(path.clone(), e))?;

    let mut boundaries = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|e| PipelineError::load(path.clone(), e))?;

        let id_value = record.get(&input.boundary_join_field).ok_or_else(|| {
            PipelineError::schema(
                format!("boundary collection {}", path.display()),
                input.boundary_join_field.as_str(),
            )
        })?;
        let id = match field_to_id(id_value) {
            Some(id) => id,
            None => continue, // null identifier
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(p) => p
                .try_into()
                .map_err(|e| PipelineError::load(path.clone(), format!("{e:?}")))?,
            shapefile::Shape::PolygonM(p) => p
                .try_into()
                .map_err(|e| PipelineError::load(path.clone(), format!("{e:?}")))?,
            shapefile::Shape::PolygonZ(p) => p
                .try_into()
                .map_err(|e| PipelineError::load(path.clone(), format!("{e:?}")))?,
            _ => continue, // non-areal shapes are not regions
        };

        let mut attributes = Map::new();
        for (name, value) in record {
            if let Some(json) = field_to_json(value) {
                attributes.insert(name, json);
            }
        }
        // Uniform string typing for the join field, whatever dbase says
        attributes.insert(input.boundary_join_field.clone(), Value::String(id.clone()));

        boundaries.push(BoundaryRecord {
            id,
            geometry,
            attributes,
        });
    }

    Ok(boundaries)
}

fn load_boundary_geojson(input: &InputConfig) -> Result<Vec<BoundaryRecord>, PipelineError> {
    let path = &input.boundary_file;
    let file = File::open(path).map_err(|e| PipelineError::load(path.clone(), e))?;
    let geojson = geojson::GeoJson::from_reader(BufReader::new(file))
        .map_err(|e| PipelineError::load(path.clone(), e))?;

    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(PipelineError::load(
                path.clone(),
                "boundary GeoJSON must be a FeatureCollection".to_string(),
            ))
        }
    };

    let mut boundaries = Vec::new();

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();

        let id = match properties.get(&input.boundary_join_field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => number_to_id(n),
            Some(Value::Null) => continue,
            Some(_) => continue,
            None => {
                return Err(PipelineError::schema(
                    format!("boundary collection {}", path.display()),
                    input.boundary_join_field.as_str(),
                ))
            }
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let converted: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| PipelineError::load(path.clone(), format!("{e:?}")))?;
                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // points/lines are not regions
                }
            }
            None => continue,
        };

        let mut attributes = properties;
        attributes.insert(input.boundary_join_field.clone(), Value::String(id.clone()));

        boundaries.push(BoundaryRecord {
            id,
            geometry,
            attributes,
        });
    }

    Ok(boundaries)
}

/// Scans the dataset directory for files matching the configured pattern and
/// derives each sport's name from its filename. Sorted so runs are
/// reproducible regardless of directory order.
pub fn discover_datasets(input: &InputConfig) -> Result<Vec<(String, PathBuf)>, PipelineError> {
    let pattern = input.dataset_dir.join(&input.dataset_pattern);
    let pattern = pattern.to_string_lossy();

    let entries =
        glob::glob(&pattern).map_err(|e| PipelineError::load(input.dataset_dir.clone(), e))?;

    let mut datasets = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => datasets.push((sport_name(&path), path)),
            Err(e) => warn!("skipping unreadable directory entry: {e}"),
        }
    }
    datasets.sort();
    Ok(datasets)
}

/// `map_Hockey_input.csv` -> `Hockey`; falls back to the file stem when the
/// configured pattern doesn't follow the standard naming convention.
fn sport_name(path: &Path) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match file_name
        .strip_prefix(NAME_PREFIX)
        .and_then(|s| s.strip_suffix(NAME_SUFFIX))
    {
        Some(name) => name.to_string(),
        None => path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name)
            .to_string(),
    }
}

/// Reads one sport CSV. Rows with an empty identifier cell are dropped;
/// a missing identifier column is a schema error for this file only.
pub fn load_dataset(path: &Path, join_column: &str) -> Result<Vec<DatasetRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::load(path.to_owned(), e))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::load(path.to_owned(), e))?
        .clone();
    let join_idx = headers
        .iter()
        .position(|h| h == join_column)
        .ok_or_else(|| PipelineError::schema(path.display().to_string(), join_column))?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| PipelineError::load(path.to_owned(), e))?;
        let id = record.get(join_idx).unwrap_or("").to_string();
        if id.is_empty() {
            continue;
        }

        let fields = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != join_idx)
            .map(|(_, (header, cell))| (header.to_string(), cell_to_json(cell)))
            .collect();

        records.push(DatasetRecord { id, fields });
    }

    Ok(records)
}

fn field_to_id(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format_numeric_id(*n)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Double(d) => Some(format_numeric_id(*d)),
        _ => None,
    }
}

// A JSON-encoded identifier may arrive as a float (pandas-style
// `40123456789.0`); it must join against the same id without the tail.
fn number_to_id(n: &serde_json::Number) -> String {
    match n.as_i64() {
        Some(i) => i.to_string(),
        None => match n.as_f64() {
            Some(f) => format_numeric_id(f),
            None => n.to_string(),
        },
    }
}

// SA1 codes fit comfortably in i64; keep them free of a ".0" tail.
fn format_numeric_id(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn field_to_json(value: FieldValue) -> Option<Value> {
    match value {
        FieldValue::Character(s) => Some(s.map(Value::String).unwrap_or(Value::Null)),
        FieldValue::Numeric(n) => Some(n.map(float_to_json).unwrap_or(Value::Null)),
        FieldValue::Float(f) => Some(f.map(|f| float_to_json(f64::from(f))).unwrap_or(Value::Null)),
        FieldValue::Integer(i) => Some(Value::from(i)),
        FieldValue::Double(d) => Some(float_to_json(d)),
        FieldValue::Currency(c) => Some(float_to_json(c)),
        FieldValue::Logical(b) => Some(b.map(Value::Bool).unwrap_or(Value::Null)),
        FieldValue::Date(d) => Some(
            d.map(|d| Value::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())))
                .unwrap_or(Value::Null),
        ),
        FieldValue::Memo(m) => Some(Value::String(m)),
        _ => None,
    }
}

fn float_to_json(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn cell_to_json(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return float_to_json(f);
        }
    }
    Value::String(raw.to_string())
}
