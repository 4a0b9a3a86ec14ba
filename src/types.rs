use geo::MultiPolygon;
use geojson::FeatureCollection;
use serde_json::{Map, Value};

/// One region from the boundary collection: geometry plus every attribute
/// field, with the join identifier coerced to a string. Loaded once and
/// borrowed immutably for the whole run.
#[derive(Debug, Clone)]
pub struct BoundaryRecord {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
    pub attributes: Map<String, Value>,
}

/// One row from a sport CSV. The identifier is kept as read; normalization
/// happens in the join step.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    pub id: String,
    /// Non-identifier columns in source order.
    pub fields: Vec<(String, Value)>,
}

/// A named feature collection produced by one join pass.
#[derive(Debug)]
pub struct SportsDataset {
    pub name: String,
    pub collection: FeatureCollection,
}
