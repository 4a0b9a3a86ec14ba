use crate::error::PipelineError;
use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::FRAC_PI_2;

pub const EPSG_WGS84: u32 = 4326;
pub const EPSG_GDA2020: u32 = 7844;
pub const EPSG_WEB_MERCATOR: u32 = 3857;

// Spherical Mercator earth radius, metres
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Transforms one geometry from the boundary collection's CRS into the output
/// CRS. Only the fixed pairs the pipeline needs are supported; anything else
/// is an `UnsupportedCrs` error rather than a silent pass-through.
pub fn to_output_crs(
    geometry: MultiPolygon<f64>,
    source: u32,
    target: u32,
) -> Result<MultiPolygon<f64>, PipelineError> {
    match (source, target) {
        (s, t) if s == t => Ok(geometry),
        // GDA2020 and WGS84 share axes to within float precision at this scale
        (EPSG_GDA2020, EPSG_WGS84) => Ok(geometry),
        (EPSG_WEB_MERCATOR, EPSG_WGS84) => Ok(geometry.map_coords(mercator_to_lon_lat)),
        (s, t) => Err(PipelineError::UnsupportedCrs { from: s, to: t }),
    }
}

fn mercator_to_lon_lat(c: Coord<f64>) -> Coord<f64> {
    let lon = (c.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    Coord { x: lon, y: lat }
}
