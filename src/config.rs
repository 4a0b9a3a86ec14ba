use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Boundary collection: .shp or .geojson/.json
    pub boundary_file: PathBuf,
    /// Identifier field in the boundary attributes
    #[serde(default = "default_boundary_join_field")]
    pub boundary_join_field: String,
    /// Directory scanned for sport CSVs
    pub dataset_dir: PathBuf,
    /// Filename pattern for sport CSVs; the sport name is the part between
    /// the `map_` prefix and `_input.csv` suffix
    #[serde(default = "default_dataset_pattern")]
    pub dataset_pattern: String,
    /// Identifier column in the sport CSVs
    #[serde(default = "default_dataset_join_column")]
    pub dataset_join_column: String,
    /// EPSG code of the boundary geometries
    #[serde(default = "default_source_epsg")]
    pub source_epsg: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Target file for the `var sportsData = ...;` assignment
    pub js_file: PathBuf,
    /// EPSG code of the emitted geometries
    #[serde(default = "default_output_epsg")]
    pub output_epsg: u32,
}

fn default_boundary_join_field() -> String {
    "SA1_CODE21".to_string()
}

fn default_dataset_pattern() -> String {
    "map_*_input.csv".to_string()
}

fn default_dataset_join_column() -> String {
    "Level0_Identifier".to_string()
}

fn default_source_epsg() -> u32 {
    crate::reproject::EPSG_GDA2020
}

fn default_output_epsg() -> u32 {
    crate::reproject::EPSG_WGS84
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
