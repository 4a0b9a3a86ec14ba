use crate::error::PipelineError;
use crate::types::SportsDataset;
use geojson::FeatureCollection;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The global the browser map reads, as `sportsData[sport].features`.
const OUTPUT_VARIABLE: &str = "sportsData";

/// Sport name -> feature collection, built up one successful join at a time.
/// Key order carries no meaning for consumers; a BTreeMap just keeps the
/// output bytes stable between runs.
#[derive(Default)]
pub struct ResultAggregate {
    datasets: BTreeMap<String, FeatureCollection>,
}

impl ResultAggregate {
    pub fn insert(&mut self, dataset: SportsDataset) {
        self.datasets.insert(dataset.name, dataset.collection);
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Renders the whole aggregate as one embeddable assignment statement.
    pub fn to_js(&self) -> Result<String, serde_json::Error> {
        let body = serde_json::to_string(&self.datasets)?;
        Ok(format!("var {OUTPUT_VARIABLE} = {body};"))
    }

    /// Serializes everything in memory first, then writes in a single call,
    /// so a failure leaves no partial file behind.
    pub fn write_js(&self, path: &Path) -> Result<(), PipelineError> {
        let rendered = self.to_js().map_err(|e| PipelineError::Write {
            path: path.to_owned(),
            source: e.into(),
        })?;
        fs::write(path, rendered).map_err(|e| PipelineError::Write {
            path: path.to_owned(),
            source: e.into(),
        })
    }
}
