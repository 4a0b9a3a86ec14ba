use std::path::PathBuf;
use thiserror::Error;

/// Failures the pipeline can surface. Boundary-side `Load`/`Schema` and the
/// final `Write` are fatal; dataset-side `Load`/`Schema` are logged and the
/// run continues with the remaining files.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{context}: missing identifier field '{field}'")]
    Schema { context: String, field: String },

    #[error("unsupported reprojection EPSG:{from} -> EPSG:{to}")]
    UnsupportedCrs { from: u32, to: u32 },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    pub fn load(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PipelineError::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn schema(context: impl Into<String>, field: impl Into<String>) -> Self {
        PipelineError::Schema {
            context: context.into(),
            field: field.into(),
        }
    }
}
