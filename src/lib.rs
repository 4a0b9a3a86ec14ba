pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod processing;
pub mod reproject;
pub mod types;

pub use config::AppConfig;
pub use error::PipelineError;
pub use output::ResultAggregate;

use tracing::warn;

/// Runs the whole batch: load boundaries once, then process each discovered
/// sport file to completion before the next, then write the aggregate in one
/// shot. A broken sport file or a sport with no matching regions is skipped
/// with a warning; boundary and output failures abort the run.
pub fn run(config: &AppConfig) -> Result<(), PipelineError> {
    println!(
        "Loading boundary collection from {:?}...",
        config.input.boundary_file
    );
    let boundaries = data::load_boundaries(&config.input)?;
    println!("Boundary collection loaded with {} records.", boundaries.len());

    let datasets = data::discover_datasets(&config.input)?;
    println!("Found {} sport files.", datasets.len());

    let mut aggregate = ResultAggregate::default();

    for (name, path) in &datasets {
        println!("Processing {}...", name);

        let records = match data::load_dataset(path, &config.input.dataset_join_column) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping {name}: {e}");
                continue;
            }
        };

        match processing::join_dataset(&boundaries, name, &records, config)? {
            Some(dataset) => {
                println!(
                    "  Added {} records for {}",
                    dataset.collection.features.len(),
                    name
                );
                aggregate.insert(dataset);
            }
            None => warn!("no matching boundary regions found for {name}"),
        }
    }

    println!("Saving to {:?}...", config.output.js_file);
    aggregate.write_js(&config.output.js_file)?;
    println!(
        "Successfully created {:?} with {} sports.",
        config.output.js_file,
        aggregate.len()
    );

    Ok(())
}
