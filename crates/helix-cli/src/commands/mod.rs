pub mod command;
pub mod fit;
pub mod index;
pub mod peaks;
pub mod strand;

use crate::cli::LatticeArgs;
use crate::config::PartialIndexingConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use helixdex::core::io::params::{ParameterRecord, ParamsFile};
use helixdex::core::io::traits::RecordFile;
use helixdex::core::models::lattice::LatticeModel;
use helixdex::engine::config::IndexingConfig;
use helixdex::engine::error::EngineError;
use helixdex::engine::progress::ProgressReporter;
use helixdex::engine::refine::LatticeRefiner;
use helixdex::workflows;
use helixdex::workflows::index::IndexingResult;
use std::path::Path;
use tracing::info;

/// A parameter record together with the model and configuration it resolves to.
pub struct LoadedLattice {
    pub record: ParameterRecord,
    pub model: LatticeModel,
    pub config: IndexingConfig,
}

pub fn read_record(path: &Path) -> Result<ParameterRecord> {
    info!("Loading parameter record from {:?}", path);
    ParamsFile::read_from_path(path).map_err(|e| CliError::file_parsing(path, e))
}

pub fn model_from_record(record: &ParameterRecord) -> Result<LatticeModel> {
    record
        .to_model()
        .map_err(|e| CliError::Core(EngineError::from(e)))
}

/// Reads the record and merges configuration from file, `--set` values and flags.
pub fn load_lattice(args: &LatticeArgs) -> Result<LoadedLattice> {
    let record = read_record(&args.params)?;
    let mut model = model_from_record(&record)?;
    if let Some((first, second)) = args.orders {
        info!(first, second, "Overriding Bessel orders from the command line.");
        model.set_bessel_orders(first, second);
    }

    info!("Merging configuration from file and CLI arguments...");
    let config = PartialIndexingConfig::load(args.config.as_deref())?
        .merge_with_cli(args, record.pixel_size)?;

    Ok(LoadedLattice {
        record,
        model,
        config,
    })
}

/// Runs the indexing workflow with a spinner on stderr.
pub fn index_lattice(loaded: &mut LoadedLattice) -> Result<(IndexingResult, LatticeRefiner)> {
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core indexing workflow...");
    Ok(workflows::index::run(&mut loaded.model, &loaded.config, &reporter)?)
}
