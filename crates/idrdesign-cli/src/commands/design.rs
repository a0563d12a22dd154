use super::{load_registry, read_fasta};
use crate::cli::DesignArgs;
use crate::config::{TargetInput, VarianceSource, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use idrdesign::core::distance::ReferenceVariance;
use idrdesign::core::features::FeatureRegistry;
use idrdesign::core::io::fasta::{FastaFile, FastaRecord};
use idrdesign::core::io::traits::SequenceFile;
use idrdesign::core::sequence::Sequence;
use idrdesign::engine::error::EngineError;
use idrdesign::engine::progress::ProgressReporter;
use idrdesign::engine::state::DesignOutcome;
use idrdesign::workflows;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: DesignArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args)?;

    let registry = load_registry(app.features_path.as_deref())?;
    let target = resolve_target(&app.target)?;
    let reference = load_reference(&app.variance, &registry)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Designing against target {} ({} residues, {} features)...",
        target,
        target.len(),
        registry.len()
    );
    info!("Invoking the design workflow...");
    let outcomes = workflows::design::design(
        &target,
        &app.start,
        &registry,
        &reference,
        &app.core_config,
        &reporter,
    )?;

    if outcomes.is_empty() {
        warn!("Design run completed without any searches.");
        println!("Warning: no start sequences were requested.");
        return Ok(());
    }

    for (i, outcome) in outcomes.iter().enumerate() {
        println!(
            "{:>3}  {}  distance {:.6}  rounds {}  ({:.2?})",
            i + 1,
            outcome.sequence,
            outcome.distance,
            outcome.iterations,
            outcome.elapsed
        );
    }

    if let Some(path) = &app.output_path {
        write_outcomes(path, &outcomes)?;
        println!(
            "✓ {} designed sequence(s) written to: {}",
            outcomes.len(),
            path.display()
        );
    }
    Ok(())
}

fn resolve_target(input: &TargetInput) -> Result<Sequence> {
    match input {
        TargetInput::Literal(text) => {
            Sequence::new(text).map_err(|e| CliError::Argument(format!("--target: {e}")))
        }
        TargetInput::Fasta(path) => {
            let record = read_fasta(path)?.into_iter().next().ok_or_else(|| {
                CliError::Argument(format!("{} contains no FASTA records", path.display()))
            })?;
            info!("Using record '{}' as the target", record.id);
            Ok(record.sequence)
        }
    }
}

fn load_reference(source: &VarianceSource, registry: &FeatureRegistry) -> Result<ReferenceVariance> {
    match source {
        VarianceSource::Table(path) => {
            info!("Loading reference variances from {:?}", path);
            ReferenceVariance::read_csv(path).map_err(|e| CliError::parsing(path, e))
        }
        VarianceSource::Reference(path) => {
            let corpus: Vec<Sequence> = read_fasta(path)?
                .into_iter()
                .map(|record| record.sequence)
                .collect();
            info!("Estimating reference variances from {} sequence(s)", corpus.len());
            Ok(ReferenceVariance::estimate(registry, &corpus).map_err(EngineError::from)?)
        }
    }
}

fn write_outcomes(path: &Path, outcomes: &[DesignOutcome]) -> Result<()> {
    let records: Vec<FastaRecord> = outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            FastaRecord::new(
                format!(
                    "design_{} distance={:.6} rounds={} start={}",
                    i + 1,
                    outcome.distance,
                    outcome.iterations,
                    outcome.start
                ),
                outcome.sequence.clone(),
            )
        })
        .collect();
    FastaFile::write_to_path(&records, path).map_err(|e| CliError::writing(path, e))
}
