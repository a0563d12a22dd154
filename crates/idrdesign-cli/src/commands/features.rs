use super::{load_registry, read_fasta};
use crate::cli::FeaturesArgs;
use crate::error::{CliError, Result};
use idrdesign::core::io::fasta::FastaRecord;
use idrdesign::engine::error::EngineError;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Writes one CSV row per record: `id`, `sequence`, then every feature.
/// Undefined features are left empty.
pub fn run(args: FeaturesArgs) -> Result<()> {
    let registry = load_registry(args.features.as_deref())?;
    let records = read_fasta(&args.input)?;

    let rows = records
        .par_iter()
        .map(|record| {
            registry
                .evaluate_all_skip_failures(&record.sequence)
                .map_err(EngineError::from)
        })
        .collect::<std::result::Result<Vec<_>, EngineError>>()?;

    let undefined = rows.iter().flatten().filter(|v| v.is_none()).count();
    if undefined > 0 {
        warn!(undefined, "Some feature values are undefined and were left empty");
    }

    write_table(&args.output, registry.names(), &records, &rows)
        .map_err(|e| CliError::writing(&args.output, e))?;
    info!("Feature table written to {:?}", &args.output);
    println!(
        "✓ Features of {} sequence(s) written to: {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}

fn write_table(
    path: &Path,
    names: &[String],
    records: &[FastaRecord],
    rows: &[Vec<Option<f64>>],
) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    let header = ["id", "sequence"]
        .into_iter()
        .map(str::to_string)
        .chain(names.iter().cloned());
    writer.write_record(header)?;
    for (record, values) in records.iter().zip(rows) {
        let fields = [record.id.clone(), record.sequence.to_string()]
            .into_iter()
            .chain(values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        writer.write_record(fields)?;
    }
    writer.flush()?;
    Ok(())
}
