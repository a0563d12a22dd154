use super::{load_registry, read_fasta};
use crate::cli::VarianceArgs;
use crate::error::{CliError, Result};
use idrdesign::core::distance::ReferenceVariance;
use idrdesign::core::sequence::Sequence;
use idrdesign::engine::error::EngineError;
use tracing::info;

pub fn run(args: VarianceArgs) -> Result<()> {
    let registry = load_registry(args.features.as_deref())?;
    let corpus: Vec<Sequence> = read_fasta(&args.reference)?
        .into_iter()
        .map(|record| record.sequence)
        .collect();

    info!("Estimating reference variances from {} sequence(s)", corpus.len());
    let reference = ReferenceVariance::estimate(&registry, &corpus).map_err(EngineError::from)?;

    reference
        .write_csv(&args.output)
        .map_err(|e| CliError::writing(&args.output, e))?;
    println!(
        "✓ Variances for {} feature(s) written to: {}",
        reference.entries().len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{write_fasta, write_feature_set};
    use tempfile::tempdir;

    #[test]
    fn writes_variance_table_for_every_feature() {
        let dir = tempdir().unwrap();
        let args = VarianceArgs {
            reference: write_fasta(dir.path(), "ref.fasta", ">a\nKKEE\n>b\nKAAA\n>c\nEEEA\n"),
            features: Some(write_feature_set(dir.path())),
            output: dir.path().join("variance.csv"),
        };
        run(args).unwrap();

        let table = ReferenceVariance::read_csv(&dir.path().join("variance.csv")).unwrap();
        let names: Vec<&str> = table.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["frac-e", "frac-k"]);
        assert!(table.entries().iter().all(|(_, v)| *v > 0.0));
    }

    #[test]
    fn single_sequence_corpus_is_insufficient() {
        let dir = tempdir().unwrap();
        let args = VarianceArgs {
            reference: write_fasta(dir.path(), "ref.fasta", ">a\nKKEE\n"),
            features: Some(write_feature_set(dir.path())),
            output: dir.path().join("variance.csv"),
        };
        assert!(matches!(run(args), Err(CliError::Core(EngineError::Distance(_)))));
    }
}
