pub mod design;
pub mod features;
pub mod variance;

use crate::error::{CliError, Result};
use idrdesign::core::features::{FeatureConfig, FeatureRegistry};
use idrdesign::core::io::fasta::{FastaFile, FastaRecord};
use idrdesign::core::io::traits::SequenceFile;
use std::path::Path;
use tracing::info;

/// The registry described by `path`, or the default feature set.
pub(crate) fn load_registry(path: Option<&Path>) -> Result<FeatureRegistry> {
    let config = match path {
        Some(path) => {
            info!("Loading feature set from {:?}", path);
            FeatureConfig::load(path).map_err(|e| CliError::parsing(path, e))?
        }
        None => {
            info!("Using the default feature set.");
            FeatureConfig::default()
        }
    };
    let registry =
        FeatureRegistry::from_config(&config).map_err(|e| CliError::Config(e.to_string()))?;
    info!(features = registry.len(), "Feature registry ready");
    Ok(registry)
}

pub(crate) fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>> {
    let records = FastaFile::read_from_path(path).map_err(|e| CliError::parsing(path, e))?;
    info!("Read {} record(s) from {:?}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// A two-feature set whose values are defined for any non-empty sequence.
    pub fn write_feature_set(dir: &Path) -> PathBuf {
        let path = dir.join("features.toml");
        fs::write(
            &path,
            r#"
            [count.frac-e]
            pattern = "E"
            average = true

            [count.frac-k]
            pattern = "K"
            average = true
            "#,
        )
        .unwrap();
        path
    }

    pub fn write_fasta(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
