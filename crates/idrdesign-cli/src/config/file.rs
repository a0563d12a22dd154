use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The `design` configuration file. Every field is optional; absent values
/// fall through to the built-in defaults.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    /// Feature set definition (TOML).
    pub features: Option<PathBuf>,
    /// Reference variance table (CSV).
    pub variance: Option<PathBuf>,
    /// FASTA corpus to estimate the variance table from.
    pub reference: Option<PathBuf>,
    pub search: Option<FileSearchConfig>,
    pub seed: Option<FileSeedConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSearchConfig {
    pub strategy: Option<String>,
    pub precision: Option<f64>,
    pub max_iterations: Option<usize>,
    pub time_budget_secs: Option<f64>,
    pub max_start_attempts: Option<usize>,
    pub good_quota: Option<usize>,
    pub marginal_quota: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSeedConfig {
    pub value: Option<u64>,
    pub bind_to_target: Option<bool>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading design configuration from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::parsing(path, e))?;
        toml::from_str(&content).map_err(|e| CliError::parsing(path, e))
    }
}
