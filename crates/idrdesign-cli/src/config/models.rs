use idrdesign::engine::config::DesignConfig;
use idrdesign::workflows::design::StartSpec;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum TargetInput {
    Literal(String),
    Fasta(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarianceSource {
    Table(PathBuf),
    Reference(PathBuf),
}

pub struct AppConfig {
    pub target: TargetInput,
    pub start: StartSpec,
    pub features_path: Option<PathBuf>,
    pub variance: VarianceSource,
    pub output_path: Option<PathBuf>,
    pub core_config: DesignConfig,
}
