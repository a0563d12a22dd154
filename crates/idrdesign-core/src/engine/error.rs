use super::config::ConfigError;
use crate::core::distance::DistanceError;
use crate::core::features::FeatureError;
use crate::core::sequence::{AlphabetError, MutationError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid sequence: {0}")]
    Alphabet(#[from] AlphabetError),

    #[error("Feature '{feature}' is undefined for {sequence}: {reason}")]
    FeatureUndefined {
        feature: String,
        sequence: String,
        reason: String,
    },

    #[error("Feature '{feature}' cache is inconsistent: {reason}")]
    CacheInconsistency { feature: String, reason: String },

    #[error("Search did not converge within budget ({iterations} rounds, {elapsed:?})")]
    ConvergenceTimeout {
        iterations: usize,
        elapsed: Duration,
    },

    #[error("Every candidate in round {iteration} has an undefined feature")]
    AllCandidatesUndefined { iteration: usize },

    #[error("Feature evaluation failed: {0}")]
    Feature(FeatureError),

    #[error("Distance setup failed: {0}")]
    Distance(#[from] DistanceError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Attaches the offending sequence to an undefined-feature failure.
    pub fn from_feature(error: FeatureError, sequence: &str) -> Self {
        match error {
            FeatureError::Undefined { feature, reason } => Self::FeatureUndefined {
                feature,
                sequence: sequence.to_string(),
                reason,
            },
            other => other.into(),
        }
    }
}

impl From<FeatureError> for EngineError {
    fn from(error: FeatureError) -> Self {
        match error {
            FeatureError::Undefined { feature, reason } => Self::FeatureUndefined {
                feature,
                sequence: String::new(),
                reason,
            },
            FeatureError::CacheInconsistency { feature, reason } => {
                Self::CacheInconsistency { feature, reason }
            }
            other @ FeatureError::NoConvergence { .. } => Self::Feature(other),
        }
    }
}

impl From<MutationError> for EngineError {
    fn from(error: MutationError) -> Self {
        Self::Internal(format!("invalid candidate mutation: {error}"))
    }
}
