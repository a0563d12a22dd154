//! Sequence features: the [`Feature`] abstraction, the [`registry::FeatureRegistry`]
//! that evaluates them against an [`ExtendedSequence`], the builtin formulas and
//! their TOML configuration.

pub mod charge;
pub mod composition;
pub mod config;
pub mod patterning;
pub mod registry;

use super::extended::ExtendedSequence;
use super::sequence::PointMutation;
use thiserror::Error;

pub use config::{FeatureConfig, FeatureConfigError};
pub use registry::{FeatureRegistry, RegistryError};

/// Feature values in registry order.
pub type FeatureVector = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Feature '{feature}' is undefined: {reason}")]
    Undefined { feature: String, reason: String },

    #[error("Feature '{feature}' has an inconsistent cache: {reason}")]
    CacheInconsistency { feature: String, reason: String },

    #[error("Feature '{feature}' did not converge within {iterations} iterations")]
    NoConvergence { feature: String, iterations: usize },
}

impl FeatureError {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined { .. })
    }
}

/// The predecessor of the sequence being evaluated: one point mutation away,
/// with its own memo already filled.
#[derive(Debug, Clone, Copy)]
pub struct Previous<'a> {
    pub sequence: &'a ExtendedSequence,
    pub mutation: PointMutation,
    slot: usize,
    name: &'a str,
}

impl<'a> Previous<'a> {
    /// The predecessor's cached value for the feature being computed.
    pub fn cached_value(&self) -> Result<f64, FeatureError> {
        self.sequence
            .cached(self.slot)
            .ok_or_else(|| FeatureError::CacheInconsistency {
                feature: self.name.to_string(),
                reason: format!(
                    "predecessor {} has no cached value",
                    self.sequence.sequence()
                ),
            })
    }
}

pub struct FeatureInput<'a> {
    pub name: &'a str,
    pub target: &'a ExtendedSequence,
    pub previous: Option<Previous<'a>>,
}

impl<'a> FeatureInput<'a> {
    pub(crate) fn new(
        name: &'a str,
        slot: usize,
        target: &'a ExtendedSequence,
        predecessor: Option<(&'a ExtendedSequence, PointMutation)>,
    ) -> Self {
        Self {
            name,
            target,
            previous: predecessor.map(|(sequence, mutation)| Previous {
                sequence,
                mutation,
                slot,
                name,
            }),
        }
    }

    pub fn undefined(&self, reason: impl Into<String>) -> FeatureError {
        FeatureError::Undefined {
            feature: self.name.to_string(),
            reason: reason.into(),
        }
    }

    /// Sequence length as a divisor, or `Undefined` for an empty sequence.
    pub fn nonempty_len(&self) -> Result<f64, FeatureError> {
        if self.target.is_empty() {
            Err(self.undefined("empty sequence"))
        } else {
            Ok(self.target.len() as f64)
        }
    }
}

/// A scalar function of a sequence.
///
/// Implementations may use `input.previous` to update the predecessor's value
/// instead of recomputing; the result must match a full computation.
pub trait Feature: Send + Sync {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError>;
}

impl<F> Feature for F
where
    F: Fn(&FeatureInput<'_>) -> Result<f64, FeatureError> + Send + Sync,
{
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        self(input)
    }
}

/// Pins a closure to the [`Feature`] call signature so its argument lifetimes
/// are inferred as higher-ranked.
pub fn feature_fn<F>(f: F) -> F
where
    F: Fn(&FeatureInput<'_>) -> Result<f64, FeatureError> + Send + Sync,
{
    f
}
