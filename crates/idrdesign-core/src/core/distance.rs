use super::features::{FeatureError, FeatureRegistry, FeatureVector};
use super::sequence::Sequence;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("Variance for feature '{feature}' must be finite and positive, got {value}")]
    InvalidVariance { feature: String, value: f64 },
    #[error("Feature '{0}' appears more than once in the variance table")]
    DuplicateFeature(String),
    #[error("No reference variance for feature '{0}'")]
    MissingFeature(String),
    #[error("Feature '{feature}' is defined for only {defined} reference sequences (need at least 2)")]
    InsufficientData { feature: String, defined: usize },
    #[error("Feature evaluation failed: {0}")]
    Feature(#[from] FeatureError),
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

#[derive(Debug, Serialize, Deserialize)]
struct VarianceRecord {
    feature: String,
    variance: f64,
}

/// Per-feature reference variances, keyed by feature name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceVariance {
    entries: Vec<(String, f64)>,
}

impl ReferenceVariance {
    pub fn new(entries: Vec<(String, f64)>) -> Result<Self, DistanceError> {
        let mut seen = HashSet::new();
        for (feature, value) in &entries {
            if !value.is_finite() || *value <= 0.0 {
                return Err(DistanceError::InvalidVariance {
                    feature: feature.clone(),
                    value: *value,
                });
            }
            if !seen.insert(feature.as_str()) {
                return Err(DistanceError::DuplicateFeature(feature.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == feature)
            .map(|&(_, v)| v)
    }

    /// Variances reordered to match the registry's feature order.
    pub fn aligned_to(&self, registry: &FeatureRegistry) -> Result<Vec<f64>, DistanceError> {
        registry
            .names()
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| DistanceError::MissingFeature(name.clone()))
            })
            .collect()
    }

    /// Sample variance (n - 1) of every registered feature over `corpus`.
    ///
    /// Sequences are deduplicated first, keeping corpus order. A feature
    /// contributes only the sequences on which it is defined.
    pub fn estimate(registry: &FeatureRegistry, corpus: &[Sequence]) -> Result<Self, DistanceError> {
        let unique: Vec<&Sequence> = corpus.iter().unique().collect();
        info!(
            sequences = corpus.len(),
            unique = unique.len(),
            features = registry.len(),
            "Estimating reference variances"
        );

        #[cfg(not(feature = "parallel"))]
        let iterator = unique.iter();

        #[cfg(feature = "parallel")]
        let iterator = unique.par_iter();

        let rows = iterator
            .map(|sequence| registry.evaluate_all_skip_failures(sequence))
            .collect::<Result<Vec<_>, FeatureError>>()?;

        let mut entries = Vec::with_capacity(registry.len());
        for (slot, name) in registry.names().iter().enumerate() {
            let values: Vec<f64> = rows.iter().filter_map(|row| row[slot]).collect();
            if values.len() < 2 {
                return Err(DistanceError::InsufficientData {
                    feature: name.clone(),
                    defined: values.len(),
                });
            }
            let variance = values.iter().variance();
            debug!(feature = %name, defined = values.len(), variance, "Estimated variance");
            entries.push((name.clone(), variance));
        }
        Self::new(entries)
    }

    pub fn read_csv(path: &Path) -> Result<Self, DistanceError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| DistanceError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let mut entries = Vec::new();
        for result in reader.deserialize::<VarianceRecord>() {
            let record = result.map_err(|e| DistanceError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            entries.push((record.feature, record.variance));
        }
        Self::new(entries)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), DistanceError> {
        let csv_err = |e| DistanceError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        for (feature, variance) in &self.entries {
            writer
                .serialize(VarianceRecord {
                    feature: feature.clone(),
                    variance: *variance,
                })
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|e| DistanceError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

/// Diagonal, variance-normalised squared distance between feature vectors.
#[derive(Debug, Clone)]
pub struct DistanceCalculator {
    variances: Vec<f64>,
}

impl DistanceCalculator {
    pub fn new(registry: &FeatureRegistry, reference: &ReferenceVariance) -> Result<Self, DistanceError> {
        Ok(Self {
            variances: reference.aligned_to(registry)?,
        })
    }

    /// `sum_i (a_i - b_i)^2 / var_i`.
    pub fn sqr_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), self.variances.len());
        debug_assert_eq!(b.len(), self.variances.len());
        a.iter()
            .zip(b)
            .zip(&self.variances)
            .map(|((x, y), var)| (x - y) * (x - y) / var)
            .sum()
    }

    pub fn sqr_distance_many_to_one(&self, vectors: &[FeatureVector], target: &[f64]) -> Vec<f64> {
        vectors
            .iter()
            .map(|v| self.sqr_distance(v, target))
            .collect()
    }
}
