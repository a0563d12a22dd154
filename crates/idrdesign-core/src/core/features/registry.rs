use super::config::{FeatureConfig, FeatureConfigError};
use super::{Feature, FeatureError, FeatureInput, FeatureVector};
use crate::core::extended::{ExtendedSequence, SeqRepr};
use crate::core::sequence::{PointMutation, Sequence};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Feature '{0}' is already registered")]
    Duplicate(String),
    #[error("Invalid feature configuration: {0}")]
    Config(#[from] FeatureConfigError),
}

/// An ordered, named set of features. The registration order fixes both the
/// memo slot of each feature and its position in every [`FeatureVector`].
#[derive(Default)]
pub struct FeatureRegistry {
    names: Vec<String>,
    features: Vec<Box<dyn Feature>>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("names", &self.names)
            .finish()
    }
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FeatureConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, feature) in config.build()? {
            registry.register_boxed(name, feature)?;
        }
        Ok(registry)
    }

    pub fn register<F>(&mut self, name: impl Into<String>, feature: F) -> Result<(), RegistryError>
    where
        F: Feature + 'static,
    {
        self.register_boxed(name, Box::new(feature))
    }

    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        feature: Box<dyn Feature>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.features.push(feature);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// A fresh cache for `sequence` with one empty slot per feature.
    pub fn extend(&self, sequence: Sequence) -> ExtendedSequence {
        ExtendedSequence::new(sequence, self.len())
    }

    fn compute_slot(
        &self,
        slot: usize,
        target: &ExtendedSequence,
        predecessor: Option<(&ExtendedSequence, PointMutation)>,
    ) -> Result<f64, FeatureError> {
        let name = self.names[slot].as_str();
        let input = FeatureInput::new(name, slot, target, predecessor);
        let value = self.features[slot].compute(&input)?;
        if !value.is_finite() {
            return Err(input.undefined(format!("non-finite value {value}")));
        }
        trace!(feature = name, sequence = %target.sequence(), value, "Computed feature");
        Ok(value)
    }

    fn check_slots(&self, sequence: &ExtendedSequence) -> Result<(), FeatureError> {
        if sequence.slots() == self.len() {
            Ok(())
        } else {
            Err(FeatureError::CacheInconsistency {
                feature: "<registry>".to_string(),
                reason: format!(
                    "sequence has {} feature slots, registry has {}",
                    sequence.slots(),
                    self.len()
                ),
            })
        }
    }

    /// Materializes `repr` and fills every memo slot, updating from the
    /// predecessor when `repr` carries a mutation.
    pub fn evaluate(&self, repr: &SeqRepr<'_>) -> Result<ExtendedSequence, FeatureError> {
        self.check_slots(repr.inner)?;
        let mut next = repr.derive();
        let predecessor = repr.mutation.map(|m| (repr.inner, m));
        for slot in 0..self.len() {
            if next.cached(slot).is_none() {
                let value = self.compute_slot(slot, &next, predecessor)?;
                next.store(slot, value);
            }
        }
        Ok(next)
    }

    /// Fills every empty memo slot from scratch.
    pub fn fill(&self, sequence: &mut ExtendedSequence) -> Result<(), FeatureError> {
        self.check_slots(sequence)?;
        for slot in 0..self.len() {
            if sequence.cached(slot).is_none() {
                let value = self.compute_slot(slot, sequence, None)?;
                sequence.store(slot, value);
            }
        }
        Ok(())
    }

    pub fn evaluate_all(&self, sequence: &Sequence) -> Result<FeatureVector, FeatureError> {
        let mut extended = self.extend(sequence.clone());
        self.fill(&mut extended)?;
        extended
            .feature_vector()
            .ok_or_else(|| FeatureError::CacheInconsistency {
                feature: "<registry>".to_string(),
                reason: format!("memo of {sequence} is incomplete after evaluation"),
            })
    }

    /// Like [`Self::evaluate_all`], but undefined features become `None`.
    /// Any other failure still propagates.
    pub fn evaluate_all_skip_failures(
        &self,
        sequence: &Sequence,
    ) -> Result<Vec<Option<f64>>, FeatureError> {
        let extended = self.extend(sequence.clone());
        (0..self.len())
            .map(|slot| match self.compute_slot(slot, &extended, None) {
                Ok(v) => Ok(Some(v)),
                Err(e) if e.is_undefined() => Ok(None),
                Err(e) => Err(e),
            })
            .collect()
    }

    pub fn evaluate_many(
        &self,
        sequences: &[Sequence],
    ) -> Result<HashMap<Sequence, FeatureVector>, FeatureError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = sequences.iter();

        #[cfg(feature = "parallel")]
        let iterator = sequences.par_iter();

        iterator
            .map(|s| self.evaluate_all(s).map(|v| (s.clone(), v)))
            .collect()
    }

    pub fn evaluate_many_skip_failures(
        &self,
        sequences: &[Sequence],
    ) -> Result<HashMap<Sequence, Vec<Option<f64>>>, FeatureError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = sequences.iter();

        #[cfg(feature = "parallel")]
        let iterator = sequences.par_iter();

        iterator
            .map(|s| self.evaluate_all_skip_failures(s).map(|v| (s.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::AminoAcid;
    use crate::core::features::charge::Scd;
    use crate::core::features::composition::{Fcr, Pattern, PatternScore};
    use crate::core::features::feature_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn seq(s: &str) -> Sequence {
        Sequence::new(s).unwrap()
    }

    fn small_registry() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        registry.register("scd", Scd).unwrap();
        registry.register("fcr", Fcr).unwrap();
        registry
            .register("frac_k", PatternScore::count(Pattern::new("K").unwrap(), true))
            .unwrap();
        registry
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = small_registry();
        let err = registry.register("fcr", Fcr).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "fcr"));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.position("frac_k"), Some(2));
    }

    #[test]
    fn from_config_registers_default_features_in_order() {
        let config = FeatureConfig::default();
        let registry = FeatureRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), config.len());
        assert_eq!(registry.names()[0], "isoelectric_point");
    }

    #[test]
    fn evaluate_all_returns_values_in_registry_order() {
        let registry = small_registry();
        let values = registry.evaluate_all(&seq("KKAE")).unwrap();
        assert_eq!(values.len(), 3);
        assert!((values[1] - 0.75).abs() < 1e-12);
        assert!((values[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn evaluate_all_fails_on_undefined_and_skip_failures_yields_none() {
        let registry = small_registry();
        let err = registry.evaluate_all(&seq("")).unwrap_err();
        assert!(err.is_undefined());
        let values = registry.evaluate_all_skip_failures(&seq("")).unwrap();
        assert_eq!(values, vec![None, None, None]);
    }

    #[test]
    fn non_finite_values_are_undefined() {
        let mut registry = FeatureRegistry::new();
        registry
            .register("nan", feature_fn(|_| Ok(f64::NAN)))
            .unwrap();
        let err = registry.evaluate_all(&seq("AK")).unwrap_err();
        assert!(matches!(err, FeatureError::Undefined { feature, .. } if feature == "nan"));
    }

    #[test]
    fn evaluate_with_mutation_matches_full_evaluation() {
        let registry = FeatureRegistry::from_config(&FeatureConfig::default()).unwrap();
        let mut base = registry.extend(seq("MKRTAEDPPSGKE"));
        registry.fill(&mut base).unwrap();
        let m = PointMutation::new(base.sequence(), 4, AminoAcid::Asp).unwrap();
        let next = registry.evaluate(&SeqRepr::mutated(&base, m)).unwrap();
        let expected = registry.evaluate_all(&seq("MKRTDEDPPSGKE")).unwrap();
        for (a, b) in next.feature_vector().unwrap().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-8, "{a} vs {b}");
        }
    }

    #[test]
    fn evaluate_identity_reuses_filled_memo() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = FeatureRegistry::new();
        registry
            .register(
                "len",
                feature_fn(move |input| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(input.target.len() as f64)
                }),
            )
            .unwrap();
        let mut base = registry.extend(seq("AKE"));
        registry.fill(&mut base).unwrap();
        let again = registry.evaluate(&SeqRepr::identity(&base)).unwrap();
        assert_eq!(again.cached(0), Some(3.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn evaluate_rejects_sequences_from_another_registry() {
        let registry = small_registry();
        let foreign = ExtendedSequence::new(seq("AK"), 1);
        let err = registry.evaluate(&SeqRepr::identity(&foreign)).unwrap_err();
        assert!(matches!(err, FeatureError::CacheInconsistency { .. }));
    }

    #[test]
    fn evaluate_many_maps_each_sequence() {
        let registry = small_registry();
        let seqs = vec![seq("KKAE"), seq("AAAA")];
        let table = registry.evaluate_many(&seqs).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[&seqs[1]][1], 0.0);
        let partial = registry
            .evaluate_many_skip_failures(&[seq("AAAA"), seq("")])
            .unwrap();
        assert_eq!(partial[&seq("")], vec![None, None, None]);
    }
}
