use super::error::EngineError;
use super::state::SearchState;
use super::strategy::{Candidate, Parent, Proposal};
use crate::core::distance::DistanceCalculator;
use crate::core::extended::{ExtendedSequence, SeqRepr};
use crate::core::features::{FeatureError, FeatureRegistry};
use crate::core::sequence::Sequence;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A candidate with a fully defined feature vector.
#[derive(Debug, Clone)]
pub struct Scored {
    pub sequence: ExtendedSequence,
    pub distance: f64,
}

impl Scored {
    pub fn features(&self) -> Result<Vec<f64>, EngineError> {
        self.sequence.feature_vector().ok_or_else(|| {
            EngineError::Internal(format!(
                "scored sequence {} has an incomplete memo",
                self.sequence.sequence()
            ))
        })
    }
}

/// Evaluates sequences against a fixed target feature vector.
#[derive(Clone, Copy)]
pub struct Scorer<'a> {
    registry: &'a FeatureRegistry,
    distance: &'a DistanceCalculator,
    target: &'a [f64],
}

/// Only an undefined feature removes a candidate; every other failure aborts.
fn skip_undefined(result: Result<ExtendedSequence, FeatureError>) -> Result<Option<ExtendedSequence>, EngineError> {
    match result {
        Ok(sequence) => Ok(Some(sequence)),
        Err(e) if e.is_undefined() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl<'a> Scorer<'a> {
    pub fn new(registry: &'a FeatureRegistry, distance: &'a DistanceCalculator, target: &'a [f64]) -> Self {
        Self {
            registry,
            distance,
            target,
        }
    }

    /// Distance from `features` to the target.
    pub fn distance_to_target(&self, features: &[f64]) -> f64 {
        self.distance.sqr_distance(features, self.target)
    }

    /// Distance between two feature vectors under the same metric.
    pub fn distance_between(&self, a: &[f64], b: &[f64]) -> f64 {
        self.distance.sqr_distance(a, b)
    }

    fn finish(&self, sequence: Option<ExtendedSequence>) -> Option<Scored> {
        let sequence = sequence?;
        let features = sequence.feature_vector()?;
        let distance = self.distance_to_target(&features);
        Some(Scored { sequence, distance })
    }

    /// Scores a derivation of an already evaluated sequence. `None` means some
    /// feature is undefined for the result.
    pub fn score_repr(&self, repr: &SeqRepr<'_>) -> Result<Option<Scored>, EngineError> {
        let evaluated = skip_undefined(self.registry.evaluate(repr))?;
        Ok(self.finish(evaluated))
    }

    /// Scores a sequence from scratch.
    pub fn score_full(&self, sequence: &Sequence) -> Result<Option<Scored>, EngineError> {
        let mut extended = self.registry.extend(sequence.clone());
        let filled = skip_undefined(self.registry.fill(&mut extended).map(|_| extended))?;
        Ok(self.finish(filled))
    }

    /// Scores every candidate of a round. Scores the strategy already holds
    /// are taken as given. The rest are processed in waves by derivation depth
    /// so each one can update from its evaluated parent; a candidate whose
    /// parent is undefined is recomputed from scratch.
    pub fn score_round(
        &self,
        state: &SearchState,
        proposal: Proposal,
    ) -> Result<Vec<Option<Scored>>, EngineError> {
        let Proposal { candidates, scored } = proposal;
        let candidates = candidates.as_slice();
        let depths = derivation_depths(candidates)?;
        let max_depth = depths.iter().copied().max().unwrap_or(0);
        let mut results: Vec<Option<Scored>> = vec![None; candidates.len()];
        for (index, known) in scored {
            let slot = results.get_mut(index).ok_or_else(|| {
                EngineError::Internal(format!(
                    "pre-scored candidate {index} is out of range for {} candidates",
                    candidates.len()
                ))
            })?;
            *slot = Some(known);
        }
        let reused = results.iter().filter(|r| r.is_some()).count();
        if reused > 0 {
            trace!(reused, "Reusing candidate scores from the strategy");
        }

        for depth in 1..=max_depth {
            let wave: Vec<usize> = (0..candidates.len())
                .filter(|&i| depths[i] == depth && results[i].is_none())
                .collect();

            #[cfg(not(feature = "parallel"))]
            let iterator = wave.iter();

            #[cfg(feature = "parallel")]
            let iterator = wave.par_iter();

            let scored = iterator
                .map(|&i| {
                    self.score_candidate(state, candidates, &results, i)
                        .map(|s| (i, s))
                })
                .collect::<Result<Vec<_>, EngineError>>()?;

            trace!(depth, size = scored.len(), "Scored candidate wave");
            for (i, s) in scored {
                results[i] = s;
            }
        }
        Ok(results)
    }

    fn score_candidate(
        &self,
        state: &SearchState,
        candidates: &[Candidate],
        results: &[Option<Scored>],
        index: usize,
    ) -> Result<Option<Scored>, EngineError> {
        let candidate = &candidates[index];
        let parent = match candidate.parent {
            Parent::Current if candidate.mutation.is_none() => {
                return Ok(Some(Scored {
                    sequence: state.current().clone(),
                    distance: state.distance(),
                }));
            }
            Parent::Current => Some(state.current()),
            Parent::Candidate(j) => results[j].as_ref().map(|s| &s.sequence),
        };
        match parent {
            Some(inner) => self.score_repr(&SeqRepr {
                inner,
                mutation: candidate.mutation,
            }),
            None => self.score_full(&materialize(state, candidates, index)),
        }
    }
}

/// Depth 1 for candidates derived from the current sequence, parent depth + 1
/// otherwise. Parents must precede their children.
fn derivation_depths(candidates: &[Candidate]) -> Result<Vec<usize>, EngineError> {
    let mut depths = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let depth = match candidate.parent {
            Parent::Current => 1,
            Parent::Candidate(j) if j < i => depths[j] + 1,
            Parent::Candidate(j) => {
                return Err(EngineError::Internal(format!(
                    "candidate {i} names a later candidate {j} as its parent"
                )));
            }
        };
        depths.push(depth);
    }
    Ok(depths)
}

/// The sequence a candidate denotes, rebuilt by replaying its mutation chain
/// on the current sequence.
fn materialize(state: &SearchState, candidates: &[Candidate], index: usize) -> Sequence {
    let mut chain = Vec::new();
    let mut cursor = Some(index);
    while let Some(i) = cursor {
        let candidate = &candidates[i];
        if let Some(m) = candidate.mutation {
            chain.push(m);
        }
        cursor = match candidate.parent {
            Parent::Current => None,
            Parent::Candidate(j) => Some(j),
        };
    }
    chain
        .iter()
        .rev()
        .fold(state.sequence().clone(), |seq, m| seq.apply(m))
}

/// Index of the minimum-distance candidate; the earliest wins ties.
pub fn select_best(scored: &[Option<Scored>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in scored.iter().enumerate() {
        if let Some(s) = s {
            if best.is_none_or(|(_, d)| s.distance < d) {
                best = Some((i, s.distance));
            }
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::distance::ReferenceVariance;
    use crate::core::features::composition::{Pattern, PatternScore};
    use crate::engine::rng::SearchRng;
    use rand::SeedableRng;

    pub struct Fixture {
        pub registry: FeatureRegistry,
        pub distance: DistanceCalculator,
        pub target: Vec<f64>,
    }

    impl Fixture {
        pub fn new(registry: FeatureRegistry, target: &str) -> Self {
            Self::with_variance(registry, target, 1.0)
        }

        /// Every feature gets the same reference variance.
        pub fn with_variance(registry: FeatureRegistry, target: &str, variance: f64) -> Self {
            let reference = ReferenceVariance::new(
                registry.names().iter().map(|n| (n.clone(), variance)).collect(),
            )
            .unwrap();
            let distance = DistanceCalculator::new(&registry, &reference).unwrap();
            let target = registry
                .evaluate_all(&Sequence::new(target).unwrap())
                .unwrap();
            Self {
                registry,
                distance,
                target,
            }
        }

        /// Average K and E counts with unit variances, targeting KRTAE.
        pub fn fraction_k_and_e() -> Self {
            let mut registry = FeatureRegistry::new();
            registry
                .register("frac_k", PatternScore::count(Pattern::new("K").unwrap(), true))
                .unwrap();
            registry
                .register("frac_e", PatternScore::count(Pattern::new("E").unwrap(), true))
                .unwrap();
            Self::new(registry, "KRTAE")
        }

        pub fn scorer(&self) -> Scorer<'_> {
            Scorer::new(&self.registry, &self.distance, &self.target)
        }

        pub fn state(&self, s: &str) -> SearchState {
            let mut e = self.registry.extend(Sequence::new(s).unwrap());
            self.registry.fill(&mut e).unwrap();
            let distance = self.scorer().distance_to_target(&e.feature_vector().unwrap());
            SearchState::new(e, distance, f64::INFINITY).unwrap()
        }

        /// A state whose memo is zero-filled without evaluation.
        pub fn unchecked_state(&self, s: &str) -> SearchState {
            let mut e = self.registry.extend(Sequence::new(s).unwrap());
            for slot in 0..self.registry.len() {
                e.store(slot, 0.0);
            }
            let distance = self.scorer().distance_to_target(&e.feature_vector().unwrap());
            SearchState::new(e, distance, f64::INFINITY).unwrap()
        }

        pub fn rng(&self) -> SearchRng {
            SearchRng::seed_from_u64(42)
        }
    }
}
