use crate::core::extended::ExtendedSequence;
use crate::core::features::FeatureVector;
use crate::core::sequence::Sequence;
use std::time::Duration;

/// The driver's view of one search: the adopted sequence with a filled memo,
/// its distance to the target, and round bookkeeping.
#[derive(Debug, Clone)]
pub struct SearchState {
    current: ExtendedSequence,
    features: FeatureVector,
    distance: f64,
    iteration: usize,
    step_size: f64,
}

impl SearchState {
    /// `current` must have every memo slot filled.
    pub(crate) fn new(current: ExtendedSequence, distance: f64, step_size: f64) -> Option<Self> {
        let features = current.feature_vector()?;
        Some(Self {
            current,
            features,
            distance,
            iteration: 0,
            step_size,
        })
    }

    pub fn current(&self) -> &ExtendedSequence {
        &self.current
    }

    pub fn sequence(&self) -> &Sequence {
        self.current.sequence()
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Replaces the current sequence with the round's selection and advances
    /// the round counter.
    pub(crate) fn adopt(&mut self, next: ExtendedSequence, distance: f64, step_size: f64) -> bool {
        let Some(features) = next.feature_vector() else {
            return false;
        };
        self.current = next;
        self.features = features;
        self.distance = distance;
        self.step_size = step_size;
        self.iteration += 1;
        true
    }
}

/// Result of one completed search.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignOutcome {
    pub start: Sequence,
    pub sequence: Sequence,
    pub features: FeatureVector,
    pub distance: f64,
    pub iterations: usize,
    pub elapsed: Duration,
    /// Distance to target after each round, starting with the start's distance.
    pub trajectory: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(s: &str, value: f64) -> ExtendedSequence {
        let mut e = ExtendedSequence::new(Sequence::new(s).unwrap(), 1);
        e.store(0, value);
        e
    }

    #[test]
    fn new_requires_a_filled_memo() {
        let empty = ExtendedSequence::new(Sequence::new("AK").unwrap(), 1);
        assert!(SearchState::new(empty, 1.0, 2.0).is_none());
        let state = SearchState::new(filled("AK", 0.5), 1.0, 2.0).unwrap();
        assert_eq!(state.features(), &[0.5]);
        assert_eq!(state.iteration(), 0);
    }

    #[test]
    fn adopt_replaces_current_and_counts_rounds() {
        let mut state = SearchState::new(filled("AK", 0.5), 1.0, 2.0).unwrap();
        assert!(state.adopt(filled("EK", 0.7), 0.25, 0.04));
        assert_eq!(state.sequence().as_str(), "EK");
        assert_eq!(state.features(), &[0.7]);
        assert_eq!(state.distance(), 0.25);
        assert_eq!(state.step_size(), 0.04);
        assert_eq!(state.iteration(), 1);
    }
}
