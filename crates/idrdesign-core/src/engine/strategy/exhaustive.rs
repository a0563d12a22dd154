use super::{Candidate, Proposal, SearchStrategy};
use crate::core::alphabet::ALPHABET;
use crate::core::sequence::PointMutation;
use crate::engine::error::EngineError;
use crate::engine::rng::SearchRng;
use crate::engine::scoring::Scorer;
use crate::engine::state::SearchState;
use tracing::trace;

/// Every single-residue substitution of the current sequence, position-major
/// then in alphabet order, after the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl SearchStrategy for Exhaustive {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn propose_round(
        &self,
        state: &SearchState,
        _scorer: &Scorer<'_>,
        _rng: &mut SearchRng,
    ) -> Result<Proposal, EngineError> {
        let sequence = state.sequence();
        let mut candidates = Vec::with_capacity(sequence.len() * (ALPHABET.len() - 1) + 1);
        candidates.push(Candidate::identity());
        for (position, &current) in sequence.residues().iter().enumerate() {
            for to in ALPHABET.into_iter().filter(|&aa| aa != current) {
                candidates.push(Candidate::from_current(PointMutation::new(
                    sequence, position, to,
                )?));
            }
        }
        trace!(count = candidates.len(), "Proposed exhaustive round");
        Ok(candidates.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::test_support::Fixture;
    use crate::engine::strategy::Parent;
    use std::collections::HashSet;

    #[test]
    fn proposes_identity_then_every_single_substitution() {
        let fixture = Fixture::fraction_k_and_e();
        let state = fixture.state("KRTAE");
        let mut rng = fixture.rng();
        let candidates = Exhaustive
            .propose_round(&state, &fixture.scorer(), &mut rng)
            .unwrap()
            .candidates;
        assert_eq!(candidates.len(), 5 * 19 + 1);
        assert_eq!(candidates[0], Candidate::identity());
        assert!(candidates.iter().all(|c| c.parent == Parent::Current));

        let distinct: HashSet<String> = candidates[1..]
            .iter()
            .map(|c| state.sequence().apply(&c.mutation.unwrap()).to_string())
            .collect();
        assert_eq!(distinct.len(), 5 * 19);
        assert!(!distinct.contains("KRTAE"));
    }

    #[test]
    fn orders_candidates_by_position_then_alphabet() {
        let fixture = Fixture::fraction_k_and_e();
        let state = fixture.state("AA");
        let mut rng = fixture.rng();
        let candidates = Exhaustive
            .propose_round(&state, &fixture.scorer(), &mut rng)
            .unwrap()
            .candidates;
        let rendered: Vec<String> = candidates[1..4]
            .iter()
            .map(|c| state.sequence().apply(&c.mutation.unwrap()).to_string())
            .collect();
        assert_eq!(rendered, vec!["CA", "DA", "EA"]);
        let last = candidates.last().unwrap().mutation.unwrap();
        assert_eq!(last.position(), 1);
        assert_eq!(last.to().to_char(), 'Y');
    }

    #[test]
    fn empty_sequence_yields_only_identity() {
        let fixture = Fixture::fraction_k_and_e();
        let state = fixture.unchecked_state("");
        let mut rng = fixture.rng();
        let candidates = Exhaustive
            .propose_round(&state, &fixture.scorer(), &mut rng)
            .unwrap()
            .candidates;
        assert_eq!(candidates, vec![Candidate::identity()]);
    }
}
