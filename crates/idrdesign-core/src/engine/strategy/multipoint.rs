use super::{Candidate, Parent, Proposal, SearchStrategy};
use crate::core::alphabet::{ALPHABET, AminoAcid};
use crate::core::extended::SeqRepr;
use crate::core::sequence::PointMutation;
use crate::engine::config::{ConfigError, MAX_RETAINED_MOVES};
use crate::engine::error::EngineError;
use crate::engine::rng::SearchRng;
use crate::engine::scoring::{Scored, Scorer};
use crate::engine::state::SearchState;
use itertools::iproduct;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

/// Samples single substitutions in random order until `good_quota` improving
/// moves with a step above `precision` are found, keeps up to
/// `marginal_quota` improving moves below it, then proposes every combination
/// of the retained moves. The one-point candidates carry the scores computed
/// while sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomMultiPoint {
    good_quota: usize,
    marginal_quota: usize,
    precision: f64,
}

impl RandomMultiPoint {
    pub fn new(good_quota: usize, marginal_quota: usize, precision: f64) -> Self {
        Self {
            good_quota,
            marginal_quota,
            precision,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Move {
    position: usize,
    to: AminoAcid,
    distance: f64,
    /// Index of the move's score in the round's samples.
    sample: usize,
}

/// Good and marginal moves, at most one per position across both pools.
#[derive(Debug)]
struct MovePools {
    good: Vec<Move>,
    marginal: Vec<Move>,
    marginal_quota: usize,
}

impl MovePools {
    fn new(marginal_quota: usize) -> Self {
        Self {
            good: Vec::new(),
            marginal: Vec::new(),
            marginal_quota,
        }
    }

    fn offer_good(&mut self, candidate: Move) {
        if let Some(held) = self.good.iter_mut().find(|m| m.position == candidate.position) {
            if candidate.distance < held.distance {
                *held = candidate;
            }
            return;
        }
        self.marginal.retain(|m| m.position != candidate.position);
        self.good.push(candidate);
    }

    fn offer_marginal(&mut self, candidate: Move) {
        if self.good.iter().any(|m| m.position == candidate.position) {
            return;
        }
        if let Some(held) = self
            .marginal
            .iter_mut()
            .find(|m| m.position == candidate.position)
        {
            if candidate.distance < held.distance {
                *held = candidate;
            }
            return;
        }
        if self.marginal.len() < self.marginal_quota {
            self.marginal.push(candidate);
        }
    }

    fn retained(&self) -> impl Iterator<Item = &Move> {
        self.good.iter().chain(&self.marginal)
    }
}

impl SearchStrategy for RandomMultiPoint {
    fn name(&self) -> &'static str {
        "multipoint"
    }

    fn propose_round(
        &self,
        state: &SearchState,
        scorer: &Scorer<'_>,
        rng: &mut SearchRng,
    ) -> Result<Proposal, EngineError> {
        let sequence = state.sequence();
        let residues = sequence.residues();
        let mut moves: Vec<(usize, AminoAcid)> = iproduct!(0..residues.len(), ALPHABET)
            .filter(|&(position, aa)| residues[position] != aa)
            .collect();
        moves.shuffle(rng);

        let mut pools = MovePools::new(self.marginal_quota);
        let mut samples: Vec<Option<Scored>> = Vec::new();
        let mut examined = 0usize;
        for (position, to) in moves {
            if pools.good.len() >= self.good_quota {
                break;
            }
            examined += 1;
            let mutation = PointMutation::new(sequence, position, to)?;
            let Some(scored) = scorer.score_repr(&SeqRepr::mutated(state.current(), mutation))?
            else {
                trace!(%mutation, "Skipping undefined move");
                continue;
            };
            if scored.distance >= state.distance() {
                continue;
            }
            let step = scorer.distance_between(&scored.features()?, state.features());
            let sampled = Move {
                position,
                to,
                distance: scored.distance,
                sample: samples.len(),
            };
            samples.push(Some(scored));
            if step > self.precision {
                pools.offer_good(sampled);
            } else {
                pools.offer_marginal(sampled);
            }
        }
        debug!(
            examined,
            good = pools.good.len(),
            marginal = pools.marginal.len(),
            "Sampled single-point moves"
        );

        let retained = pools.good.len() + pools.marginal.len();
        if retained > MAX_RETAINED_MOVES {
            return Err(ConfigError::InvalidParameter {
                name: "marginal_quota",
                reason: format!(
                    "{retained} retained moves exceed the limit of {MAX_RETAINED_MOVES}"
                ),
            }
            .into());
        }

        let mut proposal = Proposal::from(vec![Candidate::identity()]);
        for m in pools.retained() {
            let mutation = PointMutation::new(sequence, m.position, m.to)?;
            let existing = proposal.candidates.len();
            if let Some(scored) = samples.get_mut(m.sample).and_then(Option::take) {
                proposal.scored.push((existing, scored));
            }
            for j in 0..existing {
                proposal.candidates.push(Candidate {
                    parent: if j == 0 {
                        Parent::Current
                    } else {
                        Parent::Candidate(j)
                    },
                    mutation: Some(mutation),
                });
            }
        }
        Ok(proposal)
    }
}
