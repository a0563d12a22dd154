//! Candidate generation for one search round.
//!
//! A strategy returns [`Candidate`] derivations that the [`Scorer`] evaluates
//! in dependency order, together with any candidate scores it already
//! computed while choosing them.

pub mod exhaustive;
pub mod multipoint;

use super::config::StrategyConfig;
use super::error::EngineError;
use super::rng::SearchRng;
use super::scoring::{Scored, Scorer};
use super::state::SearchState;
use crate::core::sequence::PointMutation;

pub use exhaustive::Exhaustive;
pub use multipoint::RandomMultiPoint;

/// What a candidate is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// The search's current sequence.
    Current,
    /// An earlier candidate of the same round, by index.
    Candidate(usize),
}

/// One round candidate: its parent plus at most one further substitution.
/// Without a mutation the candidate equals its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub parent: Parent,
    pub mutation: Option<PointMutation>,
}

impl Candidate {
    pub fn identity() -> Self {
        Self {
            parent: Parent::Current,
            mutation: None,
        }
    }

    pub fn from_current(mutation: PointMutation) -> Self {
        Self {
            parent: Parent::Current,
            mutation: Some(mutation),
        }
    }
}

/// The candidates of one round.
#[derive(Debug, Clone, Default)]
pub struct Proposal {
    pub candidates: Vec<Candidate>,
    /// Candidates the strategy has already scored, by index into `candidates`.
    pub scored: Vec<(usize, Scored)>,
}

impl From<Vec<Candidate>> for Proposal {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            scored: Vec::new(),
        }
    }
}

pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates for the next round. Index 0 is always [`Candidate::identity`].
    fn propose_round(
        &self,
        state: &SearchState,
        scorer: &Scorer<'_>,
        rng: &mut SearchRng,
    ) -> Result<Proposal, EngineError>;
}

/// `precision` is the step size below which a move counts as marginal.
pub fn build_strategy(config: &StrategyConfig, precision: f64) -> Box<dyn SearchStrategy> {
    match *config {
        StrategyConfig::Exhaustive => Box::new(Exhaustive),
        StrategyConfig::RandomMultiPoint {
            good_quota,
            marginal_quota,
        } => Box::new(RandomMultiPoint::new(good_quota, marginal_quota, precision)),
    }
}
