//! # Engine Module
//!
//! Stateful search machinery for sequence design: given a feature registry, a
//! distance metric and a target feature vector, walk from a start sequence
//! towards the target by rounds of point substitutions.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Strategy choice, convergence precision, round and
//!   wall-clock budgets, seeding
//! - **Scoring** ([`scoring`]) - Candidate evaluation in dependency waves over the
//!   mutation-aware cache, and minimum-distance selection
//! - **Strategies** ([`strategy`]) - Round proposal: exhaustive one-point or randomised
//!   multi-point
//! - **Driver** ([`search`]) - The round loop, budget checks and convergence test
//! - **Randomness** ([`rng`]) - Per-run seed scope handing out independent streams
//! - **State Tracking** ([`state`]) - The current sequence and the finished outcome
//! - **Progress Monitoring** ([`progress`]) - Optional observer callbacks
//! - **Error Handling** ([`error`]) - The aggregated engine error

pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod rng;
pub mod scoring;
pub mod search;
pub mod state;
pub mod strategy;
