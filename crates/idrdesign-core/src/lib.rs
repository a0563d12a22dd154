//! # idrdesign Core Library
//!
//! Designs amino-acid sequences whose bulk biophysical features match those of a
//! target sequence, by local search over point substitutions.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Residue alphabet, validated sequences, the
//!   mutation-aware feature cache (`ExtendedSequence`), the feature registry and its
//!   builtin formulas, the variance-normalised distance metric, and FASTA I/O.
//!
//! - **[`engine`]: The Logic Core.** Stateful search machinery: candidate scoring in
//!   dependency waves, the pluggable search strategies (exhaustive one-point and
//!   randomised multi-point), the seeded random streams, and the iterative driver
//!   that runs rounds until the step size drops below the precision threshold.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together into the
//!   `design` entry point, including random start generation.

pub mod core;
pub mod engine;
pub mod workflows;
