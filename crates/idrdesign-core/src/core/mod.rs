//! # Core Module
//!
//! Stateless building blocks shared by the search engine and by external reporting:
//!
//! - [`alphabet`] - the fixed 20-residue amino-acid alphabet and per-residue constants
//! - [`sequence`] - validated sequences and point mutations
//! - [`extended`] - the mutation-aware feature cache and its `SeqRepr` derivations
//! - [`features`] - the feature registry, builtin feature formulas and their configuration
//! - [`distance`] - reference variances and the normalised squared distance
//! - [`io`] - sequence file formats

pub mod alphabet;
pub mod distance;
pub mod extended;
pub mod features;
pub mod io;
pub mod sequence;
