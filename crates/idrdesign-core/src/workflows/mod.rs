//! # Workflows Module
//!
//! Top-level entry points that tie the feature foundation and the search engine
//! together.
//!
//! - **Design Workflow** ([`design`]) - Evaluates the target, prepares start
//!   sequences (given or random), and runs one seeded search per start.

pub mod design;
