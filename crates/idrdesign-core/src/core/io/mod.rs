//! Provides input/output functionality for sequence file formats.
//!
//! Reading and writing go through the [`traits::SequenceFile`] interface so
//! that callers can work with paths or with any buffered reader and writer.

pub mod fasta;
pub mod traits;
