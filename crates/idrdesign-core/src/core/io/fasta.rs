use super::traits::SequenceFile;
use crate::core::sequence::{AlphabetError, Sequence};
use bio::io::fasta;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// The full header line after `>`, description included.
    pub id: String,
    pub sequence: Sequence,
}

impl FastaRecord {
    pub fn new(id: impl Into<String>, sequence: Sequence) -> Self {
        Self {
            id: id.into(),
            sequence,
        }
    }
}

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed FASTA input: {0}")]
    Malformed(#[source] io::Error),
    #[error("Invalid sequence in record '{record}': {source}")]
    InvalidSequence {
        record: String,
        source: AlphabetError,
    },
}

pub struct FastaFile;

impl FastaFile {
    fn convert(record: &fasta::Record) -> Result<FastaRecord, FastaError> {
        let id = match record.desc() {
            Some(desc) => format!("{} {}", record.id(), desc),
            None => record.id().to_string(),
        };
        let text = String::from_utf8_lossy(record.seq());
        match Sequence::new(&text) {
            Ok(sequence) => Ok(FastaRecord { id, sequence }),
            Err(source) => Err(FastaError::InvalidSequence { record: id, source }),
        }
    }
}

impl SequenceFile for FastaFile {
    type Error = FastaError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<FastaRecord>, Self::Error> {
        fasta::Reader::from_bufread(reader)
            .records()
            .map(|record| {
                let record = record.map_err(FastaError::Malformed)?;
                Self::convert(&record)
            })
            .collect()
    }

    /// One line per sequence.
    fn write_to(records: &[FastaRecord], writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut fasta_writer = fasta::Writer::new(writer);
        for record in records {
            fasta_writer.write(&record.id, None, record.sequence.as_str().as_bytes())?;
        }
        fasta_writer.flush()?;
        Ok(())
    }
}
