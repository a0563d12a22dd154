use super::alphabet::{ALPHABET_SIZE, AminoAcid};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Character '{character}' at index {index} is not a valid amino acid")]
pub struct AlphabetError {
    pub index: usize,
    pub character: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Mutation position {position} is out of bounds for a sequence of length {len}")]
    OutOfBounds { position: usize, len: usize },
    #[error("Null mutation at position {position}: residue is already {residue}")]
    Null { position: usize, residue: AminoAcid },
}

/// An immutable, validated amino-acid sequence.
///
/// The residue vector and its one-letter text are kept side by side so that
/// regex-based features can run without re-rendering the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence {
    text: String,
    residues: Vec<AminoAcid>,
}

impl Sequence {
    pub fn new(text: &str) -> Result<Self, AlphabetError> {
        let residues = text
            .chars()
            .enumerate()
            .map(|(index, character)| {
                AminoAcid::from_char(character).map_err(|_| AlphabetError { index, character })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            text: text.to_string(),
            residues,
        })
    }

    pub fn from_residues(residues: Vec<AminoAcid>) -> Self {
        let text = residues.iter().map(|aa| aa.to_char()).collect();
        Self { text, residues }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    #[inline]
    pub fn residues(&self) -> &[AminoAcid] {
        &self.residues
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<AminoAcid> {
        self.residues.get(position).copied()
    }

    pub fn counts(&self) -> [usize; ALPHABET_SIZE] {
        let mut counts = [0; ALPHABET_SIZE];
        for aa in &self.residues {
            counts[aa.index()] += 1;
        }
        counts
    }

    /// Returns the sequence with `mutation` applied.
    pub fn apply(&self, mutation: &PointMutation) -> Self {
        let mut residues = self.residues.clone();
        residues[mutation.position] = mutation.to;
        let mut text = self.text.clone();
        // Every residue is a single ASCII byte, so byte and char positions agree.
        text.replace_range(
            mutation.position..mutation.position + 1,
            mutation.to.to_char().encode_utf8(&mut [0; 4]),
        );
        Self { text, residues }
    }

}

impl FromStr for Sequence {
    type Err = AlphabetError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Sequence {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// A single-residue substitution. Only constructible against a sequence it
/// actually changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointMutation {
    position: usize,
    from: AminoAcid,
    to: AminoAcid,
}

impl PointMutation {
    pub fn new(sequence: &Sequence, position: usize, to: AminoAcid) -> Result<Self, MutationError> {
        let from = sequence.get(position).ok_or(MutationError::OutOfBounds {
            position,
            len: sequence.len(),
        })?;
        if from == to {
            return Err(MutationError::Null {
                position,
                residue: from,
            });
        }
        Ok(Self { position, from, to })
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn from(&self) -> AminoAcid {
        self.from
    }

    #[inline]
    pub fn to(&self) -> AminoAcid {
        self.to
    }

    #[inline]
    pub fn changes_charge(&self) -> bool {
        self.from.charge() != self.to.charge()
    }

    #[inline]
    pub fn changes_procharged_membership(&self) -> bool {
        self.from.is_pro_or_charged() != self.to.is_pro_or_charged()
    }

    #[inline]
    pub fn touches_ionisable(&self) -> bool {
        self.from.pka().is_some() || self.to.pka().is_some()
    }
}

impl fmt::Display for PointMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.from, self.position + 1, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_valid_sequence_and_keeps_text() {
        let seq = Sequence::new("KRTAE").unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.as_str(), "KRTAE");
        assert_eq!(seq.get(0), Some(AminoAcid::Lys));
        assert_eq!(seq.get(5), None);
    }

    #[test]
    fn new_reports_index_and_character_of_first_invalid_residue() {
        let err = Sequence::new("ACXB").unwrap_err();
        assert_eq!(
            err,
            AlphabetError {
                index: 2,
                character: 'X'
            }
        );
    }

    #[test]
    fn empty_sequence_is_a_valid_value() {
        let seq = Sequence::new("").unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.counts(), [0; ALPHABET_SIZE]);
    }

    #[test]
    fn counts_tally_every_residue() {
        let seq = Sequence::new("AAKE").unwrap();
        let counts = seq.counts();
        assert_eq!(counts[AminoAcid::Ala.index()], 2);
        assert_eq!(counts[AminoAcid::Lys.index()], 1);
        assert_eq!(counts[AminoAcid::Glu.index()], 1);
        assert_eq!(counts.iter().sum::<usize>(), 4);
    }

    #[test]
    fn point_mutation_rejects_out_of_bounds_and_null_substitutions() {
        let seq = Sequence::new("AKE").unwrap();
        assert_eq!(
            PointMutation::new(&seq, 3, AminoAcid::Gly),
            Err(MutationError::OutOfBounds { position: 3, len: 3 })
        );
        assert_eq!(
            PointMutation::new(&seq, 1, AminoAcid::Lys),
            Err(MutationError::Null {
                position: 1,
                residue: AminoAcid::Lys
            })
        );
    }

    #[test]
    fn apply_substitutes_residue_and_text() {
        let seq = Sequence::new("AKE").unwrap();
        let m = PointMutation::new(&seq, 1, AminoAcid::Asp).unwrap();
        let mutated = seq.apply(&m);
        assert_eq!(mutated.as_str(), "ADE");
        assert_eq!(mutated.residues()[1], AminoAcid::Asp);
        assert_eq!(m.from(), AminoAcid::Lys);
        assert_eq!(m.to_string(), "K2D");
    }

    #[test]
    fn mutation_category_flags_follow_residue_classes() {
        let seq = Sequence::new("KAP").unwrap();
        let k_to_d = PointMutation::new(&seq, 0, AminoAcid::Asp).unwrap();
        assert!(k_to_d.changes_charge());
        let a_to_p = PointMutation::new(&seq, 1, AminoAcid::Pro).unwrap();
        assert!(!a_to_p.changes_charge());
        assert!(a_to_p.changes_procharged_membership());
        assert!(!a_to_p.touches_ionisable());
        let p_to_e = PointMutation::new(&seq, 2, AminoAcid::Glu).unwrap();
        assert!(p_to_e.changes_charge());
        assert!(!p_to_e.changes_procharged_membership());
    }
}
