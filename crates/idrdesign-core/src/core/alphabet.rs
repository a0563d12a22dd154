use std::fmt;
use thiserror::Error;

pub const ALPHABET_SIZE: usize = 20;

/// The 20 standard amino acids, in the one-letter alphabetical order used both for
/// residue counts and for candidate enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AminoAcid {
    Ala, // A
    Cys, // C
    Asp, // D - acidic
    Glu, // E - acidic
    Phe, // F
    Gly, // G
    His, // H
    Ile, // I
    Lys, // K - basic
    Leu, // L
    Met, // M
    Asn, // N
    Pro, // P
    Gln, // Q
    Arg, // R - basic
    Ser, // S
    Thr, // T
    Val, // V
    Trp, // W
    Tyr, // Y
}

pub const ALPHABET: [AminoAcid; ALPHABET_SIZE] = [
    AminoAcid::Ala,
    AminoAcid::Cys,
    AminoAcid::Asp,
    AminoAcid::Glu,
    AminoAcid::Phe,
    AminoAcid::Gly,
    AminoAcid::His,
    AminoAcid::Ile,
    AminoAcid::Lys,
    AminoAcid::Leu,
    AminoAcid::Met,
    AminoAcid::Asn,
    AminoAcid::Pro,
    AminoAcid::Gln,
    AminoAcid::Arg,
    AminoAcid::Ser,
    AminoAcid::Thr,
    AminoAcid::Val,
    AminoAcid::Trp,
    AminoAcid::Tyr,
];

const LETTERS: &[u8; ALPHABET_SIZE] = b"ACDEFGHIKLMNPQRSTVWY";

pub const PKA_N_TERM: f64 = 7.5;
pub const PKA_C_TERM: f64 = 3.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid amino acid character '{0}'")]
pub struct ParseAminoAcidError(pub char);

impl AminoAcid {
    pub fn from_char(c: char) -> Result<Self, ParseAminoAcidError> {
        if !c.is_ascii() {
            return Err(ParseAminoAcidError(c));
        }
        LETTERS
            .iter()
            .position(|&l| l == c as u8)
            .map(|i| ALPHABET[i])
            .ok_or(ParseAminoAcidError(c))
    }

    pub fn to_char(self) -> char {
        LETTERS[self.index()] as char
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Binary residue charge: -1 for D/E, +1 for K/R, 0 otherwise.
    #[inline]
    pub fn charge(self) -> i8 {
        match self {
            Self::Asp | Self::Glu => -1,
            Self::Lys | Self::Arg => 1,
            _ => 0,
        }
    }

    #[inline]
    pub fn is_charged(self) -> bool {
        self.charge() != 0
    }

    /// Charged residues plus proline.
    #[inline]
    pub fn is_pro_or_charged(self) -> bool {
        self.is_charged() || self == Self::Pro
    }

    #[inline]
    pub fn is_basic(self) -> bool {
        matches!(self, Self::Lys | Self::Arg | Self::His)
    }

    /// Side-chain pKa for ionisable residues.
    pub fn pka(self) -> Option<f64> {
        match self {
            Self::Lys => Some(10.0),
            Self::Arg => Some(12.0),
            Self::His => Some(5.98),
            Self::Asp => Some(4.05),
            Self::Glu => Some(4.45),
            Self::Cys => Some(9.0),
            Self::Tyr => Some(10.0),
            _ => None,
        }
    }
}

impl TryFrom<char> for AminoAcid {
    type Error = ParseAminoAcidError;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c)
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
