use super::{Feature, FeatureError, FeatureInput};
use crate::core::alphabet::AminoAcid;
use crate::core::extended::ExtendedSequence;
use regex::Regex;
use statrs::function::factorial::ln_factorial;

/// A residue-level pattern. Single one-letter codes are answered from the
/// maintained residue counts; anything else runs a regex over the sequence text.
#[derive(Debug, Clone)]
pub enum Pattern {
    Residue(AminoAcid),
    Regex(Regex),
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut chars = pattern.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Ok(aa) = AminoAcid::from_char(c) {
                return Ok(Self::Residue(aa));
            }
        }
        Regex::new(pattern).map(Self::Regex)
    }

    /// Number of non-overlapping matches.
    pub fn count(&self, sequence: &ExtendedSequence) -> usize {
        match self {
            Self::Residue(aa) => sequence.count(*aa),
            Self::Regex(re) => re.find_iter(sequence.sequence().as_str()).count(),
        }
    }

    /// Total number of residues covered by non-overlapping matches.
    pub fn span(&self, sequence: &ExtendedSequence) -> usize {
        match self {
            Self::Residue(aa) => sequence.count(*aa),
            Self::Regex(re) => re
                .find_iter(sequence.sequence().as_str())
                .map(|m| m.len())
                .sum(),
        }
    }
}

/// Sequence complexity `(ln n! - sum_a ln c_a!) / n`.
///
/// With a predecessor the numerator is updated from the two residue counts
/// the substitution touched.
pub struct Complexity;

impl Feature for Complexity {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        let n = input.nonempty_len()?;
        let target = input.target;
        if let Some(prev) = &input.previous {
            let numerator = prev.cached_value()? * n
                + ((target.count(prev.mutation.from()) + 1) as f64).ln()
                - (target.count(prev.mutation.to()) as f64).ln();
            return Ok(numerator / n);
        }
        let numerator = ln_factorial(target.len() as u64)
            - target
                .counts()
                .iter()
                .map(|&c| ln_factorial(c as u64))
                .sum::<f64>();
        Ok(numerator / n)
    }
}

/// Fraction of charged residues.
pub struct Fcr;

impl Feature for Fcr {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        let n = input.nonempty_len()?;
        Ok(input.target.charged().len() as f64 / n)
    }
}

/// Weighted count of pattern matches, optionally divided by sequence length.
/// A plain count is a single pattern with weight 1.
pub struct PatternScore {
    weighted: Vec<(Pattern, f64)>,
    average: bool,
}

impl PatternScore {
    pub fn count(pattern: Pattern, average: bool) -> Self {
        Self {
            weighted: vec![(pattern, 1.0)],
            average,
        }
    }

    pub fn weighted(weighted: Vec<(Pattern, f64)>, average: bool) -> Self {
        Self { weighted, average }
    }
}

impl Feature for PatternScore {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        let total: f64 = self
            .weighted
            .iter()
            .map(|(pattern, weight)| pattern.count(input.target) as f64 * weight)
            .sum();
        if self.average {
            Ok(total / input.nonempty_len()?)
        } else {
            Ok(total)
        }
    }
}

/// Total length spanned by the matches of a pattern.
pub struct PatternLength {
    pattern: Pattern,
}

impl PatternLength {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern }
    }
}

impl Feature for PatternLength {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        Ok(self.pattern.span(input.target) as f64)
    }
}

/// `ln(1 + #numerator) - ln(1 + #denominator)`.
pub struct LogRatio {
    numerator: Pattern,
    denominator: Pattern,
}

impl LogRatio {
    pub fn new(numerator: Pattern, denominator: Pattern) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl Feature for LogRatio {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        let num = self.numerator.count(input.target) as f64;
        let den = self.denominator.count(input.target) as f64;
        Ok(num.ln_1p() - den.ln_1p())
    }
}
