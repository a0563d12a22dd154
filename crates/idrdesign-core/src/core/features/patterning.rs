use super::{Feature, FeatureError, FeatureInput};

pub const DEFAULT_BLOB: usize = 5;

/// Z-score of observed neighbour pairs among `candidates` against a
/// geometric null model.
///
/// `candidates` are sorted positions; consecutive pairs closer than `blob`
/// that satisfy `is_neighbour` are counted. `mismatch_probability` is the
/// probability that a random pair of candidates fails the residue criterion.
fn neighbour_z_score(
    input: &FeatureInput<'_>,
    candidates: &[usize],
    blob: usize,
    is_neighbour: impl Fn(usize, usize) -> bool,
    mismatch_probability: f64,
) -> Result<f64, FeatureError> {
    if candidates.len() < 2 {
        return Err(input.undefined("fewer than two patterning residues"));
    }
    let n_c = candidates.len() as f64;
    let proportion = n_c / input.target.len() as f64;
    if proportion >= 1.0 {
        return Err(input.undefined("every residue is a patterning residue"));
    }

    let observed = candidates
        .windows(2)
        .filter(|w| w[1] - w[0] <= blob && is_neighbour(w[0], w[1]))
        .count() as f64;

    let next_within_blob: f64 = proportion
        * (0..blob)
            .map(|i| (1.0 - proportion).powi(i as i32))
            .sum::<f64>();
    let p = next_within_blob * (1.0 - mismatch_probability);
    let mean = p * n_c;
    let sd = (p * (1.0 - p) * n_c).sqrt();
    Ok((observed - mean) / sd)
}

/// Kappa-like charge blockiness: like charges clustered within `blob`
/// residues raise the score.
pub struct CustomKappa {
    pub blob: usize,
}

impl Default for CustomKappa {
    fn default() -> Self {
        Self { blob: DEFAULT_BLOB }
    }
}

impl Feature for CustomKappa {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        if let Some(prev) = &input.previous {
            if !prev.mutation.changes_charge() {
                return prev.cached_value();
            }
        }
        let residues = input.target.sequence().residues();
        let charged = input.target.charged();
        let positive = charged
            .iter()
            .filter(|&&i| residues[i].charge() > 0)
            .count() as f64;
        let negative = charged.len() as f64 - positive;
        let total = charged.len() as f64;
        let mismatch = 2.0 * negative * positive / (total * total);
        neighbour_z_score(
            input,
            charged,
            self.blob,
            |i, j| residues[i].charge() == residues[j].charge(),
            mismatch,
        )
    }
}

/// Omega-like proline/charge clustering within `blob` residues.
pub struct CustomOmega {
    pub blob: usize,
}

impl Default for CustomOmega {
    fn default() -> Self {
        Self { blob: DEFAULT_BLOB }
    }
}

impl Feature for CustomOmega {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        if let Some(prev) = &input.previous {
            if !prev.mutation.changes_procharged_membership() {
                return prev.cached_value();
            }
        }
        neighbour_z_score(
            input,
            input.target.procharged(),
            self.blob,
            |_, _| true,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn expected_z(observed: f64, n_c: f64, n: f64, blob: usize, mismatch: f64) -> f64 {
        let q = n_c / n;
        let p = q * (0..blob).map(|i| (1.0 - q).powi(i as i32)).sum::<f64>() * (1.0 - mismatch);
        (observed - p * n_c) / (p * (1.0 - p) * n_c).sqrt()
    }

    #[test]
    fn kappa_counts_like_charged_neighbours_within_blob() {
        // Charged at 0(K), 1(K), 3(E), 10(E): pairs (0,1) like, (1,3) unlike, (3,10) too far.
        let seq = "KKAEAAAAAAE";
        let mismatch = 2.0 * 2.0 * 2.0 / 16.0;
        let expected = expected_z(1.0, 4.0, 11.0, 5, mismatch);
        assert_close(full(&CustomKappa::default(), seq).unwrap(), expected);
    }

    #[test]
    fn kappa_is_undefined_for_too_few_or_all_charged() {
        let kappa = CustomKappa::default();
        assert!(full(&kappa, "AAKAA").unwrap_err().is_undefined());
        assert!(full(&kappa, "KKEE").unwrap_err().is_undefined());
        assert!(full(&kappa, "").unwrap_err().is_undefined());
    }

    #[test]
    fn omega_counts_procharged_neighbours() {
        // P at 0, K at 2, D at 9: (0,2) within blob, (2,9) not.
        let seq = "PAKAAAAAAD";
        let expected = expected_z(1.0, 3.0, 10.0, 5, 0.0);
        assert_close(full(&CustomOmega::default(), seq).unwrap(), expected);
    }

    #[test]
    fn kappa_incremental_matches_full() {
        for (base, pos, to) in [
            ("KKAEAAAAAAE", 2, 'R'),
            ("KKAEAAAAAAE", 0, 'E'),
            ("KKAEAAAAAAE", 4, 'G'),
            ("KKAEAAAAAAE", 3, 'D'),
        ] {
            let (inc, scratch) = incremental_and_full(&CustomKappa::default(), base, pos, to);
            assert_close(inc.unwrap(), scratch.unwrap());
        }
    }

    #[test]
    fn omega_incremental_matches_full() {
        for (base, pos, to) in [
            ("PAKAAAAAAD", 1, 'P'),
            ("PAKAAAAAAD", 0, 'K'),
            ("PAKAAAAAAD", 4, 'S'),
            ("PAKAAAAAAD", 2, 'A'),
        ] {
            let (inc, scratch) = incremental_and_full(&CustomOmega::default(), base, pos, to);
            assert_close(inc.unwrap(), scratch.unwrap());
        }
    }

    #[test]
    fn kappa_without_cached_predecessor_is_a_cache_inconsistency() {
        let (inc, _) = incremental_and_full(&CustomKappa::default(), "AAKAA", 0, 'G');
        // The predecessor was undefined, so there is nothing to reuse.
        assert!(matches!(inc, Err(FeatureError::CacheInconsistency { .. })));
    }
}
