use super::{Feature, FeatureError, FeatureInput};
use crate::core::alphabet::{ALPHABET, PKA_C_TERM, PKA_N_TERM};
use crate::core::extended::ExtendedSequence;

const PH_MIN: f64 = 0.0;
const PH_MAX: f64 = 14.0;
const ROOT_TOLERANCE: f64 = 1e-12;
pub const MAX_ROOT_ITERATIONS: usize = 100;

/// Site counts of one ionisable group.
#[derive(Debug, Clone, Copy)]
struct Site {
    count: f64,
    pka: f64,
}

/// Henderson-Hasselbalch net charge as a function of pH.
///
/// Starts from every basic site (plus the N-terminus) protonated and subtracts
/// the expected number of protons released at `ph`.
struct ChargeCurve {
    basic_sites: f64,
    sites: Vec<Site>,
}

impl ChargeCurve {
    fn new(sequence: &ExtendedSequence) -> Self {
        let mut basic_sites = 1.0;
        let mut sites = Vec::with_capacity(9);
        for aa in ALPHABET {
            let Some(pka) = aa.pka() else { continue };
            let count = sequence.count(aa) as f64;
            if aa.is_basic() {
                basic_sites += count;
            }
            sites.push(Site { count, pka });
        }
        sites.push(Site {
            count: 1.0,
            pka: PKA_N_TERM,
        });
        sites.push(Site {
            count: 1.0,
            pka: PKA_C_TERM,
        });
        Self { basic_sites, sites }
    }

    fn charge(&self, ph: f64) -> f64 {
        let released: f64 = self
            .sites
            .iter()
            .map(|s| s.count * (1.0 - 1.0 / (1.0 + 10f64.powf(ph - s.pka))))
            .sum();
        self.basic_sites - released
    }

    fn has_root(&self) -> bool {
        self.charge(PH_MIN) > 0.0 && self.charge(PH_MAX) < 0.0
    }
}

/// Brent's method on a sign-changing bracket. Returns `None` if the iteration
/// cap is hit first.
pub fn brent_root(
    f: impl Fn(f64) -> f64,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Option<f64> {
    let (mut a, mut b) = (lower, upper);
    let (mut fa, mut fb) = (f(a), f(b));
    if fa == 0.0 {
        return Some(a);
    }
    if fb == 0.0 {
        return Some(b);
    }
    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;
    for _ in 0..max_iterations {
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * tolerance;
        let half = 0.5 * (c - b);
        if half.abs() <= tol || fb == 0.0 {
            return Some(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation, or secant when only two points are distinct.
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * half * s;
                q = 1.0 - s;
            } else {
                let qa = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * half * qa * (qa - r) - (b - a) * (r - 1.0));
                q = (qa - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * half * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = half;
                e = d;
            }
        } else {
            d = half;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(half) };
        fb = f(b);
    }
    None
}

/// Isoelectric point: the pH in [0, 14] where the net charge is zero.
///
/// A substitution touching no ionisable residue leaves the curve unchanged and
/// reuses the predecessor's value. Otherwise the predecessor's pI splits the
/// bracket before root finding.
pub struct IsoelectricPoint;

impl Feature for IsoelectricPoint {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        let mut guess = None;
        if let Some(prev) = &input.previous {
            let cached = prev.cached_value()?;
            if !prev.mutation.touches_ionisable() {
                return Ok(cached);
            }
            guess = Some(cached);
        }

        let curve = ChargeCurve::new(input.target);
        if !curve.has_root() {
            return Err(input.undefined("net charge does not change sign on pH 0-14"));
        }

        let (lower, upper) = match guess {
            Some(g) if g > PH_MIN && g < PH_MAX => {
                let at_guess = curve.charge(g);
                if at_guess == 0.0 {
                    return Ok(g);
                } else if at_guess > 0.0 {
                    (g, PH_MAX)
                } else {
                    (PH_MIN, g)
                }
            }
            _ => (PH_MIN, PH_MAX),
        };

        brent_root(
            |ph| curve.charge(ph),
            lower,
            upper,
            ROOT_TOLERANCE,
            MAX_ROOT_ITERATIONS,
        )
        .ok_or_else(|| FeatureError::NoConvergence {
            feature: input.name.to_string(),
            iterations: MAX_ROOT_ITERATIONS,
        })
    }
}

/// Sequence charge decoration: `sum_{i<j} q_i q_j sqrt(j - i) / n` over charged
/// residues.
pub struct Scd;

impl Feature for Scd {
    fn compute(&self, input: &FeatureInput<'_>) -> Result<f64, FeatureError> {
        let n = input.nonempty_len()?;
        let residues = input.target.sequence().residues();

        if let Some(prev) = &input.previous {
            let cached = prev.cached_value()?;
            let m = prev.mutation;
            if !m.changes_charge() {
                return Ok(cached);
            }
            let dq = f64::from(m.to().charge() - m.from().charge());
            let loc = m.position();
            let delta: f64 = prev
                .sequence
                .charged()
                .iter()
                .map(|&i| f64::from(residues[i].charge()) * dq * (loc.abs_diff(i) as f64).sqrt())
                .sum();
            return Ok(cached + delta / n);
        }

        let charged = input.target.charged();
        let mut total = 0.0;
        for (k, &j) in charged.iter().enumerate() {
            let qj = f64::from(residues[j].charge());
            for &i in &charged[..k] {
                total += f64::from(residues[i].charge()) * qj * ((j - i) as f64).sqrt();
            }
        }
        Ok(total / n)
    }
}
