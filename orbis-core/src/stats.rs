//! Deterministic statistics used by the demographic solvers.
//!
//! Two families live here. The Gaussian side (closed-form Φ, truncated-normal
//! retention, Gauss-Hermite nodes) serves the moment-based retirement and
//! mortality estimators - the only places statistical modelling enters the
//! engine. The integer side (Hamilton largest-remainder apportionment) serves
//! every place a real-valued share must be split into exact integer counts.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::types::MAX_AGE;

// === GAUSSIAN PRIMITIVES ===

const SQRT_TWO_PI: f64 = 2.5066282746310002;

/// Standard normal density.
pub fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / SQRT_TWO_PI
}

/// Standard normal CDF via the Abramowitz-Stegun 26.2.17 rational
/// approximation (|error| < 7.5e-8).
pub fn normal_cdf(z: f64) -> f64 {
    if z < 0.0 {
        return 1.0 - normal_cdf(-z);
    }
    let t = 1.0 / (1.0 + 0.2316419 * z);
    let poly = t
        * (0.319381530
            + t * (-0.356563782 + t * (1.781477937 + t * (-1.821255978 + t * 1.330274429))));
    1.0 - normal_pdf(z) * poly
}

/// 3-point Gauss-Hermite quadrature for a normal with moments (μ, σ²):
/// nodes at μ ± √3·σ and μ, weights 1/6, 4/6, 1/6.
pub const GAUSS_HERMITE_3: [(f64, f64); 3] = [
    (-1.7320508075688772, 1.0 / 6.0),
    (0.0, 4.0 / 6.0),
    (1.7320508075688772, 1.0 / 6.0),
];

// === AGE MOMENTS ===

/// Mean and population variance of the age distribution inside an active
/// (tenure, education) cohort. Updated analytically on hire, retirement and
/// year aging; never sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgeMoments {
    pub mean: f64,
    pub variance: f64,
}

impl AgeMoments {
    pub const DEFAULT_MEAN: f64 = 30.0;

    pub fn new(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }

    pub fn sigma(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }

    /// Combine two cohorts' moments with the parallel-axis formula.
    /// Returns the default when both are empty.
    pub fn combine(n1: u64, m1: AgeMoments, n2: u64, m2: AgeMoments) -> AgeMoments {
        let total = n1 + n2;
        if total == 0 {
            return AgeMoments::default();
        }
        let (w1, w2) = (n1 as f64, n2 as f64);
        let mean = (w1 * m1.mean + w2 * m2.mean) / (w1 + w2);
        let variance = (w1 * (m1.variance + (m1.mean - mean).powi(2))
            + w2 * (m2.variance + (m2.mean - mean).powi(2)))
            / (w1 + w2);
        AgeMoments { mean, variance }
    }

    /// Moments of the sub-population retained below `cutoff`, assuming the
    /// cohort is normal. With z = (cutoff - μ)/σ and λ = φ(z)/Φ(z):
    /// μ' = μ - σλ, σ'² = σ²(1 - zλ - λ²), floored at zero.
    pub fn retain_below(&self, cutoff: f64) -> AgeMoments {
        let sigma = self.sigma();
        if sigma <= 0.0 {
            return *self;
        }
        let z = (cutoff - self.mean) / sigma;
        let phi_big = normal_cdf(z);
        if phi_big <= 0.0 {
            // Entire mass above the cutoff; nothing sensible remains.
            return AgeMoments::default();
        }
        let lambda = normal_pdf(z) / phi_big;
        AgeMoments {
            mean: self.mean - sigma * lambda,
            variance: (self.variance * (1.0 - z * lambda - lambda * lambda)).max(0.0),
        }
    }

    /// Everyone in the cohort gets one year older; the spread is unchanged.
    /// The mean is capped at MAX_AGE so the sanity invariant holds even for a
    /// cohort that somehow escapes retirement.
    pub fn aged(&self, years: f64) -> AgeMoments {
        AgeMoments {
            mean: (self.mean + years).min(MAX_AGE as f64),
            variance: self.variance,
        }
    }
}

impl Default for AgeMoments {
    fn default() -> Self {
        Self {
            mean: Self::DEFAULT_MEAN,
            variance: 0.0,
        }
    }
}

// === HAMILTON APPORTIONMENT ===

/// Split `total` across integer weights by the largest-remainder (Hamilton)
/// method, exactly: quotas are computed in u128 rational arithmetic, floors
/// are assigned first, and the residual goes to the largest fractional
/// remainders with the lower index breaking ties. Returns all zeros when the
/// weights sum to zero.
pub fn largest_remainder(total: u64, weights: &[u64]) -> Vec<u64> {
    let weight_sum: u128 = weights.iter().map(|&w| w as u128).sum();
    if weight_sum == 0 || total == 0 {
        return vec![0; weights.len()];
    }

    let mut shares: Vec<u64> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(u128, usize)> = Vec::with_capacity(weights.len());
    let mut assigned: u64 = 0;

    for (i, &w) in weights.iter().enumerate() {
        let numerator = total as u128 * w as u128;
        let floor = (numerator / weight_sum) as u64;
        shares.push(floor);
        assigned += floor;
        remainders.push((numerator % weight_sum, i));
    }

    // Largest remainder first; ties go to the lower index.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut residual = total - assigned;
    for &(_, i) in &remainders {
        if residual == 0 {
            break;
        }
        shares[i] += 1;
        residual -= 1;
    }

    shares
}
