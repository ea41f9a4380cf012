//! Normal equations for small linear least-squares fits

use crate::io::configuration::RANK_TOLERANCE;

/// Number of coefficients in a planar model (constant, x slope, y slope)
pub const PLANE_TERMS: usize = 3;

/// Accumulates the normal equations `AᵀA·β = Aᵀy` one sample at a time
///
/// Only the two small moment matrices are kept, so the design matrix itself is
/// never materialized regardless of how many pixels contribute.
#[derive(Debug, Clone, Default)]
pub struct NormalEquations {
    gram: [[f64; PLANE_TERMS]; PLANE_TERMS],
    moment: [f64; PLANE_TERMS],
    samples: usize,
}

impl NormalEquations {
    /// Create an empty system
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one design row and its observed value
    pub fn add_sample(&mut self, features: [f64; PLANE_TERMS], target: f64) {
        for ((row, moment), &fi) in self
            .gram
            .iter_mut()
            .zip(self.moment.iter_mut())
            .zip(features.iter())
        {
            for (cell, &fj) in row.iter_mut().zip(features.iter()) {
                *cell = fi.mul_add(fj, *cell);
            }
            *moment = fi.mul_add(target, *moment);
        }
        self.samples += 1;
    }

    /// Number of samples added so far
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Solve for the coefficients that minimize the squared residuals
    ///
    /// Symmetric Gaussian elimination without pivoting, which is stable for a
    /// positive semi-definite Gram matrix. Returns `None` when a pivot falls
    /// below [`RANK_TOLERANCE`] relative to its original diagonal entry, i.e.
    /// when the design matrix is rank deficient.
    // Entries are named by their matrix position
    #[allow(clippy::similar_names)]
    pub fn solve(&self) -> Option<[f64; PLANE_TERMS]> {
        let [[a00, a01, a02], [_, a11, a12], [_, _, a22]] = self.gram;
        let [b0, b1, b2] = self.moment;

        if !pivot_holds(a00, a00) {
            return None;
        }
        let f1 = a01 / a00;
        let f2 = a02 / a00;
        let r11 = f1.mul_add(-a01, a11);
        let r12 = f1.mul_add(-a02, a12);
        let r22 = f2.mul_add(-a02, a22);
        let c1 = f1.mul_add(-b0, b1);
        let c2 = f2.mul_add(-b0, b2);

        if !pivot_holds(r11, a11) {
            return None;
        }
        let g = r12 / r11;
        let s22 = g.mul_add(-r12, r22);
        let d2 = g.mul_add(-c1, c2);

        if !pivot_holds(s22, a22) {
            return None;
        }

        let beta2 = d2 / s22;
        let beta1 = r12.mul_add(-beta2, c1) / r11;
        let beta0 = a02.mul_add(-beta2, a01.mul_add(-beta1, b0)) / a00;

        let solution = [beta0, beta1, beta2];
        solution.iter().all(|c| c.is_finite()).then_some(solution)
    }
}

const fn pivot_holds(pivot: f64, diagonal: f64) -> bool {
    pivot.is_finite() && pivot > 0.0 && pivot > RANK_TOLERANCE * diagonal
}

/// Coefficient of determination of `predicted` against `observed`
///
/// Follows the usual regression scoring convention: a constant target scores
/// `1.0` when predicted exactly and `0.0` otherwise. The result can be negative
/// for a model worse than the mean.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let n = observed.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }

    let mean = observed.iter().take(n).sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&y, &y_hat) in observed.iter().zip(predicted.iter()) {
        ss_res += (y - y_hat).powi(2);
        ss_tot += (y - mean).powi(2);
    }

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}
