//! Ordinary least squares.
//!
//! Every output day needs one straight-line fit over a handful of baseline
//! points, so the solver is small and allocation-light.
//!
//! Implementation choices:
//! - The abscissa is centered on its mean before solving. Date ordinals are
//!   around 7.4e5, and an uncentered `[1, x]` design matrix wastes most of the
//!   available precision on the intercept column.
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `y = a + b x` by ordinary least squares.
///
/// Returns `None` for fewer than 2 points, for inputs of different lengths,
/// when every `x` is identical (slope undefined), or for non-finite input.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LineFit> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }
    if !xs.iter().chain(ys).all(|v| v.is_finite()) {
        return None;
    }

    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let spread = xs.iter().map(|x| (x - x_mean).abs()).fold(0.0, f64::max);
    if spread == 0.0 {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { xs[i] - x_mean });
    let y = DVector::from_column_slice(ys);
    let beta = solve_least_squares(&design, &y)?;

    let slope = beta[1];
    Some(LineFit {
        intercept: beta[0] - slope * x_mean,
        slope,
    })
}
