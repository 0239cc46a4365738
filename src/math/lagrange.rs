//! Lagrange polynomial interpolation
//!
//! Used to sample propagated trajectories between integration nodes and to
//! refine threshold crossings found on a coarse grid.

use crate::error::{Error, Result};
use nalgebra::Vector3;

/// Evaluate the Lagrange polynomial through `(xs[i], ys[i])` at `x`
pub fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> Result<f64> {
    check_nodes(xs, ys.len())?;
    let mut sum = 0.0;
    for (j, (&xj, &yj)) in xs.iter().zip(ys).enumerate() {
        sum += yj * basis(xs, j, xj, x);
    }
    Ok(sum)
}

/// Component-wise Lagrange interpolation of vector samples
pub fn interpolate_vector(xs: &[f64], ys: &[Vector3<f64>], x: f64) -> Result<Vector3<f64>> {
    check_nodes(xs, ys.len())?;
    let mut sum = Vector3::zeros();
    for (j, (&xj, yj)) in xs.iter().zip(ys).enumerate() {
        sum += yj * basis(xs, j, xj, x);
    }
    Ok(sum)
}

/// Locate where the interpolant crosses `threshold` between two bracketing nodes
///
/// Returns `None` when the samples at `xs[lo]` and `xs[lo + 1]` do not bracket
/// the threshold. Refinement is a bisection on the interpolating polynomial.
pub fn refine_crossing(xs: &[f64], ys: &[f64], lo: usize, threshold: f64) -> Result<Option<f64>> {
    check_nodes(xs, ys.len())?;
    if lo + 1 >= xs.len() {
        return Ok(None);
    }

    let mut a = xs[lo];
    let mut b = xs[lo + 1];
    let mut fa = ys[lo] - threshold;
    let fb = ys[lo + 1] - threshold;
    if fa == 0.0 {
        return Ok(Some(a));
    }
    if fa * fb > 0.0 {
        return Ok(None);
    }

    for _ in 0..60 {
        let mid = 0.5 * (a + b);
        let fm = interpolate(xs, ys, mid)? - threshold;
        if fm == 0.0 || (b - a).abs() < 1e-9 {
            return Ok(Some(mid));
        }
        if fa * fm < 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
    }
    Ok(Some(0.5 * (a + b)))
}

fn basis(xs: &[f64], j: usize, xj: f64, x: f64) -> f64 {
    xs.iter()
        .enumerate()
        .filter(|(m, _)| *m != j)
        .fold(1.0, |acc, (_, &xm)| acc * (x - xm) / (xj - xm))
}

fn check_nodes(xs: &[f64], len: usize) -> Result<()> {
    if xs.is_empty() || xs.len() != len {
        return Err(Error::invalid(format!(
            "interpolation needs matching non-empty samples ({} abscissas, {} values)",
            xs.len(),
            len
        )));
    }
    for (i, a) in xs.iter().enumerate() {
        if xs[i + 1..].iter().any(|b| b == a) {
            return Err(Error::invalid("interpolation abscissas must be distinct"));
        }
    }
    Ok(())
}
