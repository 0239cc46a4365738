//! Kepler's equation and anomaly conversions
//!
//! Elliptic orbits use the eccentric anomaly E with M = E - e sin E;
//! hyperbolic orbits use the hyperbolic anomaly H with M = e sinh H - H.

use crate::error::{Error, Result};
use crate::math::normalize_angle;
use std::f64::consts::PI;

/// Convergence tolerance on the anomaly (rad)
pub const KEPLER_TOLERANCE: f64 = 1e-9;

/// Iteration cap for the fixed-point solvers
pub const KEPLER_MAX_ITERATIONS: usize = 10_000;

/// Above this eccentricity the elliptic solver starts at E = π and applies
/// Aitken acceleration; the plain iteration contracts like e cos E and
/// stalls near periapsis of nearly parabolic orbits
const HIGH_ECCENTRICITY: f64 = 0.8;

/// Solve M = E - e sin E by fixed-point iteration E ← M + e sin E
pub fn eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> Result<f64> {
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(Error::out_of_range(format!(
            "elliptic Kepler equation needs 0 <= e < 1, got {eccentricity}"
        )));
    }
    let m = normalize_angle(mean_anomaly);
    let step = |ea: f64| m + eccentricity * ea.sin();
    let residual = |ea: f64| (ea - eccentricity * ea.sin() - m).abs();
    let accelerate = eccentricity > HIGH_ECCENTRICITY;

    let mut e_anomaly = if accelerate { PI } else { m };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let next = step(e_anomaly);
        if (next - e_anomaly).abs() < KEPLER_TOLERANCE {
            return Ok(next);
        }
        if !accelerate {
            e_anomaly = next;
            continue;
        }
        let after = step(next);
        let curvature = after - 2.0 * next + e_anomaly;
        let mut candidate = after;
        if curvature.abs() > f64::EPSILON {
            let aitken = (e_anomaly - (next - e_anomaly).powi(2) / curvature)
                .clamp(m - eccentricity, m + eccentricity);
            if residual(aitken) < residual(after) {
                candidate = aitken;
            }
        }
        e_anomaly = candidate;
    }
    Err(Error::Convergence {
        solver: "Kepler equation",
        iterations: KEPLER_MAX_ITERATIONS,
    })
}

/// Solve M = e sinh H - H by fixed-point iteration H ← asinh((M + H)/e)
pub fn hyperbolic_anomaly(mean_anomaly: f64, eccentricity: f64) -> Result<f64> {
    if eccentricity <= 1.0 {
        return Err(Error::out_of_range(format!(
            "hyperbolic Kepler equation needs e > 1, got {eccentricity}"
        )));
    }
    let mut h = (mean_anomaly / eccentricity).asinh();
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let next = ((mean_anomaly + h) / eccentricity).asinh();
        if (next - h).abs() < KEPLER_TOLERANCE {
            return Ok(next);
        }
        h = next;
    }
    Err(Error::Convergence {
        solver: "hyperbolic Kepler equation",
        iterations: KEPLER_MAX_ITERATIONS,
    })
}

/// True anomaly in [0, 2π) from the mean anomaly
pub fn true_from_mean(mean_anomaly: f64, eccentricity: f64) -> Result<f64> {
    if eccentricity < 1.0 {
        let e_anomaly = eccentric_anomaly(mean_anomaly, eccentricity)?;
        let beta = (1.0 - eccentricity * eccentricity).sqrt();
        Ok(normalize_angle(
            (beta * e_anomaly.sin()).atan2(e_anomaly.cos() - eccentricity),
        ))
    } else {
        let h = hyperbolic_anomaly(mean_anomaly, eccentricity)?;
        let ratio = ((eccentricity + 1.0) / (eccentricity - 1.0)).sqrt();
        Ok(normalize_angle(2.0 * (ratio * (0.5 * h).tanh()).atan()))
    }
}

/// Eccentric (or hyperbolic) anomaly from the true anomaly
pub fn eccentric_from_true(true_anomaly: f64, eccentricity: f64) -> f64 {
    if eccentricity < 1.0 {
        let beta = (1.0 - eccentricity * eccentricity).sqrt();
        normalize_angle((beta * true_anomaly.sin()).atan2(eccentricity + true_anomaly.cos()))
    } else {
        let ratio = ((eccentricity - 1.0) / (eccentricity + 1.0)).sqrt();
        // Wrap ν into (-π, π] so outbound and inbound branches keep their sign
        let nu = true_anomaly - std::f64::consts::TAU * (true_anomaly / std::f64::consts::TAU).round();
        2.0 * (ratio * (0.5 * nu).tan()).atanh()
    }
}

/// Mean anomaly from the true anomaly, in [0, 2π) for closed orbits
pub fn mean_from_true(true_anomaly: f64, eccentricity: f64) -> f64 {
    let anomaly = eccentric_from_true(true_anomaly, eccentricity);
    if eccentricity < 1.0 {
        normalize_angle(anomaly - eccentricity * anomaly.sin())
    } else {
        eccentricity * anomaly.sinh() - anomaly
    }
}
