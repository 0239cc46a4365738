//! Modified equinoctial elements
//!
//! (p, f, g, h, k, L) with p the semi-latus rectum, (f, g) the eccentricity
//! vector projected on the equinoctial basis, (h, k) the tangent of half the
//! inclination projected on the line of nodes, and L the true longitude.
//! The set stays regular for circular and equatorial orbits; only exactly
//! retrograde equatorial orbits (i = π) cannot be represented.

use super::keplerian::KeplerianElements;
use super::state_vector::StateVector;
use crate::body::Center;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::math::normalize_angle;
use nalgebra::Vector3;
use satkit::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct EquinoctialElements {
    /// Semi-latus rectum (km)
    pub p: f64,
    /// e·cos(ω + Ω)
    pub f: f64,
    /// e·sin(ω + Ω)
    pub g: f64,
    /// tan(i/2)·cos Ω
    pub h: f64,
    /// tan(i/2)·sin Ω
    pub k: f64,
    /// True longitude Ω + ω + ν in [0, 2π)
    pub true_longitude: f64,
    pub epoch: Instant,
    pub center: Center,
    pub frame: Frame,
}

impl EquinoctialElements {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        p: f64,
        f: f64,
        g: f64,
        h: f64,
        k: f64,
        true_longitude: f64,
        epoch: Instant,
        center: Center,
        frame: Frame,
    ) -> Result<Self> {
        if [p, f, g, h, k, true_longitude].iter().any(|v| !v.is_finite()) {
            return Err(Error::out_of_range("equinoctial elements must be finite"));
        }
        if p <= 0.0 {
            return Err(Error::out_of_range(format!(
                "semi-latus rectum must be positive, got {p}"
            )));
        }
        if center.mu <= 0.0 {
            return Err(Error::invalid(format!(
                "center {} has no gravitational parameter",
                center.id
            )));
        }
        Ok(Self {
            p,
            f,
            g,
            h,
            k,
            true_longitude: normalize_angle(true_longitude),
            epoch,
            center,
            frame,
        })
    }

    pub fn eccentricity(&self) -> f64 {
        self.f.hypot(self.g)
    }

    pub fn inclination(&self) -> f64 {
        2.0 * self.h.hypot(self.k).atan()
    }

    /// Semi-major axis (km)
    pub fn semi_major_axis(&self) -> f64 {
        self.p / (1.0 - self.f * self.f - self.g * self.g)
    }

    /// Equinoctial basis vectors (f̂, ĝ) in the reference frame
    fn basis(h: f64, k: f64) -> (Vector3<f64>, Vector3<f64>) {
        let s2 = 1.0 + h * h + k * k;
        let f_hat = Vector3::new(1.0 - k * k + h * h, 2.0 * h * k, -2.0 * k) / s2;
        let g_hat = Vector3::new(2.0 * h * k, 1.0 + k * k - h * h, 2.0 * h) / s2;
        (f_hat, g_hat)
    }

    /// Cartesian state, computed directly in the equinoctial basis
    pub fn to_state_vector(&self) -> StateVector {
        let (f_hat, g_hat) = Self::basis(self.h, self.k);
        let (sin_l, cos_l) = self.true_longitude.sin_cos();
        let w = 1.0 + self.f * cos_l + self.g * sin_l;
        let r = self.p / w;
        let sqrt_mu_p = (self.center.mu / self.p).sqrt();

        let position = r * (cos_l * f_hat + sin_l * g_hat);
        let velocity = sqrt_mu_p * (-(sin_l + self.g) * f_hat + (cos_l + self.f) * g_hat);
        StateVector::new(position, velocity, self.epoch, self.center, self.frame.clone())
    }

    pub fn from_state_vector(state: &StateVector) -> Result<Self> {
        let h_vec = state.angular_momentum();
        let h_norm = h_vec.norm();
        if h_norm < crate::math::ZERO_TOLERANCE {
            return Err(Error::Unsupported {
                message: "rectilinear trajectories have no orbital elements".into(),
            });
        }
        let w = h_vec / h_norm;
        let denom = 1.0 + w.z;
        if denom < 1e-12 {
            return Err(Error::out_of_range(
                "retrograde equatorial orbits are singular in equinoctial elements",
            ));
        }
        let k = w.x / denom;
        let h = -w.y / denom;

        let (f_hat, g_hat) = Self::basis(h, k);
        let e = state.eccentricity_vector();
        let r = &state.position;
        Self::new(
            state.semi_latus_rectum(),
            e.dot(&f_hat),
            e.dot(&g_hat),
            h,
            k,
            r.dot(&g_hat).atan2(r.dot(&f_hat)),
            state.epoch,
            state.center,
            state.frame.clone(),
        )
    }

    pub fn to_keplerian(&self) -> Result<KeplerianElements> {
        let e = self.eccentricity();
        let raan = self.k.atan2(self.h);
        let longitude_of_periapsis = self.g.atan2(self.f);
        let nu = self.true_longitude - longitude_of_periapsis;
        KeplerianElements::new(
            self.semi_major_axis(),
            e,
            self.inclination(),
            raan,
            longitude_of_periapsis - raan,
            super::kepler::mean_from_true(normalize_angle(nu), e),
            self.epoch,
            self.center,
            self.frame.clone(),
        )
    }

    pub fn from_keplerian(elements: &KeplerianElements) -> Result<Self> {
        if (std::f64::consts::PI - elements.inclination).abs() < 1e-12 {
            return Err(Error::out_of_range(
                "retrograde equatorial orbits are singular in equinoctial elements",
            ));
        }
        let raan = elements.ascending_node_longitude;
        let varpi = raan + elements.argument_of_periapsis;
        let tan_half_i = (0.5 * elements.inclination).tan();
        let nu = elements.true_anomaly()?;
        Self::new(
            elements.semi_latus_rectum(),
            elements.eccentricity * varpi.cos(),
            elements.eccentricity * varpi.sin(),
            tan_half_i * raan.cos(),
            tan_half_i * raan.sin(),
            varpi + nu,
            elements.epoch,
            elements.center,
            elements.frame.clone(),
        )
    }

    /// Two-body transport through the Keplerian mean anomaly
    pub fn at_epoch(&self, epoch: Instant) -> Result<Self> {
        Self::from_keplerian(&self.to_keplerian()?.at_epoch(epoch)?)
    }
}
