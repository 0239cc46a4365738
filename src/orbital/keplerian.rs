//! Classical Keplerian elements

use super::kepler;
use super::state_vector::StateVector;
use crate::body::Center;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::math::normalize_angle;
use crate::time::seconds_between;
use nalgebra::{UnitQuaternion, Vector3};
use satkit::Instant;
use std::f64::consts::PI;

/// Eccentricities within this of one are rejected as parabolic
pub const PARABOLIC_TOLERANCE: f64 = 1e-9;

/// Classical orbital elements
///
/// Angles are radians: RAAN, argument of periapsis and (for closed orbits)
/// mean anomaly are normalized into [0, 2π). Hyperbolic orbits carry a
/// negative semi-major axis and an unwrapped mean anomaly.
#[derive(Debug, Clone, PartialEq)]
pub struct KeplerianElements {
    /// Semi-major axis (km)
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Inclination in [0, π]
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub argument_of_periapsis: f64,
    pub mean_anomaly: f64,
    pub epoch: Instant,
    pub center: Center,
    pub frame: Frame,
}

impl KeplerianElements {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: f64,
        ascending_node_longitude: f64,
        argument_of_periapsis: f64,
        mean_anomaly: f64,
        epoch: Instant,
        center: Center,
        frame: Frame,
    ) -> Result<Self> {
        let values = [
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude,
            argument_of_periapsis,
            mean_anomaly,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::out_of_range("orbital elements must be finite"));
        }
        if eccentricity < 0.0 {
            return Err(Error::out_of_range(format!(
                "eccentricity must be non-negative, got {eccentricity}"
            )));
        }
        if (eccentricity - 1.0).abs() < PARABOLIC_TOLERANCE {
            return Err(Error::out_of_range("parabolic orbits have no semi-major axis"));
        }
        if eccentricity < 1.0 && semi_major_axis <= 0.0 {
            return Err(Error::out_of_range(format!(
                "closed orbit needs a positive semi-major axis, got {semi_major_axis}"
            )));
        }
        if eccentricity > 1.0 && semi_major_axis >= 0.0 {
            return Err(Error::out_of_range(format!(
                "hyperbolic orbit needs a negative semi-major axis, got {semi_major_axis}"
            )));
        }
        if !(0.0..=PI).contains(&inclination) {
            return Err(Error::out_of_range(format!(
                "inclination must lie in [0, π], got {inclination}"
            )));
        }
        if center.mu <= 0.0 {
            return Err(Error::invalid(format!(
                "center {} has no gravitational parameter",
                center.id
            )));
        }

        let mean_anomaly = if eccentricity < 1.0 {
            normalize_angle(mean_anomaly)
        } else {
            mean_anomaly
        };
        Ok(Self {
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude: normalize_angle(ascending_node_longitude),
            argument_of_periapsis: normalize_angle(argument_of_periapsis),
            mean_anomaly,
            epoch,
            center,
            frame,
        })
    }

    /// Elements of the osculating orbit of `state`
    pub fn from_state_vector(state: &StateVector) -> Result<Self> {
        if state.radius() < crate::math::ZERO_TOLERANCE {
            return Err(Error::out_of_range("state vector has zero position"));
        }
        if state.angular_momentum().norm() < crate::math::ZERO_TOLERANCE {
            return Err(Error::Unsupported {
                message: "rectilinear trajectories have no orbital elements".into(),
            });
        }
        Self::new(
            state.semi_major_axis(),
            state.eccentricity(),
            state.inclination(),
            state.ascending_node_longitude(),
            state.argument_of_periapsis(),
            state.mean_anomaly(),
            state.epoch,
            state.center,
            state.frame.clone(),
        )
    }

    pub fn is_hyperbolic(&self) -> bool {
        self.eccentricity > 1.0
    }

    /// Semi-latus rectum a(1 - e²) (km)
    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity)
    }

    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Apoapsis radius (km), `None` for hyperbolic orbits
    pub fn apoapsis(&self) -> Option<f64> {
        (!self.is_hyperbolic()).then(|| self.semi_major_axis * (1.0 + self.eccentricity))
    }

    /// Mean motion (rad/s)
    pub fn mean_motion(&self) -> f64 {
        (self.center.mu / self.semi_major_axis.abs().powi(3)).sqrt()
    }

    /// Orbital period (s), `None` for hyperbolic orbits
    pub fn period(&self) -> Option<f64> {
        (!self.is_hyperbolic()).then(|| std::f64::consts::TAU / self.mean_motion())
    }

    pub fn true_anomaly(&self) -> Result<f64> {
        kepler::true_from_mean(self.mean_anomaly, self.eccentricity)
    }

    /// Rotation from the perifocal frame into the reference frame
    ///
    /// Rz(Ω) · Rx(i) · Rz(ω)
    fn perifocal_rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.ascending_node_longitude)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.inclination)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.argument_of_periapsis)
    }

    pub fn to_state_vector(&self) -> Result<StateVector> {
        let nu = self.true_anomaly()?;
        let e = self.eccentricity;
        let p = self.semi_latus_rectum();
        let r = p / (1.0 + e * nu.cos());
        let sqrt_mu_p = (self.center.mu / p).sqrt();

        let (sin_nu, cos_nu) = nu.sin_cos();
        let r_pqw = Vector3::new(r * cos_nu, r * sin_nu, 0.0);
        let v_pqw = Vector3::new(-sqrt_mu_p * sin_nu, sqrt_mu_p * (e + cos_nu), 0.0);

        let q = self.perifocal_rotation();
        Ok(StateVector::new(
            q * r_pqw,
            q * v_pqw,
            self.epoch,
            self.center,
            self.frame.clone(),
        ))
    }

    /// Two-body transport: advance the mean anomaly by n·Δt
    pub fn at_epoch(&self, epoch: Instant) -> Result<Self> {
        let dt = seconds_between(&self.epoch, &epoch);
        let mut advanced = self.clone();
        advanced.epoch = epoch;
        advanced.mean_anomaly = self.mean_anomaly + self.mean_motion() * dt;
        if !self.is_hyperbolic() {
            advanced.mean_anomaly = normalize_angle(advanced.mean_anomaly);
        }
        Ok(advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::MU_EARTH;
    use approx::assert_relative_eq;

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    fn elements(a: f64, e: f64, i: f64, raan: f64, aop: f64, m: f64) -> Result<KeplerianElements> {
        KeplerianElements::new(a, e, i, raan, aop, m, epoch(), Center::earth(), Frame::ICRF)
    }

    #[test]
    fn test_rejects_invalid_domain() {
        assert!(elements(7000.0, -0.1, 0.1, 0.0, 0.0, 0.0).is_err());
        assert!(elements(0.0, 0.1, 0.1, 0.0, 0.0, 0.0).is_err());
        assert!(elements(-7000.0, 0.1, 0.1, 0.0, 0.0, 0.0).is_err());
        assert!(elements(7000.0, 1.5, 0.1, 0.0, 0.0, 0.0).is_err());
        assert!(elements(7000.0, 1.0, 0.1, 0.0, 0.0, 0.0).is_err());
        assert!(elements(7000.0, 0.1, 4.0, 0.0, 0.0, 0.0).is_err());
        assert!(elements(-7000.0, 1.5, 0.1, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_angles_normalized() {
        let k = elements(7000.0, 0.1, 0.5, -1.0, 7.0, -0.5).unwrap();
        assert_relative_eq!(k.ascending_node_longitude, std::f64::consts::TAU - 1.0);
        assert_relative_eq!(k.argument_of_periapsis, 7.0 - std::f64::consts::TAU);
        assert_relative_eq!(k.mean_anomaly, std::f64::consts::TAU - 0.5);
    }

    #[test]
    fn test_periapsis_state() {
        let k = elements(7000.0, 0.1, 0.0, 0.0, 0.0, 0.0).unwrap();
        let sv = k.to_state_vector().unwrap();
        assert_relative_eq!(sv.position, Vector3::new(6300.0, 0.0, 0.0), epsilon = 1e-9);
        let v_peri = (MU_EARTH * (1.0 + 0.1) / 6300.0).sqrt();
        assert_relative_eq!(sv.velocity, Vector3::new(0.0, v_peri, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip_inclined() {
        let k = elements(
            26_560.0,
            0.2,
            55f64.to_radians(),
            120f64.to_radians(),
            30f64.to_radians(),
            200f64.to_radians(),
        )
        .unwrap();
        let back = KeplerianElements::from_state_vector(&k.to_state_vector().unwrap()).unwrap();
        assert_relative_eq!(back.semi_major_axis, k.semi_major_axis, max_relative = 1e-9);
        assert_relative_eq!(back.eccentricity, k.eccentricity, max_relative = 1e-9);
        assert_relative_eq!(back.inclination, k.inclination, epsilon = 1e-9);
        assert_relative_eq!(back.ascending_node_longitude, k.ascending_node_longitude, epsilon = 1e-9);
        assert_relative_eq!(back.argument_of_periapsis, k.argument_of_periapsis, epsilon = 1e-6);
        assert_relative_eq!(back.mean_anomaly, k.mean_anomaly, epsilon = 1e-6);
    }

    #[test]
    fn test_hyperbolic_round_trip() {
        let k = elements(-20_000.0, 1.4, 0.3, 0.2, 0.1, 0.5).unwrap();
        let sv = k.to_state_vector().unwrap();
        assert!(sv.specific_energy() > 0.0);
        let back = KeplerianElements::from_state_vector(&sv).unwrap();
        assert_relative_eq!(back.semi_major_axis, -20_000.0, max_relative = 1e-9);
        assert_relative_eq!(back.eccentricity, 1.4, max_relative = 1e-9);
        assert_relative_eq!(back.mean_anomaly, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_at_epoch_full_period_returns() {
        let k = elements(7500.0, 0.05, 0.9, 1.0, 2.0, 0.3).unwrap();
        let period = k.period().unwrap();
        let later = k.at_epoch(crate::time::offset(&k.epoch, period)).unwrap();
        assert_relative_eq!(later.mean_anomaly, k.mean_anomaly, epsilon = 1e-9);
        let half = k.at_epoch(crate::time::offset(&k.epoch, 0.5 * period)).unwrap();
        assert_relative_eq!(half.mean_anomaly, k.mean_anomaly + PI, epsilon = 1e-9);
    }
}
