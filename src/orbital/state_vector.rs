//! Cartesian state vectors
//!
//! Position and velocity of an object relative to a center of motion,
//! expressed in a named frame at an epoch. Every orbital quantity below is
//! derived on demand from those fields.

use crate::body::Center;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::math::{normalize_angle, ZERO_TOLERANCE};
use nalgebra::Vector3;
use satkit::Instant;
use std::f64::consts::TAU;

/// Eccentricities below this are treated as circular
pub const CIRCULAR_TOLERANCE: f64 = 1e-11;

/// Inclinations (rad) below this, or this close to π, are treated as equatorial
pub const EQUATORIAL_TOLERANCE: f64 = 1e-11;

/// Position (km) and velocity (km/s) relative to a center of motion
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub epoch: Instant,
    pub center: Center,
    pub frame: Frame,
}

impl StateVector {
    pub fn new(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        epoch: Instant,
        center: Center,
        frame: Frame,
    ) -> Self {
        Self {
            position,
            velocity,
            epoch,
            center,
            frame,
        }
    }

    /// Zero position and velocity at `epoch`
    ///
    /// Used to pre-fill propagation caches so every slot carries a valid
    /// epoch, center and frame before it is integrated.
    pub fn placeholder(epoch: Instant, center: Center, frame: Frame) -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros(), epoch, center, frame)
    }

    /// Distance from the center (km)
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Speed relative to the center (km/s)
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Specific angular momentum h = r × v (km²/s)
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.position.cross(&self.velocity)
    }

    /// Eccentricity vector e = (v × h)/μ - r/|r|
    pub fn eccentricity_vector(&self) -> Vector3<f64> {
        let r = self.radius();
        if r < ZERO_TOLERANCE {
            return Vector3::zeros();
        }
        self.velocity.cross(&self.angular_momentum()) / self.center.mu - self.position / r
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_vector().norm()
    }

    /// Specific orbital energy v²/2 - μ/r (km²/s²)
    pub fn specific_energy(&self) -> f64 {
        0.5 * self.velocity.norm_squared() - self.center.mu / self.radius()
    }

    /// Semi-major axis from vis-viva (km), negative for hyperbolic orbits
    pub fn semi_major_axis(&self) -> f64 {
        -self.center.mu / (2.0 * self.specific_energy())
    }

    /// Semi-latus rectum h²/μ (km)
    pub fn semi_latus_rectum(&self) -> f64 {
        self.angular_momentum().norm_squared() / self.center.mu
    }

    /// Inclination in [0, π]
    pub fn inclination(&self) -> f64 {
        let h = self.angular_momentum();
        let h_norm = h.norm();
        if h_norm < ZERO_TOLERANCE {
            return 0.0;
        }
        (h.z / h_norm).clamp(-1.0, 1.0).acos()
    }

    /// Whether the orbit plane coincides with the reference XY plane
    pub fn is_equatorial(&self) -> bool {
        let i = self.inclination();
        i < EQUATORIAL_TOLERANCE || (std::f64::consts::PI - i) < EQUATORIAL_TOLERANCE
    }

    pub fn is_circular(&self) -> bool {
        self.eccentricity() < CIRCULAR_TOLERANCE
    }

    /// Ascending node vector ẑ × h
    ///
    /// For equatorial orbits the node is undefined and the +X axis is used.
    pub fn ascending_node_vector(&self) -> Vector3<f64> {
        let h = self.angular_momentum();
        let n = Vector3::new(-h.y, h.x, 0.0);
        if self.is_equatorial() || n.norm() < ZERO_TOLERANCE {
            Vector3::x()
        } else {
            n
        }
    }

    /// Right ascension of the ascending node in [0, 2π), zero for equatorial orbits
    pub fn ascending_node_longitude(&self) -> f64 {
        if self.is_equatorial() {
            return 0.0;
        }
        let n = self.ascending_node_vector();
        normalize_angle(n.y.atan2(n.x))
    }

    /// Argument of periapsis in [0, 2π), zero for circular orbits
    ///
    /// Measured from the ascending node (the +X axis for equatorial orbits)
    /// in the direction of motion, so the quadrant follows the sign of e_z,
    /// or of h_z when the orbit is equatorial.
    pub fn argument_of_periapsis(&self) -> f64 {
        if self.is_circular() {
            return 0.0;
        }
        let h_hat = self.angular_momentum().normalize();
        let n_hat = self.ascending_node_vector().normalize();
        let e = self.eccentricity_vector();
        normalize_angle(n_hat.cross(&e).dot(&h_hat).atan2(n_hat.dot(&e)))
    }

    /// True anomaly in [0, 2π)
    ///
    /// Measured from periapsis; for circular orbits, from the ascending node.
    /// The quadrant follows the sign of r·v.
    pub fn true_anomaly(&self) -> f64 {
        let h = self.angular_momentum();
        if h.norm() < ZERO_TOLERANCE {
            return 0.0;
        }
        let h_hat = h.normalize();
        let reference = if self.is_circular() {
            self.ascending_node_vector().normalize()
        } else {
            self.eccentricity_vector().normalize()
        };
        let r = &self.position;
        normalize_angle(reference.cross(r).dot(&h_hat).atan2(reference.dot(r)))
    }

    /// Eccentric anomaly (elliptic) or hyperbolic anomaly (hyperbolic)
    pub fn eccentric_anomaly(&self) -> f64 {
        super::kepler::eccentric_from_true(self.true_anomaly(), self.eccentricity())
    }

    /// Mean anomaly, in [0, 2π) for closed orbits
    pub fn mean_anomaly(&self) -> f64 {
        super::kepler::mean_from_true(self.true_anomaly(), self.eccentricity())
    }

    /// Mean motion sqrt(μ/|a|³) (rad/s)
    pub fn mean_motion(&self) -> f64 {
        (self.center.mu / self.semi_major_axis().abs().powi(3)).sqrt()
    }

    /// Orbital period (s), `None` for unbound orbits
    pub fn period(&self) -> Option<f64> {
        let a = self.semi_major_axis();
        if a > 0.0 && self.eccentricity() < 1.0 {
            Some(TAU / self.mean_motion())
        } else {
            None
        }
    }

    fn check_compatible(&self, other: &StateVector) -> Result<()> {
        if self.epoch != other.epoch {
            return Err(Error::EpochMismatch);
        }
        if self.frame != other.frame {
            return Err(Error::FrameMismatch {
                left: self.frame.to_string(),
                right: other.frame.to_string(),
            });
        }
        Ok(())
    }

    /// Component-wise sum; epochs and frames must match
    ///
    /// Adding the state of a center relative to its parent moves this state
    /// onto that parent; the caller picks the resulting center.
    pub fn checked_add(&self, other: &StateVector, center: Center) -> Result<StateVector> {
        self.check_compatible(other)?;
        Ok(StateVector::new(
            self.position + other.position,
            self.velocity + other.velocity,
            self.epoch,
            center,
            self.frame.clone(),
        ))
    }

    /// Component-wise difference; epochs and frames must match
    pub fn checked_sub(&self, other: &StateVector, center: Center) -> Result<StateVector> {
        self.check_compatible(other)?;
        Ok(StateVector::new(
            self.position - other.position,
            self.velocity - other.velocity,
            self.epoch,
            center,
            self.frame.clone(),
        ))
    }

    /// Copy with a velocity increment applied (km/s)
    pub fn with_delta_v(&self, delta_v: &Vector3<f64>) -> StateVector {
        let mut state = self.clone();
        state.velocity += delta_v;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::MU_EARTH;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    fn state(r: Vector3<f64>, v: Vector3<f64>) -> StateVector {
        StateVector::new(r, v, epoch(), Center::earth(), Frame::ICRF)
    }

    #[test]
    fn test_circular_equatorial() {
        let r = 7000.0;
        let v = (MU_EARTH / r).sqrt();
        let sv = state(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0));

        assert_relative_eq!(sv.semi_major_axis(), r, max_relative = 1e-12);
        assert!(sv.eccentricity() < 1e-12);
        assert_eq!(sv.inclination(), 0.0);
        assert_eq!(sv.ascending_node_vector(), Vector3::x());
        assert_eq!(sv.ascending_node_longitude(), 0.0);
        assert_eq!(sv.argument_of_periapsis(), 0.0);
        assert_eq!(sv.true_anomaly(), 0.0);
        assert_relative_eq!(sv.specific_energy(), -MU_EARTH / (2.0 * r), max_relative = 1e-12);
    }

    #[test]
    fn test_polar_orbit_node() {
        let r = 7000.0;
        let v = (MU_EARTH / r).sqrt();
        // Crossing the equator northbound along +Y: node on +Y axis
        let sv = state(Vector3::new(0.0, r, 0.0), Vector3::new(0.0, 0.0, v));
        assert_relative_eq!(sv.inclination(), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(sv.ascending_node_longitude(), FRAC_PI_2, epsilon = 1e-12);
        assert!(sv.true_anomaly() < 1e-12 || (TAU - sv.true_anomaly()) < 1e-12);
    }

    #[test]
    fn test_true_anomaly_quadrant_from_radial_velocity() {
        let sv = state(Vector3::new(6800.0, 0.0, 0.0), Vector3::new(0.0, 8.0, 0.0));
        // Starts at periapsis
        assert!(sv.true_anomaly() < 1e-9);

        // Approaching periapsis: r·v < 0 puts ν in (π, 2π)
        let inbound = state(Vector3::new(6800.0, -1000.0, 0.0), Vector3::new(1.0, 7.9, 0.0));
        assert!(inbound.position.dot(&inbound.velocity) < 0.0);
        assert!(inbound.true_anomaly() > PI);
    }

    #[test]
    fn test_retrograde_equatorial_periapsis() {
        // Periapsis on +Y, moving clockwise seen from +Z
        let sv = state(Vector3::new(0.0, 6800.0, 0.0), Vector3::new(8.0, 0.0, 0.0));
        assert_relative_eq!(sv.inclination(), PI, epsilon = 1e-12);
        assert_relative_eq!(sv.argument_of_periapsis(), 1.5 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_period_and_mean_motion() {
        let r = 7000.0;
        let v = (MU_EARTH / r).sqrt();
        let sv = state(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0));
        let expected = TAU * (r.powi(3) / MU_EARTH).sqrt();
        assert_relative_eq!(sv.period().unwrap(), expected, max_relative = 1e-12);

        let escape = state(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, 2.0 * v, 0.0));
        assert!(escape.period().is_none());
        assert!(escape.semi_major_axis() < 0.0);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = state(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.1, 0.2, 0.3));
        let b = state(Vector3::new(1.0, 1.0, 1.0), Vector3::new(0.1, 0.1, 0.1));
        let sum = a.checked_add(&b, Center::earth()).unwrap();
        assert_eq!(sum.position, Vector3::new(2.0, 3.0, 4.0));
        let diff = a.checked_sub(&b, Center::earth()).unwrap();
        assert_relative_eq!(diff.velocity, Vector3::new(0.0, 0.1, 0.2), epsilon = 1e-15);

        let mut other_frame = b.clone();
        other_frame.frame = Frame::ECLIPTIC_J2000;
        assert!(matches!(
            a.checked_add(&other_frame, Center::earth()),
            Err(Error::FrameMismatch { .. })
        ));

        let mut later = b;
        later.epoch = crate::time::offset(&later.epoch, 1.0);
        assert!(matches!(
            a.checked_sub(&later, Center::earth()),
            Err(Error::EpochMismatch)
        ));
    }
}
