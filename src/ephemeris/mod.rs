//! Ephemeris and frame-orientation collaborator
//!
//! The propagation core never loads kernels itself. Body states and frame
//! orientations come from an [`EphemerisProvider`], which must answer from
//! memory: it is queried from inside the integration loop.
//!
//! [`AnalyticEphemeris`] is a self-contained provider built from mean
//! Keplerian tracks and uniform rotation models.

mod analytic;
mod occultation;

pub use analytic::{AnalyticEphemeris, FrameModel, RotationModel, Track};
pub use occultation::is_occulted;

use crate::body::NaifId;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::orbital::StateVector;
use nalgebra::{UnitQuaternion, Vector3};
use satkit::Instant;

/// Aberration correction applied to an ephemeris query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aberration {
    /// Geometric state
    #[default]
    None,
    /// One-way light time
    LightTime,
    /// Light time and stellar aberration
    LightTimeStellar,
    /// Converged Newtonian light time
    ConvergedNewtonian,
    /// Converged Newtonian light time and stellar aberration
    ConvergedNewtonianStellar,
}

/// Orientation of `frame` relative to `reference_frame` at an epoch
///
/// `rotation` maps coordinates expressed in the reference frame into
/// coordinates in `frame`. `angular_velocity` is the rate of `frame` with
/// respect to the reference, expressed in the reference frame (rad/s).
///
/// The same type records spacecraft attitude, with the body frame as `frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateOrientation {
    pub rotation: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    pub epoch: Instant,
    pub reference_frame: Frame,
    pub frame: Frame,
}

impl StateOrientation {
    pub fn new(
        rotation: UnitQuaternion<f64>,
        angular_velocity: Vector3<f64>,
        epoch: Instant,
        reference_frame: Frame,
        frame: Frame,
    ) -> Self {
        Self {
            rotation,
            angular_velocity,
            epoch,
            reference_frame,
            frame,
        }
    }

    /// No rotation between a frame and itself
    pub fn identity(epoch: Instant, frame: Frame) -> Self {
        Self::new(
            UnitQuaternion::identity(),
            Vector3::zeros(),
            epoch,
            frame.clone(),
            frame,
        )
    }

    /// Orientation of the reference frame relative to `frame`
    pub fn inverse(&self) -> Self {
        Self::new(
            self.rotation.inverse(),
            -(self.rotation * self.angular_velocity),
            self.epoch,
            self.frame.clone(),
            self.reference_frame.clone(),
        )
    }

    /// Chain `self` (A → B) with `next` (B → C) into A → C
    pub fn then(&self, next: &StateOrientation) -> Result<Self> {
        if next.reference_frame != self.frame {
            return Err(Error::FrameMismatch {
                left: self.frame.to_string(),
                right: next.reference_frame.to_string(),
            });
        }
        Ok(Self::new(
            next.rotation * self.rotation,
            self.angular_velocity + self.rotation.inverse() * next.angular_velocity,
            self.epoch,
            self.reference_frame.clone(),
            next.frame.clone(),
        ))
    }

    /// Re-express a state given in the reference frame in `frame`
    ///
    /// r' = q r and v' = q (v - ω × r), so the velocity is the one seen from
    /// the rotating frame.
    pub fn transform(&self, state: &StateVector) -> Result<StateVector> {
        if state.frame != self.reference_frame {
            return Err(Error::FrameMismatch {
                left: state.frame.to_string(),
                right: self.reference_frame.to_string(),
            });
        }
        let position = self.rotation * state.position;
        let velocity =
            self.rotation * (state.velocity - self.angular_velocity.cross(&state.position));
        Ok(StateVector::new(
            position,
            velocity,
            state.epoch,
            state.center,
            self.frame.clone(),
        ))
    }
}

/// Source of body states and frame orientations
pub trait EphemerisProvider: Send + Sync {
    /// State of `target` relative to `observer`, expressed in `frame`
    fn state(
        &self,
        epoch: &Instant,
        observer: NaifId,
        target: NaifId,
        frame: &Frame,
        aberration: Aberration,
    ) -> Result<StateVector>;

    /// Orientation of `to` relative to `from`
    fn orientation(&self, from: &Frame, to: &Frame, epoch: &Instant) -> Result<StateOrientation>;

    /// Provider name for logging
    fn name(&self) -> &'static str {
        "ephemeris"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Center;
    use crate::math::frame_rotation_z;
    use approx::assert_relative_eq;

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    #[test]
    fn test_rotating_frame_velocity() {
        let omega = 1e-3;
        let spin = Frame::new("SPIN");
        let orientation = StateOrientation::new(
            frame_rotation_z(0.0),
            Vector3::new(0.0, 0.0, omega),
            epoch(),
            Frame::ICRF,
            spin.clone(),
        );
        // A point co-rotating with the frame appears at rest
        let r = 1000.0;
        let sv = StateVector::new(
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, omega * r, 0.0),
            epoch(),
            Center::earth(),
            Frame::ICRF,
        );
        let fixed = orientation.transform(&sv).unwrap();
        assert_eq!(fixed.frame, spin);
        assert_relative_eq!(fixed.velocity, Vector3::zeros(), epsilon = 1e-12);

        let back = orientation.inverse().transform(&fixed).unwrap();
        assert_relative_eq!(back.position, sv.position, epsilon = 1e-9);
        assert_relative_eq!(back.velocity, sv.velocity, epsilon = 1e-12);
    }

    #[test]
    fn test_chain_orientations() {
        let a_to_b = StateOrientation::new(
            frame_rotation_z(0.3),
            Vector3::new(0.0, 0.0, 1e-4),
            epoch(),
            Frame::ICRF,
            Frame::new("B"),
        );
        let b_to_c = StateOrientation::new(
            frame_rotation_z(0.5),
            Vector3::new(0.0, 0.0, 2e-4),
            epoch(),
            Frame::new("B"),
            Frame::new("C"),
        );
        let a_to_c = a_to_b.then(&b_to_c).unwrap();
        let direct = frame_rotation_z(0.8);
        assert!(a_to_c.rotation.angle_to(&direct) < 1e-7);
        assert_relative_eq!(a_to_c.angular_velocity.z, 3e-4, epsilon = 1e-15);
        assert!(b_to_c.then(&a_to_b).is_err());
    }

    #[test]
    fn test_transform_rejects_wrong_frame() {
        let orientation = StateOrientation::identity(epoch(), Frame::ICRF);
        let sv = StateVector::placeholder(epoch(), Center::earth(), Frame::ECLIPTIC_J2000);
        assert!(orientation.transform(&sv).is_err());
    }
}
