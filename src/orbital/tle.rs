//! Two-line element sets
//!
//! Parsing and SGP4 propagation are delegated to `satkit`. SGP4 output is in
//! TEME and meters; it is rotated into GCRF (treated as ICRF) and scaled to
//! kilometers before it reaches the rest of the crate.

use super::state_vector::StateVector;
use crate::body::Center;
use crate::error::{Error, Result};
use crate::frame::Frame;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use satkit::Instant;
use std::fmt;

/// A parsed TLE bound to the Earth as center of motion
#[derive(Clone)]
pub struct Tle {
    inner: satkit::TLE,
    center: Center,
}

impl fmt::Debug for Tle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tle")
            .field("epoch", &self.inner.epoch)
            .field("mean_motion_rev_per_day", &self.inner.mean_motion)
            .field("eccentricity", &self.inner.eccen)
            .field("inclination_deg", &self.inner.inclination)
            .finish()
    }
}

impl PartialEq for Tle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.epoch == other.inner.epoch
            && self.inner.mean_motion == other.inner.mean_motion
            && self.inner.eccen == other.inner.eccen
            && self.inner.inclination == other.inner.inclination
            && self.inner.raan == other.inner.raan
            && self.inner.arg_of_perigee == other.inner.arg_of_perigee
            && self.inner.mean_anomaly == other.inner.mean_anomaly
    }
}

impl Tle {
    /// Parse the two data lines of an element set
    pub fn parse(line1: &str, line2: &str) -> Result<Self> {
        match satkit::TLE::load_2line(line1, line2) {
            Ok(inner) => Self::from_satkit(inner),
            Err(e) => {
                log::trace!("Failed to parse TLE: {}", e);
                Err(Error::Tle {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Wrap an already parsed `satkit` element set
    pub fn from_satkit(inner: satkit::TLE) -> Result<Self> {
        if !inner.mean_motion.is_finite() || inner.mean_motion <= 0.0 {
            return Err(Error::Tle {
                message: format!("non-positive mean motion {}", inner.mean_motion),
            });
        }
        if !(0.0..1.0).contains(&inner.eccen) {
            return Err(Error::Tle {
                message: format!("eccentricity {} outside [0, 1)", inner.eccen),
            });
        }
        Ok(Self {
            inner,
            center: Center::earth(),
        })
    }

    pub fn epoch(&self) -> Instant {
        self.inner.epoch
    }

    pub fn center(&self) -> Center {
        self.center
    }

    /// Frame of the states this element set produces
    pub fn frame(&self) -> Frame {
        Frame::ICRF
    }

    /// Mean motion in rev/day as carried by the element set
    pub fn mean_motion(&self) -> f64 {
        self.inner.mean_motion
    }

    pub fn eccentricity(&self) -> f64 {
        self.inner.eccen
    }

    /// Osculating state at `epoch` from SGP4, in ICRF
    pub fn state_at(&self, epoch: &Instant) -> Result<StateVector> {
        let mut tle = self.inner.clone();
        let result = satkit::sgp4::sgp4(&mut tle, &[*epoch]).map_err(|e| Error::Tle {
            message: format!("SGP4 failed: {e:?}"),
        })?;

        let pos = result.pos.column(0);
        let vel = result.vel.column(0);
        let pos_teme = Vector3::new(pos[0], pos[1], pos[2]) / 1000.0;
        let vel_teme = Vector3::new(vel[0], vel[1], vel[2]) / 1000.0;

        let q = satkit::frametransform::qteme2gcrf(epoch);
        let teme_to_gcrf = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k));

        Ok(StateVector::new(
            teme_to_gcrf * pos_teme,
            teme_to_gcrf * vel_teme,
            *epoch,
            self.center,
            self.frame(),
        ))
    }

    pub fn to_state_vector(&self) -> Result<StateVector> {
        self.state_at(&self.epoch())
    }
}
