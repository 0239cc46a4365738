//! Orbital parameter representations
//!
//! Four interchangeable descriptions of an orbit share a center of motion,
//! an epoch and a frame:
//!
//! - [`StateVector`]: Cartesian position and velocity
//! - [`KeplerianElements`]: classical elements, singular for e = 0 or i = 0
//! - [`EquinoctialElements`]: modified equinoctial elements, regular there
//! - [`Tle`]: two-line element set propagated by SGP4
//!
//! [`OrbitalParameters`] is the sum type over all of them. Every conversion
//! is a pure function of the source fields.

pub mod equinoctial;
pub mod kepler;
pub mod keplerian;
pub mod state_vector;
pub mod tle;

pub use equinoctial::EquinoctialElements;
pub use keplerian::KeplerianElements;
pub use state_vector::StateVector;
pub use tle::Tle;

use crate::body::Center;
use crate::ephemeris::EphemerisProvider;
use crate::error::Result;
use crate::frame::Frame;
use satkit::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum OrbitalParameters {
    StateVector(StateVector),
    Keplerian(KeplerianElements),
    Equinoctial(EquinoctialElements),
    Tle(Tle),
}

impl From<StateVector> for OrbitalParameters {
    fn from(value: StateVector) -> Self {
        Self::StateVector(value)
    }
}

impl From<KeplerianElements> for OrbitalParameters {
    fn from(value: KeplerianElements) -> Self {
        Self::Keplerian(value)
    }
}

impl From<EquinoctialElements> for OrbitalParameters {
    fn from(value: EquinoctialElements) -> Self {
        Self::Equinoctial(value)
    }
}

impl From<Tle> for OrbitalParameters {
    fn from(value: Tle) -> Self {
        Self::Tle(value)
    }
}

impl OrbitalParameters {
    pub fn center(&self) -> Center {
        match self {
            Self::StateVector(sv) => sv.center,
            Self::Keplerian(k) => k.center,
            Self::Equinoctial(eq) => eq.center,
            Self::Tle(tle) => tle.center(),
        }
    }

    pub fn epoch(&self) -> Instant {
        match self {
            Self::StateVector(sv) => sv.epoch,
            Self::Keplerian(k) => k.epoch,
            Self::Equinoctial(eq) => eq.epoch,
            Self::Tle(tle) => tle.epoch(),
        }
    }

    pub fn frame(&self) -> Frame {
        match self {
            Self::StateVector(sv) => sv.frame.clone(),
            Self::Keplerian(k) => k.frame.clone(),
            Self::Equinoctial(eq) => eq.frame.clone(),
            Self::Tle(tle) => tle.frame(),
        }
    }

    /// Cartesian state; the identity for a state vector
    pub fn to_state_vector(&self) -> Result<StateVector> {
        match self {
            Self::StateVector(sv) => Ok(sv.clone()),
            Self::Keplerian(k) => k.to_state_vector(),
            Self::Equinoctial(eq) => Ok(eq.to_state_vector()),
            Self::Tle(tle) => tle.to_state_vector(),
        }
    }

    pub fn to_keplerian(&self) -> Result<KeplerianElements> {
        match self {
            Self::Keplerian(k) => Ok(k.clone()),
            Self::Equinoctial(eq) => eq.to_keplerian(),
            Self::StateVector(sv) => KeplerianElements::from_state_vector(sv),
            Self::Tle(tle) => KeplerianElements::from_state_vector(&tle.to_state_vector()?),
        }
    }

    pub fn to_equinoctial(&self) -> Result<EquinoctialElements> {
        match self {
            Self::Equinoctial(eq) => Ok(eq.clone()),
            Self::Keplerian(k) => EquinoctialElements::from_keplerian(k),
            Self::StateVector(sv) => EquinoctialElements::from_state_vector(sv),
            Self::Tle(tle) => EquinoctialElements::from_state_vector(&tle.to_state_vector()?),
        }
    }

    /// Transport to `epoch`
    ///
    /// Element sets and state vectors follow the unperturbed two-body orbit
    /// and keep their representation. A TLE is re-evaluated with SGP4 and
    /// yields the osculating state vector at `epoch`.
    pub fn at_epoch(&self, epoch: Instant) -> Result<OrbitalParameters> {
        Ok(match self {
            Self::StateVector(sv) => Self::StateVector(
                KeplerianElements::from_state_vector(sv)?
                    .at_epoch(epoch)?
                    .to_state_vector()?,
            ),
            Self::Keplerian(k) => Self::Keplerian(k.at_epoch(epoch)?),
            Self::Equinoctial(eq) => Self::Equinoctial(eq.at_epoch(epoch)?),
            Self::Tle(tle) => Self::StateVector(tle.state_at(&epoch)?),
        })
    }

    /// Express in `frame` using the provider's frame orientation at the epoch
    ///
    /// The result is always a state vector: element sets are only defined
    /// relative to the frame they were built in.
    pub fn to_frame(&self, frame: &Frame, provider: &dyn EphemerisProvider) -> Result<StateVector> {
        let sv = self.to_state_vector()?;
        if &sv.frame == frame {
            return Ok(sv);
        }
        let orientation = provider.orientation(&sv.frame, frame, &sv.epoch)?;
        orientation.transform(&sv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::MU_EARTH;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use proptest::prelude::*;

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    #[test]
    fn test_state_vector_identity() {
        let sv = StateVector::new(
            Vector3::new(6800.0, 0.0, 0.0),
            Vector3::new(0.0, 8.0, 0.0),
            epoch(),
            Center::earth(),
            Frame::ICRF,
        );
        let params = OrbitalParameters::from(sv.clone());
        assert_eq!(params.to_state_vector().unwrap(), sv);
        assert_eq!(params.center(), Center::earth());
        assert_eq!(params.frame(), Frame::ICRF);
    }

    #[test]
    fn test_at_epoch_preserves_variant() {
        let sv = StateVector::new(
            Vector3::new(6800.0, 0.0, 0.0),
            Vector3::new(0.0, 8.0, 0.0),
            epoch(),
            Center::earth(),
            Frame::ICRF,
        );
        let later = crate::time::offset(&sv.epoch, 600.0);
        let params = OrbitalParameters::from(sv.clone()).at_epoch(later).unwrap();
        let moved = params.to_state_vector().unwrap();
        assert!(matches!(params, OrbitalParameters::StateVector(_)));
        assert_eq!(moved.epoch, later);
        // Energy and angular momentum are invariants of the two-body orbit
        assert_relative_eq!(moved.specific_energy(), sv.specific_energy(), max_relative = 1e-9);
        assert_relative_eq!(moved.angular_momentum(), sv.angular_momentum(), max_relative = 1e-9);
        assert!((moved.position - sv.position).norm() > 1000.0);
    }

    #[test]
    fn test_equinoctial_via_enum() {
        let k = KeplerianElements::new(
            8000.0,
            0.01,
            0.2,
            1.0,
            2.0,
            3.0,
            epoch(),
            Center::earth(),
            Frame::ICRF,
        )
        .unwrap();
        let params = OrbitalParameters::from(k.clone());
        let eq = params.to_equinoctial().unwrap();
        let back = OrbitalParameters::from(eq).to_keplerian().unwrap();
        assert_relative_eq!(back.semi_major_axis, k.semi_major_axis, max_relative = 1e-12);
        assert_relative_eq!(back.eccentricity, k.eccentricity, max_relative = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_keplerian_round_trip(
            a in 6600.0f64..60_000.0,
            e in 0.01f64..0.9,
            i in 0.05f64..3.05,
            raan in 0.0f64..6.28,
            aop in 0.0f64..6.28,
            m in 0.0f64..6.28,
        ) {
            let k = KeplerianElements::new(a, e, i, raan, aop, m, epoch(), Center::new(399, MU_EARTH), Frame::ICRF).unwrap();
            let back = OrbitalParameters::from(k.clone())
                .to_state_vector()
                .and_then(|sv| OrbitalParameters::from(sv).to_keplerian())
                .unwrap();

            let angle_diff = |x: f64, y: f64| {
                let d = (x - y).rem_euclid(std::f64::consts::TAU);
                d.min(std::f64::consts::TAU - d)
            };
            prop_assert!(((back.semi_major_axis - a) / a).abs() < 1e-9);
            prop_assert!(((back.eccentricity - e) / e).abs() < 1e-9);
            prop_assert!(angle_diff(back.inclination, k.inclination) < 1e-6);
            prop_assert!(angle_diff(back.ascending_node_longitude, k.ascending_node_longitude) < 1e-6);
            prop_assert!(angle_diff(back.argument_of_periapsis, k.argument_of_periapsis) < 1e-6);
            prop_assert!(angle_diff(back.mean_anomaly, k.mean_anomaly) < 1e-6);
        }
    }
}
