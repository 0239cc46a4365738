//! In-memory analytic ephemeris
//!
//! The Sun and Moon come from satkit's low-precision series (Vallado), good
//! to a few hundredths of a degree for the Sun and a few tenths for the
//! Moon. Other bodies move on fixed Keplerian tracks about their parents.
//! The Earth-fixed frame follows satkit's IERS reduction; other frames rotate
//! uniformly about a fixed pole.

use super::{Aberration, EphemerisProvider, StateOrientation};
use crate::body::{BodyArena, NaifId, EARTH, MOON, OMEGA_EARTH, SUN};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::math::{frame_rotation_x, frame_rotation_z};
use crate::orbital::{KeplerianElements, StateVector};
use crate::time::{j2000, offset, seconds_between};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use satkit::Instant;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mean obliquity of the ecliptic at J2000 (rad)
pub const OBLIQUITY_J2000: f64 = 23.439_291_1 * std::f64::consts::PI / 180.0;

/// Half-width of the central difference for position-only series (s)
const DIFFERENCE_STEP: f64 = 30.0;

/// Uniform rotation of a frame relative to ICRF
///
/// The frame's pole is fixed by `pole`, a rotation from ICRF into a frame
/// whose Z axis is the rotation axis; the prime meridian then turns about
/// that axis at `rate` starting from `meridian_at_reference`.
#[derive(Debug, Clone)]
pub struct RotationModel {
    pub pole: UnitQuaternion<f64>,
    /// Prime meridian angle at the reference epoch (rad)
    pub meridian_at_reference: f64,
    /// Rotation rate (rad/s)
    pub rate: f64,
    pub reference_epoch: Instant,
}

impl RotationModel {
    /// A frame with a fixed orientation relative to ICRF
    pub fn fixed(pole: UnitQuaternion<f64>, reference_epoch: Instant) -> Self {
        Self {
            pole,
            meridian_at_reference: 0.0,
            rate: 0.0,
            reference_epoch,
        }
    }

    /// ICRF to frame orientation at `epoch`
    pub fn orientation(&self, epoch: &Instant, frame: &Frame) -> StateOrientation {
        let theta = self.meridian_at_reference + self.rate * seconds_between(&self.reference_epoch, epoch);
        let rotation = frame_rotation_z(theta) * self.pole;
        let angular_velocity = self.pole.inverse() * Vector3::new(0.0, 0.0, self.rate);
        StateOrientation::new(rotation, angular_velocity, *epoch, Frame::ICRF, frame.clone())
    }
}

/// How a frame is oriented relative to ICRF
#[derive(Debug, Clone)]
pub enum FrameModel {
    Uniform(RotationModel),
    /// GCRF to ITRF with precession, nutation, Earth rotation and polar motion
    EarthFixed,
}

impl FrameModel {
    fn orientation(&self, epoch: &Instant, frame: &Frame) -> StateOrientation {
        match self {
            Self::Uniform(model) => model.orientation(epoch, frame),
            Self::EarthFixed => {
                let q = satkit::frametransform::qgcrf2itrf(epoch);
                let rotation = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k));
                let angular_velocity = rotation.inverse() * Vector3::new(0.0, 0.0, OMEGA_EARTH);
                StateOrientation::new(rotation, angular_velocity, *epoch, Frame::ICRF, frame.clone())
            }
        }
    }
}

/// Motion of a body about its parent
#[derive(Debug, Clone)]
pub enum Track {
    /// Two-body transport of fixed elements
    Kepler(KeplerianElements),
    /// Geocentric Moon from satkit's low-precision series
    LowPrecisionMoon,
    /// Earth about the Sun, the negated low-precision geocentric Sun
    LowPrecisionEarth,
}

impl Track {
    /// Position (km) and velocity (km/s) relative to the parent, in ICRF
    fn state(&self, epoch: &Instant) -> Result<(Vector3<f64>, Vector3<f64>)> {
        match self {
            Self::Kepler(elements) => {
                let sv = elements.at_epoch(*epoch)?.to_state_vector()?;
                Ok((sv.position, sv.velocity))
            }
            Self::LowPrecisionMoon => Ok(differentiate(moon_from_earth, epoch)),
            Self::LowPrecisionEarth => Ok(differentiate(|t| -sun_from_earth(t), epoch)),
        }
    }
}

/// Geocentric Sun in GCRF (km)
fn sun_from_earth(epoch: &Instant) -> Vector3<f64> {
    let p = satkit::lpephem::sun::pos_gcrf(epoch);
    Vector3::new(p[0], p[1], p[2]) / 1000.0
}

/// Geocentric Moon in GCRF (km)
fn moon_from_earth(epoch: &Instant) -> Vector3<f64> {
    let p = satkit::lpephem::moon::pos_gcrf(epoch);
    Vector3::new(p[0], p[1], p[2]) / 1000.0
}

/// Position and central-difference velocity of a position series
fn differentiate(position: impl Fn(&Instant) -> Vector3<f64>, epoch: &Instant) -> (Vector3<f64>, Vector3<f64>) {
    let before = position(&offset(epoch, -DIFFERENCE_STEP));
    let after = position(&offset(epoch, DIFFERENCE_STEP));
    (position(epoch), (after - before) / (2.0 * DIFFERENCE_STEP))
}

/// Ephemeris built from body tracks and frame models
#[derive(Debug, Clone)]
pub struct AnalyticEphemeris {
    arena: Arc<BodyArena>,
    tracks: BTreeMap<NaifId, Track>,
    rotations: BTreeMap<String, FrameModel>,
}

impl AnalyticEphemeris {
    /// Empty provider over `arena`; only ICRF-aligned frames are known
    pub fn new(arena: Arc<BodyArena>) -> Self {
        Self {
            arena,
            tracks: BTreeMap::new(),
            rotations: BTreeMap::new(),
        }
    }

    /// Sun-Earth-Moon from satkit, plus the ecliptic, Earth-fixed and
    /// Moon-fixed frames
    pub fn solar_system(arena: Arc<BodyArena>) -> Result<Self> {
        let epoch = j2000()?;
        let mut ephemeris = Self::new(arena);
        ephemeris.insert_track(EARTH, SUN, Track::LowPrecisionEarth)?;
        ephemeris.insert_track(MOON, EARTH, Track::LowPrecisionMoon)?;

        ephemeris.add_rotation(
            Frame::ECLIPTIC_J2000,
            RotationModel::fixed(frame_rotation_x(OBLIQUITY_J2000), epoch),
        );
        ephemeris.rotations.insert(Frame::ITRF93.name().to_string(), FrameModel::EarthFixed);
        ephemeris.add_rotation(
            Frame::from_static("IAU_MOON"),
            RotationModel {
                pole: frame_rotation_x(6.68_f64.to_radians()),
                meridian_at_reference: 38.3213_f64.to_radians(),
                rate: 2.661_699_5e-6,
                reference_epoch: epoch,
            },
        );
        Ok(ephemeris)
    }

    /// Register the Keplerian orbit of `body` about its parent
    ///
    /// The track's center must be the body's parent in the arena and its
    /// frame must be ICRF-aligned.
    pub fn add_track(&mut self, body: NaifId, track: KeplerianElements) -> Result<()> {
        if !track.frame.is_icrf_aligned() {
            return Err(Error::UnknownFrame {
                name: track.frame.to_string(),
            });
        }
        self.insert_track(body, track.center.id, Track::Kepler(track))
    }

    fn insert_track(&mut self, body: NaifId, center: NaifId, track: Track) -> Result<()> {
        let parent = self
            .arena
            .get(body)?
            .parent
            .ok_or_else(|| Error::invalid(format!("root body {body} cannot have a track")))?;
        if center != parent {
            return Err(Error::invalid(format!(
                "track of {body} is centered on {center} but its parent is {parent}"
            )));
        }
        self.tracks.insert(body, track);
        Ok(())
    }

    pub fn add_rotation(&mut self, frame: Frame, model: RotationModel) {
        self.rotations
            .insert(frame.name().to_string(), FrameModel::Uniform(model));
    }

    pub fn arena(&self) -> &Arc<BodyArena> {
        &self.arena
    }

    fn icrf_orientation(&self, frame: &Frame, epoch: &Instant) -> Result<StateOrientation> {
        if frame.is_icrf_aligned() {
            return Ok(StateOrientation::new(
                UnitQuaternion::identity(),
                Vector3::zeros(),
                *epoch,
                Frame::ICRF,
                frame.clone(),
            ));
        }
        self.rotations
            .get(frame.name())
            .map(|model| model.orientation(epoch, frame))
            .ok_or_else(|| Error::UnknownFrame {
                name: frame.to_string(),
            })
    }

    /// Position and velocity of `body` relative to `ancestor`, in ICRF
    fn relative_to_ancestor(
        &self,
        body: NaifId,
        ancestor: NaifId,
        epoch: &Instant,
    ) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        for id in self.arena.lineage(body)? {
            if id == ancestor {
                return Ok((position, velocity));
            }
            let track = self.tracks.get(&id).ok_or_else(|| Error::Unsupported {
                message: format!("no ephemeris track for body {id}"),
            })?;
            let (r, v) = track.state(epoch)?;
            position += r;
            velocity += v;
        }
        Err(Error::NoCommonCenter {
            first: body,
            second: ancestor,
        })
    }
}

impl EphemerisProvider for AnalyticEphemeris {
    fn state(
        &self,
        epoch: &Instant,
        observer: NaifId,
        target: NaifId,
        frame: &Frame,
        aberration: Aberration,
    ) -> Result<StateVector> {
        if aberration != Aberration::None {
            return Err(Error::Unsupported {
                message: format!("{aberration:?} correction in analytic ephemeris"),
            });
        }
        let center = self.arena.center(observer)?;
        let common = self.arena.common_center(observer, target)?;
        let (r_target, v_target) = self.relative_to_ancestor(target, common, epoch)?;
        let (r_observer, v_observer) = self.relative_to_ancestor(observer, common, epoch)?;

        let icrf = StateVector::new(
            r_target - r_observer,
            v_target - v_observer,
            *epoch,
            center,
            Frame::ICRF,
        );
        if frame.is_icrf_aligned() {
            let mut sv = icrf;
            sv.frame = frame.clone();
            return Ok(sv);
        }
        self.icrf_orientation(frame, epoch)?.transform(&icrf)
    }

    fn orientation(&self, from: &Frame, to: &Frame, epoch: &Instant) -> Result<StateOrientation> {
        if from == to {
            return Ok(StateOrientation::identity(*epoch, from.clone()));
        }
        let icrf_to_from = self.icrf_orientation(from, epoch)?;
        let icrf_to_to = self.icrf_orientation(to, epoch)?;
        icrf_to_from.inverse().then(&icrf_to_to)
    }

    fn name(&self) -> &'static str {
        "analytic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::CelestialBody;
    use approx::assert_relative_eq;

    fn provider() -> AnalyticEphemeris {
        let arena = Arc::new(BodyArena::solar_system().unwrap());
        AnalyticEphemeris::solar_system(arena).unwrap()
    }

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    #[test]
    fn test_sun_distance_about_one_au() {
        let eph = provider();
        let sun = eph.state(&epoch(), EARTH, SUN, &Frame::ICRF, Aberration::None).unwrap();
        let au = 149_597_870.7;
        assert!((sun.radius() / au - 1.0).abs() < 0.02);
        assert_eq!(sun.center.id, EARTH);
        // Earth's orbital speed
        assert!((sun.speed() - 29.8).abs() < 0.6, "speed {}", sun.speed());
    }

    #[test]
    fn test_moon_follows_low_precision_series() {
        let eph = provider();
        for year in [2000, 2010, 2026] {
            let t = Instant::from_datetime(year, 6, 1, 0, 0, 0.0).unwrap();
            let moon = eph.state(&t, EARTH, MOON, &Frame::ICRF, Aberration::None).unwrap();
            let p = satkit::lpephem::moon::pos_gcrf(&t);
            let expected = Vector3::new(p[0], p[1], p[2]) / 1000.0;
            assert!((moon.position - expected).norm() < 1e-6);
            assert!(moon.radius() > 356_000.0 && moon.radius() < 407_000.0);

            // Velocity is the derivative of the series
            let later = eph
                .state(&offset(&t, 60.0), EARTH, MOON, &Frame::ICRF, Aberration::None)
                .unwrap();
            let finite = (later.position - moon.position) / 60.0;
            assert!((finite - moon.velocity).norm() < 1e-3);
            assert!(moon.speed() > 0.9 && moon.speed() < 1.1);
        }
    }

    #[test]
    fn test_states_are_antisymmetric() {
        let eph = provider();
        let a = eph.state(&epoch(), MOON, SUN, &Frame::ICRF, Aberration::None).unwrap();
        let b = eph.state(&epoch(), SUN, MOON, &Frame::ICRF, Aberration::None).unwrap();
        assert_relative_eq!(a.position, -b.position, epsilon = 1e-6);
        assert_relative_eq!(a.velocity, -b.velocity, epsilon = 1e-12);
    }

    #[test]
    fn test_sun_in_ecliptic_frame_has_no_latitude() {
        let eph = provider();
        let sun = eph
            .state(&epoch(), EARTH, SUN, &Frame::ECLIPTIC_J2000, Aberration::None)
            .unwrap();
        assert!(sun.position.z.abs() / sun.radius() < 1e-3);
    }

    #[test]
    fn test_earth_fixed_frame_uses_iers_reduction() {
        let eph = provider();
        let orientation = eph.orientation(&Frame::ICRF, &Frame::ITRF93, &epoch()).unwrap();
        let q = satkit::frametransform::qgcrf2itrf(&epoch());
        let expected = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k));
        assert!(orientation.rotation.angle_to(&expected) < 1e-12);

        // Precession moves the pole away from ICRF +Z, but by less than a degree
        let pole = orientation.rotation.inverse() * Vector3::z();
        let tilt = pole.angle(&Vector3::z());
        assert!(tilt > 1e-4 && tilt < 1f64.to_radians(), "tilt {tilt}");
        assert_relative_eq!(orientation.angular_velocity.norm(), OMEGA_EARTH, max_relative = 1e-12);
        assert_relative_eq!(orientation.angular_velocity.normalize(), pole, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_round_trip() {
        let eph = provider();
        let there = eph.orientation(&Frame::ITRF93, &Frame::ECLIPTIC_J2000, &epoch()).unwrap();
        let back = eph.orientation(&Frame::ECLIPTIC_J2000, &Frame::ITRF93, &epoch()).unwrap();
        let composed = there.then(&back).unwrap();
        assert!(composed.rotation.angle() < 1e-7);
        assert_relative_eq!(composed.angular_velocity, Vector3::zeros(), epsilon = 1e-18);
    }

    #[test]
    fn test_kepler_track_for_other_bodies() {
        let mut arena = BodyArena::solar_system().unwrap();
        arena
            .insert(CelestialBody::new(499, "MARS", 42_828.37, 3396.2, 3376.2, Some(SUN), Frame::new("IAU_MARS")).unwrap())
            .unwrap();
        let arena = Arc::new(arena);
        let mut eph = AnalyticEphemeris::solar_system(arena.clone()).unwrap();
        let track = KeplerianElements::new(
            227_939_200.0,
            0.0934,
            0.0323,
            0.865,
            5.0,
            0.34,
            epoch(),
            arena.center(SUN).unwrap(),
            Frame::ICRF,
        )
        .unwrap();
        eph.add_track(499, track.clone()).unwrap();

        let mars = eph.state(&epoch(), SUN, 499, &Frame::ICRF, Aberration::None).unwrap();
        let expected = track.to_state_vector().unwrap();
        assert!((mars.position - expected.position).norm() < 1e-6);

        // Tracks must hang off the arena parent
        let wrong = KeplerianElements::new(1e6, 0.1, 0.1, 0.0, 0.0, 0.0, epoch(), arena.center(EARTH).unwrap(), Frame::ICRF)
            .unwrap();
        assert!(eph.add_track(499, wrong).is_err());
    }

    #[test]
    fn test_rejects_aberration_and_unknown_frames() {
        let eph = provider();
        assert!(matches!(
            eph.state(&epoch(), EARTH, SUN, &Frame::ICRF, Aberration::LightTime),
            Err(Error::Unsupported { .. })
        ));
        assert!(matches!(
            eph.orientation(&Frame::ICRF, &Frame::new("IAU_MARS"), &epoch()),
            Err(Error::UnknownFrame { .. })
        ));
    }
}
