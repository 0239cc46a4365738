//! Celestial bodies stored in a flat arena
//!
//! Bodies are keyed by their NAIF identifier. Parent/satellite links are
//! identifier relations resolved through [`BodyArena`], never owning
//! references, so the body tree has no reference cycles.

use crate::ephemeris::{Aberration, EphemerisProvider};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::propagation::atmosphere::{AtmosphereModel, Tabulated};
use crate::propagation::forces::GravityField;
use satkit::Instant;
use std::collections::BTreeMap;
use std::sync::Arc;

/// NAIF integer identifier of a body
pub type NaifId = i32;

pub const SUN: NaifId = 10;
pub const MOON: NaifId = 301;
pub const EARTH: NaifId = 399;

/// Earth's gravitational parameter (km³/s²)
pub const MU_EARTH: f64 = 3.986004418e5;

/// Earth's equatorial radius (km)
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.1366;

/// Earth's polar radius (km)
pub const EARTH_POLAR_RADIUS_KM: f64 = 6356.7519;

/// Earth's rotation rate (rad/s)
pub const OMEGA_EARTH: f64 = 7.2921150e-5;

/// Sun's gravitational parameter (km³/s²)
pub const MU_SUN: f64 = 1.32712440041e11;

/// Moon's gravitational parameter (km³/s²)
pub const MU_MOON: f64 = 4.902800066e3;

/// Identifier and gravitational parameter of a center of motion
///
/// This is a value copy taken from the arena; it carries everything the
/// closed-form conversions need without pointing back into the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    pub id: NaifId,
    /// Gravitational parameter (km³/s²)
    pub mu: f64,
}

impl Center {
    pub fn new(id: NaifId, mu: f64) -> Self {
        Self { id, mu }
    }

    pub fn earth() -> Self {
        Self::new(EARTH, MU_EARTH)
    }
}

/// A gravitating body
#[derive(Debug, Clone)]
pub struct CelestialBody {
    pub id: NaifId,
    pub name: String,
    /// Gravitational parameter (km³/s²)
    pub mu: f64,
    /// Equatorial radius (km)
    pub equatorial_radius: f64,
    /// Polar radius (km)
    pub polar_radius: f64,
    /// Center of motion of this body, `None` for the root
    pub parent: Option<NaifId>,
    /// Body-fixed rotating frame
    pub fixed_frame: Frame,
    pub atmosphere: Option<Arc<dyn AtmosphereModel>>,
    pub geopotential: Option<Arc<GravityField>>,
}

impl CelestialBody {
    pub fn new(
        id: NaifId,
        name: impl Into<String>,
        mu: f64,
        equatorial_radius: f64,
        polar_radius: f64,
        parent: Option<NaifId>,
        fixed_frame: Frame,
    ) -> Result<Self> {
        if mu < 0.0 {
            return Err(Error::invalid(format!("body {id} has negative GM")));
        }
        if equatorial_radius < 0.0 || polar_radius < 0.0 {
            return Err(Error::invalid(format!("body {id} has a negative radius")));
        }
        Ok(Self {
            id,
            name: name.into(),
            mu,
            equatorial_radius,
            polar_radius,
            parent,
            fixed_frame,
            atmosphere: None,
            geopotential: None,
        })
    }

    /// Attach an atmosphere density model
    pub fn with_atmosphere(mut self, atmosphere: Arc<dyn AtmosphereModel>) -> Self {
        self.atmosphere = Some(atmosphere);
        self
    }

    /// Attach a spherical-harmonics gravity field
    pub fn with_geopotential(mut self, field: impl Into<GravityField>) -> Self {
        self.geopotential = Some(Arc::new(field.into()));
        self
    }

    pub fn center(&self) -> Center {
        Center::new(self.id, self.mu)
    }

    /// Flattening of the reference ellipsoid
    pub fn flattening(&self) -> f64 {
        if self.equatorial_radius > 0.0 {
            (self.equatorial_radius - self.polar_radius) / self.equatorial_radius
        } else {
            0.0
        }
    }

    /// Ellipsoid radius at a geocentric latitude (radians)
    pub fn radius_at_latitude(&self, latitude: f64) -> f64 {
        let a = self.equatorial_radius;
        let b = self.polar_radius;
        let (s, c) = latitude.sin_cos();
        let denom = ((b * c).powi(2) + (a * s).powi(2)).sqrt();
        if denom > 0.0 {
            a * b / denom
        } else {
            a
        }
    }
}

/// Flat table of bodies keyed by NAIF id
#[derive(Debug, Clone, Default)]
pub struct BodyArena {
    bodies: BTreeMap<NaifId, CelestialBody>,
}

impl BodyArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sun, Earth and Moon with Earth's standard atmosphere table attached
    pub fn solar_system() -> Result<Self> {
        let mut arena = Self::new();
        arena.insert(CelestialBody::new(
            SUN,
            "SUN",
            MU_SUN,
            695_700.0,
            695_700.0,
            None,
            Frame::from_static("IAU_SUN"),
        )?)?;
        arena.insert(
            CelestialBody::new(
                EARTH,
                "EARTH",
                MU_EARTH,
                EARTH_EQUATORIAL_RADIUS_KM,
                EARTH_POLAR_RADIUS_KM,
                Some(SUN),
                Frame::ITRF93,
            )?
            .with_atmosphere(Arc::new(Tabulated::standard())),
        )?;
        arena.insert(CelestialBody::new(
            MOON,
            "MOON",
            MU_MOON,
            1737.4,
            1737.4,
            Some(EARTH),
            Frame::from_static("IAU_MOON"),
        )?)?;
        Ok(arena)
    }

    /// Register a body; its parent, if any, must already be present
    pub fn insert(&mut self, body: CelestialBody) -> Result<()> {
        if let Some(parent) = body.parent {
            if !self.bodies.contains_key(&parent) {
                return Err(Error::UnknownBody { id: parent });
            }
        }
        self.bodies.insert(body.id, body);
        Ok(())
    }

    /// Replace a body in place (e.g. to attach a gravity field)
    pub fn update(&mut self, id: NaifId, f: impl FnOnce(CelestialBody) -> CelestialBody) -> Result<()> {
        let body = self.bodies.remove(&id).ok_or(Error::UnknownBody { id })?;
        self.bodies.insert(id, f(body));
        Ok(())
    }

    pub fn get(&self, id: NaifId) -> Result<&CelestialBody> {
        self.bodies.get(&id).ok_or(Error::UnknownBody { id })
    }

    pub fn contains(&self, id: NaifId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn center(&self, id: NaifId) -> Result<Center> {
        self.get(id).map(CelestialBody::center)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CelestialBody> {
        self.bodies.values()
    }

    /// Bodies whose center of motion is `id`
    pub fn satellites(&self, id: NaifId) -> impl Iterator<Item = &CelestialBody> {
        self.bodies.values().filter(move |b| b.parent == Some(id))
    }

    /// `id` followed by its chain of parents up to the root
    pub fn lineage(&self, id: NaifId) -> Result<Vec<NaifId>> {
        let mut chain = vec![id];
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            if chain.contains(&parent) {
                return Err(Error::invalid(format!("body tree has a cycle through {parent}")));
            }
            chain.push(parent);
            current = self.get(parent)?;
        }
        Ok(chain)
    }

    /// Closest body both `a` and `b` move around (either may be the answer itself)
    pub fn common_center(&self, a: NaifId, b: NaifId) -> Result<NaifId> {
        let lineage_a = self.lineage(a)?;
        let lineage_b = self.lineage(b)?;
        lineage_a
            .iter()
            .find(|id| lineage_b.contains(id))
            .copied()
            .ok_or(Error::NoCommonCenter { first: a, second: b })
    }

    /// Density of the atmosphere attached to `id` at `altitude_km`, if any
    pub fn atmospheric_density(&self, id: NaifId, altitude_km: f64, epoch: &Instant) -> Result<Option<f64>> {
        let body = self.get(id)?;
        Ok(body
            .atmosphere
            .as_ref()
            .map(|model| model.density(altitude_km, epoch).rho))
    }

    /// Density of the atmosphere attached to `id` over a body-fixed point
    pub fn atmospheric_density_at(
        &self,
        id: NaifId,
        altitude_km: f64,
        latitude: f64,
        longitude: f64,
        epoch: &Instant,
    ) -> Result<Option<f64>> {
        let body = self.get(id)?;
        Ok(body
            .atmosphere
            .as_ref()
            .map(|model| model.density_at(altitude_km, latitude, longitude, epoch).rho))
    }

    /// Laplace sphere-of-influence radius (km), `None` for the root body
    ///
    /// Uses the semi-major axis of the body's orbit about its parent at
    /// `epoch`, or the current distance if that orbit is unbound.
    pub fn sphere_of_influence(
        &self,
        id: NaifId,
        provider: &dyn EphemerisProvider,
        epoch: &Instant,
    ) -> Result<Option<f64>> {
        let body = self.get(id)?;
        let Some(parent_id) = body.parent else {
            return Ok(None);
        };
        let parent = self.get(parent_id)?;
        if parent.mu <= 0.0 {
            return Ok(None);
        }
        let state = provider.state(epoch, parent_id, id, &Frame::ICRF, Aberration::None)?;
        let sma = state.semi_major_axis();
        let distance = if sma > 0.0 { sma } else { state.position.norm() };
        Ok(Some(distance * (body.mu / parent.mu).powf(0.4)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::AnalyticEphemeris;
    use approx::assert_relative_eq;

    #[test]
    fn test_solar_system_tree() {
        let arena = BodyArena::solar_system().unwrap();
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.lineage(MOON).unwrap(), vec![MOON, EARTH, SUN]);
        let satellites: Vec<NaifId> = arena.satellites(EARTH).map(|b| b.id).collect();
        assert_eq!(satellites, vec![MOON]);
    }

    #[test]
    fn test_sphere_of_influence_radii() {
        let arena = Arc::new(BodyArena::solar_system().unwrap());
        let ephemeris = AnalyticEphemeris::solar_system(arena.clone()).unwrap();
        let epoch = Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap();

        let moon = arena.sphere_of_influence(MOON, &ephemeris, &epoch).unwrap().unwrap();
        let orbit = ephemeris.state(&epoch, EARTH, MOON, &Frame::ICRF, Aberration::None).unwrap();
        assert_relative_eq!(moon, orbit.semi_major_axis() * (MU_MOON / MU_EARTH).powf(0.4), max_relative = 1e-12);
        // About 66,000 km for the Moon
        assert!(moon > 62_000.0 && moon < 70_000.0, "lunar radius {moon}");

        let earth = arena.sphere_of_influence(EARTH, &ephemeris, &epoch).unwrap().unwrap();
        assert!(earth > 0.9e6 && earth < 0.96e6, "terrestrial radius {earth}");
        assert_eq!(arena.sphere_of_influence(SUN, &ephemeris, &epoch).unwrap(), None);
    }

    #[test]
    fn test_common_center() {
        let arena = BodyArena::solar_system().unwrap();
        assert_eq!(arena.common_center(MOON, EARTH).unwrap(), EARTH);
        assert_eq!(arena.common_center(MOON, SUN).unwrap(), SUN);
        assert_eq!(arena.common_center(MOON, MOON).unwrap(), MOON);
    }

    #[test]
    fn test_no_common_center() {
        let mut arena = BodyArena::solar_system().unwrap();
        arena
            .insert(
                CelestialBody::new(9001, "ROGUE", 1.0, 1.0, 1.0, None, Frame::new("ROGUE_FIXED"))
                    .unwrap(),
            )
            .unwrap();
        assert!(matches!(
            arena.common_center(9001, MOON),
            Err(Error::NoCommonCenter { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_parent() {
        let mut arena = BodyArena::new();
        let body = CelestialBody::new(301, "MOON", MU_MOON, 1737.4, 1737.4, Some(EARTH), Frame::new("IAU_MOON"))
            .unwrap();
        assert!(matches!(arena.insert(body), Err(Error::UnknownBody { id: EARTH })));
    }

    #[test]
    fn test_ellipsoid_radius() {
        let arena = BodyArena::solar_system().unwrap();
        let earth = arena.get(EARTH).unwrap();
        assert!((earth.radius_at_latitude(0.0) - EARTH_EQUATORIAL_RADIUS_KM).abs() < 1e-9);
        assert!((earth.radius_at_latitude(std::f64::consts::FRAC_PI_2) - EARTH_POLAR_RADIUS_KM).abs() < 1e-9);
        assert!(arena.atmospheric_density(EARTH, 400.0, &Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()).unwrap().unwrap() > 0.0);
        assert!(arena.atmospheric_density(MOON, 10.0, &Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()).unwrap().is_none());
    }
}
