//! Solar radiation pressure force model
//!
//! Models the acceleration due to photon momentum from sunlight, with a
//! binary eclipse test against the center of motion and any configured
//! occulting bodies. No penumbra.

use super::ForceModel;
use crate::body::{NaifId, SUN};
use crate::ephemeris::is_occulted;
use crate::error::Result;
use crate::orbital::StateVector;
use crate::propagation::environment::Environment;
use crate::spacecraft::BallisticProperties;
use nalgebra::Vector3;

/// Solar radiation pressure at 1 AU (N/m²)
pub const SOLAR_PRESSURE_1AU: f64 = 4.56e-6;

/// Astronomical unit (km)
pub const AU_KM: f64 = 149_597_870.7;

/// Solar radiation pressure force model
pub struct SolarRadiationPressure {
    environment: Environment,
    ballistic: BallisticProperties,

    /// Bodies tested for eclipses besides the center of motion
    occulters: Vec<NaifId>,

    /// Whether SRP is enabled
    enabled: bool,
}

impl SolarRadiationPressure {
    /// SRP with eclipses by the center of motion only
    pub fn new(environment: Environment, ballistic: BallisticProperties) -> Self {
        Self {
            environment,
            ballistic,
            occulters: Vec::new(),
            enabled: true,
        }
    }

    /// Also test `body` for eclipses
    pub fn with_occulter(mut self, body: NaifId) -> Self {
        if body != SUN && !self.occulters.contains(&body) {
            self.occulters.push(body);
        }
        self
    }

    /// Create disabled (for testing)
    pub fn disabled(environment: Environment, ballistic: BallisticProperties) -> Self {
        Self {
            enabled: false,
            ..Self::new(environment, ballistic)
        }
    }

    /// Position of `body` relative to the state's center
    fn position_of(&self, state: &StateVector, body: NaifId) -> Result<Vector3<f64>> {
        if body == state.center.id {
            return Ok(Vector3::zeros());
        }
        Ok(self
            .environment
            .relative_state(&state.epoch, state.center.id, body, &state.frame)?
            .position)
    }

    /// Whether the Sun's center is hidden from the spacecraft
    pub fn in_shadow(&self, state: &StateVector) -> Result<bool> {
        let sun = self.position_of(state, SUN)?;
        let candidates = std::iter::once(state.center.id).chain(self.occulters.iter().copied());
        for body in candidates {
            if body == SUN {
                continue;
            }
            let radius = self.environment.body(body)?.equatorial_radius;
            if is_occulted(&state.position, &sun, &self.position_of(state, body)?, radius) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl ForceModel for SolarRadiationPressure {
    fn acceleration(&self, state: &StateVector) -> Result<Vector3<f64>> {
        if !self.enabled || self.ballistic.mass <= 0.0 {
            return Ok(Vector3::zeros());
        }
        if self.in_shadow(state)? {
            return Ok(Vector3::zeros());
        }

        // Vector from Sun to satellite
        let sun = self.position_of(state, SUN)?;
        let r_sun_sat = state.position - sun;
        let distance = r_sun_sat.norm();
        if distance <= 0.0 {
            return Ok(Vector3::zeros());
        }

        // Pressure falls off as 1/d²
        let pressure = SOLAR_PRESSURE_1AU * (AU_KM / distance).powi(2);

        // P [N/m²] × Cr A/m [m²/kg] in m/s², scaled to km/s²
        Ok(pressure * self.ballistic.srp_ratio() / 1000.0 * r_sun_sat / distance)
    }

    fn name(&self) -> &'static str {
        "Solar Radiation Pressure"
    }

    fn description(&self) -> &'static str {
        "Acceleration from solar photon pressure"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn relative_magnitude(&self) -> f64 {
        // SRP is typically 1e-7 to 1e-8 of gravity
        0.0001
    }

    fn update_ballistic(&mut self, ballistic: &BallisticProperties) {
        self.ballistic = *ballistic;
    }
}
