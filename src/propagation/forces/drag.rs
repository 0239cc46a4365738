//! Drag in a body's atmosphere
//!
//! a = -½ ρ |v_rel|² (Cd A / m) v̂_rel, with ρ from the atmosphere attached
//! to the body and v_rel measured against an atmosphere that co-rotates
//! with it.

use super::ForceModel;
use crate::body::NaifId;
use crate::error::Result;
use crate::orbital::StateVector;
use crate::propagation::environment::Environment;
use crate::spacecraft::BallisticProperties;
use nalgebra::Vector3;

/// ρ [kg/m³] × v² [km²/s²] × A/m [m²/kg] gives 10³ km/s²
const DRAG_UNITS: f64 = 1.0e3;

/// Atmospheric drag from one body's atmosphere
pub struct AtmosphericDrag {
    environment: Environment,
    body: NaifId,
    ballistic: BallisticProperties,

    /// Whether drag is currently enabled
    enabled: bool,

    /// Below this altitude (km) the spacecraft is considered re-entered
    min_altitude: f64,

    /// Top of the atmosphere model (km)
    max_altitude: f64,
}

impl AtmosphericDrag {
    /// Drag in the atmosphere attached to `body`
    ///
    /// A body without an atmosphere model yields a model that is disabled.
    pub fn new(environment: Environment, body: NaifId, ballistic: BallisticProperties) -> Result<Self> {
        let max_altitude = environment
            .body(body)?
            .atmosphere
            .as_ref()
            .map(|model| model.ceiling_km());
        if max_altitude.is_none() {
            log::warn!("Body {} has no atmosphere model; drag disabled", body);
        }
        Ok(Self {
            environment,
            body,
            ballistic,
            enabled: max_altitude.is_some(),
            min_altitude: 0.0,
            max_altitude: max_altitude.unwrap_or(0.0),
        })
    }

    /// Restrict drag to `[min_altitude, max_altitude]` km
    pub fn with_limits(mut self, min_altitude: f64, max_altitude: f64) -> Self {
        self.min_altitude = min_altitude;
        self.max_altitude = max_altitude.min(self.max_altitude);
        self
    }

    /// Enable or disable drag
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn ballistic(&self) -> &BallisticProperties {
        &self.ballistic
    }

    /// Position and velocity relative to the drag body, in the state's frame
    fn relative_to_body(&self, state: &StateVector) -> Result<(Vector3<f64>, Vector3<f64>)> {
        if state.center.id == self.body {
            return Ok((state.position, state.velocity));
        }
        let body = self
            .environment
            .relative_state(&state.epoch, state.center.id, self.body, &state.frame)?;
        Ok((state.position - body.position, state.velocity - body.velocity))
    }
}

impl ForceModel for AtmosphericDrag {
    fn acceleration(&self, state: &StateVector) -> Result<Vector3<f64>> {
        if !self.enabled || self.ballistic.mass <= 0.0 {
            return Ok(Vector3::zeros());
        }

        let (position, velocity) = self.relative_to_body(state)?;
        let body = self.environment.body(self.body)?;
        let r = position.norm();

        // The ellipsoid never rises above the equator, so this bounds the altitude
        if r - body.equatorial_radius > self.max_altitude {
            return Ok(Vector3::zeros());
        }

        let orientation =
            self.environment
                .ephemeris
                .orientation(&state.frame, &body.fixed_frame, &state.epoch)?;
        let fixed = orientation.rotation * position;
        let latitude = (fixed.z / r).asin();
        let longitude = fixed.y.atan2(fixed.x);
        let altitude = r - body.radius_at_latitude(latitude);
        if altitude < self.min_altitude || altitude > self.max_altitude {
            return Ok(Vector3::zeros());
        }

        let rho = self
            .environment
            .arena
            .atmospheric_density_at(self.body, altitude, latitude, longitude, &state.epoch)?
            .unwrap_or(0.0);
        if rho <= 0.0 {
            return Ok(Vector3::zeros());
        }

        // Atmosphere co-rotates with the body: subtract ω × r
        let v_rel = velocity - orientation.angular_velocity.cross(&position);
        let v_rel_mag = v_rel.norm();
        if v_rel_mag <= 0.0 {
            return Ok(Vector3::zeros());
        }

        let accel_mag = -0.5 * rho * v_rel_mag * v_rel_mag * self.ballistic.drag_ratio() * DRAG_UNITS;
        Ok(accel_mag * v_rel / v_rel_mag)
    }

    fn name(&self) -> &'static str {
        "Atmospheric Drag"
    }

    fn description(&self) -> &'static str {
        "Drag against the co-rotating atmosphere"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn relative_magnitude(&self) -> f64 {
        0.001
    }

    fn update_ballistic(&mut self, ballistic: &BallisticProperties) {
        self.ballistic = *ballistic;
    }
}
