//! Configuration for settings-driven propagation
//!
//! Settings select the force set and step; they are plain data so they can
//! be stored as JSON next to a scenario.

use super::atmosphere::AtmosphereModelType;
use super::environment::Environment;
use super::forces::{
    AtmosphericDrag, CompositeForce, GravitationalAcceleration, GravityField, SolarRadiationPressure,
};
use super::propagator::Propagator;
use crate::body::{NaifId, EARTH, MOON, SUN};
use crate::error::{Error, Result};
use crate::spacecraft::Spacecraft;
use crate::time::Window;
use serde::{Deserialize, Serialize};

/// Force and integration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationSettings {
    /// Integration step (s)
    pub step_seconds: f64,
    /// Drag in the central body's atmosphere
    pub include_drag: bool,
    pub include_srp: bool,
    /// Third bodies with point-mass gravity
    pub additional_bodies: Vec<NaifId>,
    /// Degree and order of the central field; 0 for point mass
    pub geopotential_degree: usize,
    /// Switch centers at sphere-of-influence boundaries
    pub recenter: bool,
    /// Replace the central body's atmosphere model
    pub atmosphere: Option<AtmosphereModelType>,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            step_seconds: 10.0,
            include_drag: false,
            include_srp: false,
            additional_bodies: Vec::new(),
            geopotential_degree: 0,
            recenter: true,
            atmosphere: None,
        }
    }
}

impl PropagationSettings {
    /// Central point mass only, 1 s step
    pub fn two_body() -> Self {
        Self {
            step_seconds: 1.0,
            ..Default::default()
        }
    }

    /// Earth field, drag, SRP, Sun and Moon
    pub fn low_earth_orbit() -> Self {
        Self {
            step_seconds: 10.0,
            include_drag: true,
            include_srp: true,
            additional_bodies: vec![SUN, MOON],
            geopotential_degree: 4,
            recenter: true,
            atmosphere: None,
        }
    }

    /// Parse and validate JSON settings; missing fields take defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text).map_err(|e| Error::Settings {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Settings {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.step_seconds > 0.0 && self.step_seconds.is_finite()) {
            return Err(Error::invalid(format!(
                "step must be positive, got {} s",
                self.step_seconds
            )));
        }
        if self.geopotential_degree == 1 {
            return Err(Error::invalid("geopotential degree must be 0 or at least 2"));
        }
        for (i, body) in self.additional_bodies.iter().enumerate() {
            if self.additional_bodies[..i].contains(body) {
                return Err(Error::invalid(format!("body {body} listed twice")));
            }
        }
        Ok(())
    }

    /// Environment with the models these settings ask for attached to `center`
    ///
    /// satkit's JGM3 field is attached to an Earth center that has none;
    /// other bodies without a field fall back to point mass.
    pub fn prepare_environment(&self, environment: &Environment, center: NaifId) -> Result<Environment> {
        let mut environment = environment.clone();
        if let (Some(kind), true) = (self.atmosphere, self.include_drag) {
            log::debug!("Using {} atmosphere for body {}", kind.name(), center);
            environment = environment.with_body(center, |b| b.with_atmosphere(kind.create()))?;
        }
        if self.geopotential_degree >= 2 && environment.body(center)?.geopotential.is_none() {
            if center == EARTH {
                environment = environment.with_body(center, |b| b.with_geopotential(GravityField::Jgm3))?;
            } else {
                log::warn!("Body {} has no geopotential; using point mass", center);
            }
        }
        Ok(environment)
    }

    /// Force set for `spacecraft`, centered on its initial orbit's body
    pub fn build_forces(&self, environment: &Environment, spacecraft: &Spacecraft) -> Result<CompositeForce> {
        let center = spacecraft.initial_orbit.center().id;
        let ballistic = spacecraft.ballistic();
        let degree = self.geopotential_degree;

        let mut forces = CompositeForce::new();
        forces.add(Box::new(if degree >= 2 {
            GravitationalAcceleration::harmonics(environment.clone(), center, degree, degree)?
        } else {
            GravitationalAcceleration::point_mass(environment.clone(), center)?
        }));

        for &body in self.additional_bodies.iter().filter(|&&b| b != center) {
            forces.add(Box::new(GravitationalAcceleration::point_mass(
                environment.clone(),
                body,
            )?));
        }

        if self.include_drag {
            forces.add(Box::new(AtmosphericDrag::new(environment.clone(), center, ballistic)?));
        }

        if self.include_srp {
            let srp = self
                .additional_bodies
                .iter()
                .fold(SolarRadiationPressure::new(environment.clone(), ballistic), |srp, &b| {
                    srp.with_occulter(b)
                });
            forces.add(Box::new(srp));
        }

        Ok(forces)
    }

    pub fn build_propagator(
        &self,
        window: Window,
        spacecraft: &Spacecraft,
        environment: Environment,
    ) -> Result<Propagator> {
        Propagator::new(window, spacecraft, environment, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Center;
    use crate::frame::Frame;
    use crate::orbital::StateVector;
    use nalgebra::Vector3;
    use satkit::Instant;

    fn spacecraft() -> Spacecraft {
        let epoch = Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap();
        let orbit = StateVector::new(
            Vector3::new(6800.0, 0.0, 0.0),
            Vector3::new(0.0, 7.66, 0.0),
            epoch,
            Center::earth(),
            Frame::ICRF,
        );
        Spacecraft::new("settings", -7, 100.0, orbit).unwrap()
    }

    #[test]
    fn test_empty_json_is_default() {
        let settings = PropagationSettings::from_json("{}").unwrap();
        assert_eq!(settings, PropagationSettings::default());
    }

    #[test]
    fn test_partial_json() {
        let settings = PropagationSettings::from_json(
            r#"{ "step_seconds": 2.5, "include_drag": true, "additional_bodies": [10, 301], "atmosphere": "exponential" }"#,
        )
        .unwrap();
        assert_eq!(settings.step_seconds, 2.5);
        assert!(settings.include_drag);
        assert!(!settings.include_srp);
        assert_eq!(settings.additional_bodies, vec![SUN, MOON]);
        assert_eq!(settings.atmosphere, Some(AtmosphereModelType::Exponential));

        let again = PropagationSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(again, settings);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            PropagationSettings::from_json("{ \"step_seconds\": \"fast\" }"),
            Err(Error::Settings { .. })
        ));
        assert!(matches!(
            PropagationSettings::from_json("{ \"step_seconds\": 0.0 }"),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_validate() {
        let mut settings = PropagationSettings::two_body();
        assert!(settings.validate().is_ok());
        settings.geopotential_degree = 1;
        assert!(settings.validate().is_err());
        settings.geopotential_degree = 0;
        settings.additional_bodies = vec![MOON, MOON];
        assert!(settings.validate().is_err());
        settings.additional_bodies.clear();
        settings.step_seconds = f64::INFINITY;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_low_earth_orbit_forces() {
        let settings = PropagationSettings::low_earth_orbit();
        let sc = spacecraft();
        let env = settings
            .prepare_environment(&Environment::solar_system().unwrap(), EARTH)
            .unwrap();
        assert_eq!(env.body(EARTH).unwrap().geopotential.as_deref(), Some(&GravityField::Jgm3));

        let forces = settings.build_forces(&env, &sc).unwrap();
        assert_eq!(
            forces.model_names(),
            vec![
                "Gravity (Harmonics)",
                "Gravity (Point Mass)",
                "Gravity (Point Mass)",
                "Atmospheric Drag",
                "Solar Radiation Pressure"
            ]
        );
        assert_eq!(forces.attracting_bodies(), vec![EARTH, SUN, MOON]);
    }

    #[test]
    fn test_degree_beyond_earth_field_rejected() {
        let settings = PropagationSettings {
            geopotential_degree: 80,
            ..PropagationSettings::two_body()
        };
        let env = settings
            .prepare_environment(&Environment::solar_system().unwrap(), EARTH)
            .unwrap();
        assert!(matches!(
            settings.build_forces(&env, &spacecraft()),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_two_body_forces() {
        let env = Environment::solar_system().unwrap();
        let forces = PropagationSettings::two_body()
            .build_forces(&env, &spacecraft())
            .unwrap();
        assert_eq!(forces.model_names(), vec!["Gravity (Point Mass)"]);
    }

    #[test]
    fn test_atmosphere_override() {
        let settings = PropagationSettings {
            include_drag: true,
            atmosphere: Some(AtmosphereModelType::Exponential),
            ..Default::default()
        };
        let env = settings
            .prepare_environment(&Environment::solar_system().unwrap(), EARTH)
            .unwrap();
        let model = env.body(EARTH).unwrap().atmosphere.clone().unwrap();
        assert_eq!(model.name(), "Exponential");
    }
}
