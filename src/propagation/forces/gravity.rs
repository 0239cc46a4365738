//! Gravitational attraction of a body
//!
//! Provides two fidelity levels:
//! - Point mass (μ/r²), direct or as a third-body perturbation
//! - Point mass plus the body's spherical-harmonics field

use super::ForceModel;
use crate::body::NaifId;
use crate::error::{Error, Result};
use crate::orbital::StateVector;
use crate::propagation::environment::Environment;
use nalgebra::Vector3;

/// Gravity field fidelity selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityModel {
    /// Simple point mass: a = -μ/r³ × r
    PointMass,

    /// Point mass + spherical harmonics (degree × order)
    ///
    /// Only applies when the body is the state's center of motion and has a
    /// geopotential attached; otherwise behaves as a point mass.
    Harmonics {
        /// Maximum degree (n)
        degree: usize,
        /// Maximum order (m)
        order: usize,
    },
}

/// Attraction of one body on the spacecraft
///
/// When the body is the center of motion the result is the central term.
/// Otherwise it is the perturbation relative to the center: the body's pull
/// on the spacecraft minus its pull on the center.
pub struct GravitationalAcceleration {
    environment: Environment,
    body: NaifId,
    mu: f64,
    model: GravityModel,
}

impl GravitationalAcceleration {
    /// Point-mass attraction of `body`
    pub fn point_mass(environment: Environment, body: NaifId) -> Result<Self> {
        Self::new(environment, body, GravityModel::PointMass)
    }

    /// Attraction of `body` including its harmonics up to degree × order
    pub fn harmonics(environment: Environment, body: NaifId, degree: usize, order: usize) -> Result<Self> {
        Self::new(environment, body, GravityModel::Harmonics { degree, order })
    }

    /// Fails when the truncation asks for more than the body's field holds
    pub fn new(environment: Environment, body: NaifId, model: GravityModel) -> Result<Self> {
        let attracting = environment.body(body)?;
        if let GravityModel::Harmonics { degree, order } = model {
            if order > degree {
                return Err(Error::out_of_range(format!("order {order} exceeds degree {degree}")));
            }
            if let Some(field) = &attracting.geopotential {
                if degree > field.max_degree() {
                    return Err(Error::out_of_range(format!(
                        "degree {degree} requested but body {body} has a degree {} field",
                        field.max_degree()
                    )));
                }
            }
        }
        let mu = attracting.mu;
        Ok(Self {
            environment,
            body,
            mu,
            model,
        })
    }

    pub fn body(&self) -> NaifId {
        self.body
    }

    /// Point mass acceleration: a = -μ/r³ × r
    fn point_mass_accel(&self, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        if r <= 0.0 {
            // Avoid singularity at origin
            return Vector3::zeros();
        }
        -self.mu / (r * r * r) * position
    }

    /// Spherical-harmonics perturbation, evaluated in the body-fixed frame
    fn harmonics_accel(&self, state: &StateVector, degree: usize, order: usize) -> Result<Vector3<f64>> {
        let body = self.environment.body(self.body)?;
        let Some(field) = body.geopotential.as_ref() else {
            return Ok(Vector3::zeros());
        };
        let orientation =
            self.environment
                .ephemeris
                .orientation(&state.frame, &body.fixed_frame, &state.epoch)?;
        let fixed_position = orientation.rotation * state.position;
        let fixed_accel = field.acceleration(&fixed_position, degree, order)?;
        Ok(orientation.rotation.inverse() * fixed_accel)
    }
}

impl ForceModel for GravitationalAcceleration {
    fn acceleration(&self, state: &StateVector) -> Result<Vector3<f64>> {
        if state.center.id == self.body {
            let central = self.point_mass_accel(&state.position);
            return match self.model {
                GravityModel::PointMass => Ok(central),
                GravityModel::Harmonics { degree, order } => {
                    Ok(central + self.harmonics_accel(state, degree, order)?)
                }
            };
        }

        // Third body: direct minus indirect term
        let body_from_center = self
            .environment
            .relative_state(&state.epoch, state.center.id, self.body, &state.frame)?
            .position;
        let body_from_spacecraft = body_from_center - state.position;
        Ok(-self.point_mass_accel(&body_from_spacecraft) + self.point_mass_accel(&body_from_center))
    }

    fn name(&self) -> &'static str {
        match self.model {
            GravityModel::PointMass => "Gravity (Point Mass)",
            GravityModel::Harmonics { .. } => "Gravity (Harmonics)",
        }
    }

    fn description(&self) -> &'static str {
        match self.model {
            GravityModel::PointMass => "Body gravity μ/r²",
            GravityModel::Harmonics { .. } => "Body gravity with spherical harmonics",
        }
    }

    fn relative_magnitude(&self) -> f64 {
        1.0
    }

    fn attracting_body(&self) -> Option<NaifId> {
        Some(self.body)
    }
}
