//! Accelerations acting on a spacecraft
//!
//! Every contribution implements [`ForceModel`] and returns an acceleration
//! in the state's frame relative to its center of motion. A propagator sums
//! them through [`CompositeForce`], in the order they were added.
//!
//! - [`GravitationalAcceleration`]: point mass or harmonics of one body,
//!   as the central term or as a third-body perturbation
//! - [`AtmosphericDrag`]: drag in the atmosphere attached to a body
//! - [`SolarRadiationPressure`]: cannonball SRP switched off in shadow

mod drag;
mod geopotential;
mod gravity;
mod srp;

pub use drag::AtmosphericDrag;
pub use geopotential::{GeopotentialModel, GravityField, EGM2008_MU, EGM2008_RADIUS, JGM3_MAX_DEGREE};
pub use gravity::{GravitationalAcceleration, GravityModel};
pub use srp::{SolarRadiationPressure, AU_KM, SOLAR_PRESSURE_1AU};

use crate::body::NaifId;
use crate::error::Result;
use crate::orbital::StateVector;
use crate::spacecraft::BallisticProperties;
use nalgebra::Vector3;

/// One contribution to the spacecraft's acceleration
pub trait ForceModel: Send + Sync {
    /// Acceleration in km/s²
    fn acceleration(&self, state: &StateVector) -> Result<Vector3<f64>>;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        self.name()
    }

    /// Disabled models contribute nothing
    fn enabled(&self) -> bool {
        true
    }

    /// Rough size relative to central gravity, used when listing models
    fn relative_magnitude(&self) -> f64 {
        0.1
    }

    /// Called after a burn changes the spacecraft mass
    fn update_ballistic(&mut self, _ballistic: &BallisticProperties) {}

    /// Body whose gravity this model represents, if any
    fn attracting_body(&self) -> Option<NaifId> {
        None
    }
}

/// Ordered set of force models summed into one acceleration
#[derive(Default)]
pub struct CompositeForce {
    forces: Vec<Box<dyn ForceModel>>,
}

impl CompositeForce {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, force: Box<dyn ForceModel>) {
        log::debug!("Adding force model: {}", force.name());
        self.forces.push(force);
    }

    /// Chained form of [`CompositeForce::add`]
    pub fn with(mut self, force: impl ForceModel + 'static) -> Self {
        self.add(Box::new(force));
        self
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn model_names(&self) -> Vec<&'static str> {
        self.forces.iter().map(|f| f.name()).collect()
    }

    /// Bodies with a gravity term, first occurrence first
    pub fn attracting_bodies(&self) -> Vec<NaifId> {
        let mut bodies = Vec::new();
        for id in self.forces.iter().filter_map(|f| f.attracting_body()) {
            if !bodies.contains(&id) {
                bodies.push(id);
            }
        }
        bodies
    }

    /// Sum of all enabled contributions
    pub fn total_acceleration(&self, state: &StateVector) -> Result<Vector3<f64>> {
        self.forces
            .iter()
            .filter(|f| f.enabled())
            .try_fold(Vector3::zeros(), |acc, f| Ok(acc + f.acceleration(state)?))
    }

    /// Each enabled contribution by name
    pub fn acceleration_breakdown(&self, state: &StateVector) -> Result<Vec<(&'static str, Vector3<f64>)>> {
        self.forces
            .iter()
            .filter(|f| f.enabled())
            .map(|f| Ok((f.name(), f.acceleration(state)?)))
            .collect()
    }

    pub fn update_ballistic(&mut self, ballistic: &BallisticProperties) {
        for force in self.forces.iter_mut() {
            force.update_ballistic(ballistic);
        }
    }
}

impl FromIterator<Box<dyn ForceModel>> for CompositeForce {
    fn from_iter<I: IntoIterator<Item = Box<dyn ForceModel>>>(iter: I) -> Self {
        let mut composite = Self::new();
        for force in iter {
            composite.add(force);
        }
        composite
    }
}
