//! Fixed-step numerical integrators
//!
//! An integrator fills one slot of the propagator's trajectory cache from
//! the slot before it. The cache is pre-allocated by the caller and passed
//! in explicitly; integrators keep only their own derivative state.

use crate::error::{Error, Result};
use crate::orbital::StateVector;
use crate::propagation::forces::CompositeForce;
use nalgebra::Vector3;

/// Trait for fixed-step integrators writing into a trajectory cache
pub trait Integrator: Send {
    /// Reset the derivative state at `state`
    ///
    /// Called before the first step and after anything that changes the
    /// state discontinuously (maneuver, re-centering).
    fn seed(&mut self, state: &StateVector, forces: &CompositeForce) -> Result<()>;

    /// Compute `cache[index]` from `cache[index - 1]`
    ///
    /// The slot keeps its pre-filled epoch; center and frame are taken from
    /// the previous slot.
    fn integrate(&mut self, forces: &CompositeForce, cache: &mut [StateVector], index: usize) -> Result<()>;

    /// Fixed step (s)
    fn step(&self) -> f64;

    /// Integrator name
    fn name(&self) -> &'static str;

    /// Integrator order (for error estimation)
    fn order(&self) -> u8;
}

/// Velocity Verlet (kick-drift-kick) integrator
///
/// Symplectic and second order: energy oscillates with bounded amplitude
/// instead of drifting. One force evaluation per step.
///
/// ```text
/// r₁ = r₀ + v₀ dt + ½ a₀ dt²
/// a₁ = a(r₁, v₀ + a₀ dt)
/// v₁ = v₀ + ½ (a₀ + a₁) dt
/// ```
///
/// Velocity-dependent forces see the predictor `v₀ + a₀ dt`.
#[derive(Debug, Clone)]
pub struct VelocityVerlet {
    step: f64,
    /// Acceleration at the last written state
    acceleration: Option<Vector3<f64>>,
}

impl VelocityVerlet {
    pub fn new(step: f64) -> Result<Self> {
        if !(step > 0.0 && step.is_finite()) {
            return Err(Error::invalid(format!("integration step must be positive, got {step}")));
        }
        Ok(Self {
            step,
            acceleration: None,
        })
    }

    /// Acceleration carried into the next step, if seeded
    pub fn acceleration(&self) -> Option<Vector3<f64>> {
        self.acceleration
    }
}

impl Integrator for VelocityVerlet {
    fn seed(&mut self, state: &StateVector, forces: &CompositeForce) -> Result<()> {
        self.acceleration = Some(forces.total_acceleration(state)?);
        Ok(())
    }

    fn integrate(&mut self, forces: &CompositeForce, cache: &mut [StateVector], index: usize) -> Result<()> {
        if index == 0 || index >= cache.len() {
            return Err(Error::out_of_range(format!(
                "cannot integrate slot {index} of a {} slot cache",
                cache.len()
            )));
        }
        let (done, rest) = cache.split_at_mut(index);
        let previous = &done[index - 1];
        let next = &mut rest[0];

        let a0 = match self.acceleration {
            Some(a) => a,
            None => forces.total_acceleration(previous)?,
        };
        let dt = self.step;

        let position = previous.position + previous.velocity * dt + 0.5 * a0 * dt * dt;
        let predicted = StateVector::new(
            position,
            previous.velocity + a0 * dt,
            next.epoch,
            previous.center,
            previous.frame.clone(),
        );
        let a1 = forces.total_acceleration(&predicted)?;

        next.position = position;
        next.velocity = previous.velocity + 0.5 * (a0 + a1) * dt;
        next.center = previous.center;
        next.frame = predicted.frame;
        self.acceleration = Some(a1);
        Ok(())
    }

    fn step(&self) -> f64 {
        self.step
    }

    fn name(&self) -> &'static str {
        "Velocity Verlet"
    }

    fn order(&self) -> u8 {
        2
    }
}
