//! Numerical orbit propagation
//!
//! The module is organized around composable components:
//!
//! - **AtmosphereModel**: density models attached to bodies
//! - **ForceModel**: individual force contributions (gravity, drag, SRP)
//! - **Integrator**: fixed-step velocity Verlet over a trajectory cache
//! - **Maneuver**: impulsive and attitude maneuvers run between steps
//! - **Propagator**: drives the integration, maneuvers and re-centering
//!
//! # Example
//!
//! ```ignore
//! use astroprop::propagation::*;
//!
//! let environment = Environment::solar_system()?;
//! let settings = PropagationSettings::low_earth_orbit();
//! let window = Window::from_duration(start, 86_400.0)?;
//!
//! let mut plan = ManeuverPlan::new()
//!     .with(ImpulsiveManeuver::new("raise", burn_epoch, BurnTarget::Prograde(0.01))?);
//! let result = propagate(window, &mut spacecraft, &mut plan, environment, &settings)?;
//! ```

pub mod atmosphere;
pub mod environment;
pub mod forces;
pub mod integrator;
pub mod maneuver;
pub mod propagator;
pub mod settings;

pub use atmosphere::{AtmosphereDensity, AtmosphereModel, AtmosphereModelType};
pub use environment::Environment;
pub use forces::{CompositeForce, ForceModel};
pub use integrator::{Integrator, VelocityVerlet};
pub use maneuver::{
    AttitudeManeuver, BurnTarget, ImpulsiveManeuver, Maneuver, ManeuverOutcome, ManeuverPlan, Pointing,
};
pub use propagator::{CenterChange, PropagationResult, Propagator};
pub use settings::PropagationSettings;

use crate::error::Result;
use crate::spacecraft::Spacecraft;
use crate::time::Window;
use rayon::prelude::*;

/// Propagate one spacecraft over `window` with forces chosen by `settings`
pub fn propagate(
    window: Window,
    spacecraft: &mut Spacecraft,
    plan: &mut ManeuverPlan,
    environment: Environment,
    settings: &PropagationSettings,
) -> Result<PropagationResult> {
    Propagator::new(window, spacecraft, environment, settings)?.propagate(spacecraft, plan)
}

/// Propagate independent spacecraft in parallel
///
/// Each job gets its own propagator and cache; results keep the job order
/// and return the spacecraft with its remaining propellant.
pub fn propagate_many(
    window: Window,
    jobs: Vec<(Spacecraft, ManeuverPlan)>,
    environment: &Environment,
    settings: &PropagationSettings,
) -> Vec<Result<(Spacecraft, PropagationResult)>> {
    log::info!("Propagating {} spacecraft in parallel", jobs.len());
    jobs.into_par_iter()
        .map(|(mut spacecraft, mut plan)| {
            let result = propagate(window, &mut spacecraft, &mut plan, environment.clone(), settings)?;
            Ok((spacecraft, result))
        })
        .collect()
}
