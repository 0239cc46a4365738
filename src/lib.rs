//! astroprop - spacecraft trajectory propagation
//!
//! Converts between orbital representations and frames, and integrates
//! spacecraft trajectories under composable gravitational and
//! non-gravitational forces with a fixed-step velocity Verlet scheme.
//!
//! Units are km, km/s, s, rad and kg unless a field says otherwise.

pub mod body;
pub mod ephemeris;
pub mod error;
pub mod frame;
pub mod math;
pub mod orbital;
pub mod propagation;
pub mod spacecraft;
pub mod time;

pub use body::{BodyArena, CelestialBody, Center, NaifId};
pub use ephemeris::{Aberration, AnalyticEphemeris, EphemerisProvider, StateOrientation};
pub use error::{Error, Result};
pub use frame::Frame;
pub use orbital::{EquinoctialElements, KeplerianElements, OrbitalParameters, StateVector, Tle};
pub use propagation::{propagate, propagate_many, Environment, ManeuverPlan, PropagationResult, PropagationSettings};
pub use spacecraft::{Engine, FuelTank, Spacecraft};
pub use time::Window;
