//! Maneuvers executed between integration steps
//!
//! A maneuver waits on standby until its activation predicate holds for the
//! last propagated state, then runs once. The plan is owned by the caller
//! and threaded through the propagation explicitly.

use crate::ephemeris::StateOrientation;
use crate::error::{Error, Result};
use crate::math::{rotation_between, unit};
use crate::orbital::StateVector;
use crate::spacecraft::Spacecraft;
use crate::time::Window;
use nalgebra::{UnitQuaternion, Vector3};
use satkit::Instant;

/// What a maneuver did when it ran
#[derive(Debug, Clone)]
pub struct ManeuverOutcome {
    pub name: String,
    pub epoch: Instant,
    /// State after the maneuver, at the same epoch
    pub state: StateVector,
    /// Attitude commanded for the maneuver
    pub orientation: StateOrientation,
    /// Applied velocity change (km/s), zero for attitude-only maneuvers
    pub delta_v: Vector3<f64>,
    /// Propellant consumed (kg)
    pub fuel_used: f64,
}

/// A maneuver the propagator can trigger
pub trait Maneuver: Send {
    fn name(&self) -> &str;

    /// Earliest epoch the maneuver may run at
    fn minimum_epoch(&self) -> Instant;

    /// Whether the maneuver should run at `state`
    ///
    /// May record `state` to detect crossings between consecutive calls.
    fn can_execute(&mut self, state: &StateVector) -> bool;

    /// Run the maneuver at `state`, drawing propellant from `spacecraft`
    fn try_execute(&mut self, state: &StateVector, spacecraft: &mut Spacecraft) -> Result<ManeuverOutcome>;

    /// Check the maneuver against the vehicle and window before propagating
    fn validate(&self, _spacecraft: &Spacecraft, window: &Window) -> Result<()> {
        if self.minimum_epoch() < window.start() {
            return Err(Error::out_of_range(format!(
                "maneuver {} is scheduled before the propagation window",
                self.name()
            )));
        }
        Ok(())
    }
}

/// When and along which direction an impulsive burn is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurnTarget {
    /// Fixed inertial delta-v (km/s) in the state's frame
    Inertial(Vector3<f64>),
    /// Along the velocity (negative for retrograde), km/s
    Prograde(f64),
    /// Along the velocity at the next apoapsis passage, km/s
    Apoapsis(f64),
    /// Along the velocity at the next periapsis passage, km/s
    Periapsis(f64),
}

impl BurnTarget {
    fn magnitude(&self) -> f64 {
        match self {
            Self::Inertial(dv) => dv.norm(),
            Self::Prograde(dv) | Self::Apoapsis(dv) | Self::Periapsis(dv) => dv.abs(),
        }
    }
}

/// Instantaneous velocity change
#[derive(Debug, Clone)]
pub struct ImpulsiveManeuver {
    name: String,
    minimum_epoch: Instant,
    target: BurnTarget,
    /// r·v at the previous check, for apsis detection
    last_radial_rate: Option<f64>,
}

impl ImpulsiveManeuver {
    pub fn new(name: impl Into<String>, minimum_epoch: Instant, target: BurnTarget) -> Result<Self> {
        let name = name.into();
        if !target.magnitude().is_finite() {
            return Err(Error::invalid(format!("maneuver {name} has a non-finite delta-v")));
        }
        Ok(Self {
            name,
            minimum_epoch,
            target,
            last_radial_rate: None,
        })
    }

    pub fn target(&self) -> BurnTarget {
        self.target
    }

    fn delta_v(&self, state: &StateVector) -> Result<Vector3<f64>> {
        match self.target {
            BurnTarget::Inertial(dv) => Ok(dv),
            BurnTarget::Prograde(dv) | BurnTarget::Apoapsis(dv) | BurnTarget::Periapsis(dv) => {
                Ok(unit(&state.velocity)? * dv)
            }
        }
    }
}

impl Maneuver for ImpulsiveManeuver {
    fn name(&self) -> &str {
        &self.name
    }

    fn minimum_epoch(&self) -> Instant {
        self.minimum_epoch
    }

    fn can_execute(&mut self, state: &StateVector) -> bool {
        if state.epoch < self.minimum_epoch {
            return false;
        }
        let radial_rate = state.position.dot(&state.velocity);
        let previous = self.last_radial_rate.replace(radial_rate);
        match (self.target, previous) {
            (BurnTarget::Inertial(_) | BurnTarget::Prograde(_), _) => true,
            (BurnTarget::Apoapsis(_), Some(prev)) => prev > 0.0 && radial_rate <= 0.0,
            (BurnTarget::Periapsis(_), Some(prev)) => prev < 0.0 && radial_rate >= 0.0,
            (_, None) => false,
        }
    }

    fn try_execute(&mut self, state: &StateVector, spacecraft: &mut Spacecraft) -> Result<ManeuverOutcome> {
        let delta_v = self.delta_v(state)?;
        let fuel_used = spacecraft.burn(&self.name, delta_v.norm())?;

        // Point the thrust axis along the burn
        let rotation = if delta_v.norm() > 0.0 {
            rotation_between(&delta_v, &spacecraft.front)?
        } else {
            UnitQuaternion::identity()
        };
        let orientation = StateOrientation::new(
            rotation,
            Vector3::zeros(),
            state.epoch,
            state.frame.clone(),
            spacecraft.body_frame(),
        );
        spacecraft.attitude = Some(orientation.clone());

        Ok(ManeuverOutcome {
            name: self.name.clone(),
            epoch: state.epoch,
            state: state.with_delta_v(&delta_v),
            orientation,
            delta_v,
            fuel_used,
        })
    }

    fn validate(&self, spacecraft: &Spacecraft, window: &Window) -> Result<()> {
        if spacecraft.engines.is_empty() {
            return Err(Error::invalid(format!(
                "impulsive maneuver {} needs an engine on {}",
                self.name, spacecraft.name
            )));
        }
        if self.minimum_epoch < window.start() {
            return Err(Error::out_of_range(format!(
                "maneuver {} is scheduled before the propagation window",
                self.name
            )));
        }
        Ok(())
    }
}

/// Attitude targets for pointing maneuvers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointing {
    Prograde,
    Retrograde,
    /// Toward the center of motion
    Nadir,
    Zenith,
    /// Along the orbit normal r × v
    Normal,
    /// Fixed inertial direction
    Inertial(Vector3<f64>),
}

impl Pointing {
    fn direction(&self, state: &StateVector) -> Vector3<f64> {
        match self {
            Self::Prograde => state.velocity,
            Self::Retrograde => -state.velocity,
            Self::Nadir => -state.position,
            Self::Zenith => state.position,
            Self::Normal => state.angular_momentum(),
            Self::Inertial(direction) => *direction,
        }
    }
}

/// Turns the spacecraft's front axis toward a target; translation untouched
#[derive(Debug, Clone)]
pub struct AttitudeManeuver {
    name: String,
    minimum_epoch: Instant,
    pointing: Pointing,
}

impl AttitudeManeuver {
    pub fn new(name: impl Into<String>, minimum_epoch: Instant, pointing: Pointing) -> Self {
        Self {
            name: name.into(),
            minimum_epoch,
            pointing,
        }
    }
}

impl Maneuver for AttitudeManeuver {
    fn name(&self) -> &str {
        &self.name
    }

    fn minimum_epoch(&self) -> Instant {
        self.minimum_epoch
    }

    fn can_execute(&mut self, state: &StateVector) -> bool {
        state.epoch >= self.minimum_epoch
    }

    fn try_execute(&mut self, state: &StateVector, spacecraft: &mut Spacecraft) -> Result<ManeuverOutcome> {
        let rotation = rotation_between(&self.pointing.direction(state), &spacecraft.front)?;
        let orientation = StateOrientation::new(
            rotation,
            Vector3::zeros(),
            state.epoch,
            state.frame.clone(),
            spacecraft.body_frame(),
        );
        spacecraft.attitude = Some(orientation.clone());

        Ok(ManeuverOutcome {
            name: self.name.clone(),
            epoch: state.epoch,
            state: state.clone(),
            orientation,
            delta_v: Vector3::zeros(),
            fuel_used: 0.0,
        })
    }
}

/// Ordered maneuvers; only the first pending one is on standby
#[derive(Default)]
pub struct ManeuverPlan {
    maneuvers: Vec<Box<dyn Maneuver>>,
    next: usize,
}

impl ManeuverPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a maneuver
    pub fn with(mut self, maneuver: impl Maneuver + 'static) -> Self {
        self.push(Box::new(maneuver));
        self
    }

    pub fn push(&mut self, maneuver: Box<dyn Maneuver>) {
        self.maneuvers.push(maneuver);
    }

    pub fn len(&self) -> usize {
        self.maneuvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maneuvers.is_empty()
    }

    /// Number of maneuvers already executed
    pub fn executed(&self) -> usize {
        self.next
    }

    pub fn is_complete(&self) -> bool {
        self.next >= self.maneuvers.len()
    }

    /// The maneuver waiting to run
    pub fn standby(&mut self) -> Option<&mut (dyn Maneuver + 'static)> {
        self.maneuvers.get_mut(self.next).map(|m| m.as_mut())
    }

    /// Mark the standby maneuver done
    pub fn advance(&mut self) {
        if self.next < self.maneuvers.len() {
            self.next += 1;
        }
    }

    /// Validate every maneuver; epochs must not decrease along the plan
    pub fn validate(&self, spacecraft: &Spacecraft, window: &Window) -> Result<()> {
        for maneuver in &self.maneuvers {
            maneuver.validate(spacecraft, window)?;
        }
        for pair in self.maneuvers.windows(2) {
            if pair[1].minimum_epoch() < pair[0].minimum_epoch() {
                return Err(Error::invalid(format!(
                    "maneuver {} is scheduled before {}, which precedes it in the plan",
                    pair[1].name(),
                    pair[0].name()
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ManeuverPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManeuverPlan")
            .field("maneuvers", &self.maneuvers.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("next", &self.next)
            .finish()
    }
}
