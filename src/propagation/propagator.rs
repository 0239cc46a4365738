//! Numerical orbit propagator
//!
//! Drives a fixed-step integrator over a pre-allocated trajectory cache,
//! running maneuvers between steps and switching the center of motion when
//! the spacecraft crosses a sphere of influence.

use super::environment::Environment;
use super::forces::CompositeForce;
use super::integrator::{Integrator, VelocityVerlet};
use super::maneuver::{ManeuverOutcome, ManeuverPlan};
use super::settings::PropagationSettings;
use crate::body::NaifId;
use crate::ephemeris::StateOrientation;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::math::lagrange::{interpolate_vector, refine_crossing};
use crate::orbital::StateVector;
use crate::spacecraft::Spacecraft;
use crate::time::{offset, seconds_between, Window};
use satkit::Instant;

/// Nodes used for trajectory interpolation
const INTERPOLATION_NODES: usize = 8;

/// Slack on duration / step before truncating to whole steps
const SLOT_EPSILON: f64 = 1e-9;

/// A switch of the center of motion during propagation
#[derive(Debug, Clone, PartialEq)]
pub struct CenterChange {
    /// Cache slot the switch was applied to
    pub index: usize,
    pub epoch: Instant,
    pub from: NaifId,
    pub to: NaifId,
}

/// Trajectory and events produced by one propagation
#[derive(Debug, Clone)]
pub struct PropagationResult {
    /// One state per step, starting at the window start
    pub states: Vec<StateVector>,
    /// Attitudes commanded by executed maneuvers, in execution order
    pub orientations: Vec<StateOrientation>,
    pub maneuvers: Vec<ManeuverOutcome>,
    pub center_changes: Vec<CenterChange>,
}

impl PropagationResult {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&StateVector> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&StateVector> {
        self.states.last()
    }

    /// Seconds of each state since the first one
    fn elapsed(&self) -> Vec<f64> {
        match self.states.first() {
            Some(first) => self
                .states
                .iter()
                .map(|s| seconds_between(&first.epoch, &s.epoch))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Interpolated state at `epoch`
    ///
    /// Uses up to eight neighbouring nodes sharing the center of motion of
    /// the node at or before `epoch`.
    pub fn state_at(&self, epoch: &Instant) -> Result<StateVector> {
        let (Some(first), Some(last)) = (self.states.first(), self.states.last()) else {
            return Err(Error::out_of_range("no states to interpolate"));
        };
        let t = seconds_between(&first.epoch, epoch);
        let span = seconds_between(&first.epoch, &last.epoch);
        if !(0.0..=span).contains(&t) {
            return Err(Error::out_of_range(format!(
                "epoch is {t:.3} s from the start of a {span:.3} s trajectory"
            )));
        }

        let xs = self.elapsed();
        let k = xs.partition_point(|&x| x <= t).saturating_sub(1);
        let anchor = &self.states[k];
        let (lo, hi) = self.segment(k, INTERPOLATION_NODES);

        let positions: Vec<_> = self.states[lo..hi].iter().map(|s| s.position).collect();
        let velocities: Vec<_> = self.states[lo..hi].iter().map(|s| s.velocity).collect();
        Ok(StateVector::new(
            interpolate_vector(&xs[lo..hi], &positions, t)?,
            interpolate_vector(&xs[lo..hi], &velocities, t)?,
            *epoch,
            anchor.center,
            anchor.frame.clone(),
        ))
    }

    /// Up to `nodes` slots around `k`, all with the center of slot `k`
    fn segment(&self, k: usize, nodes: usize) -> (usize, usize) {
        let center = self.states[k].center.id;
        let mut lo = k;
        while lo > 0 && self.states[lo - 1].center.id == center {
            lo -= 1;
        }
        let mut hi = k + 1;
        while hi < self.states.len() && self.states[hi].center.id == center {
            hi += 1;
        }

        // Center the node window on k within [lo, hi)
        let width = nodes.min(hi - lo);
        let start = k.saturating_sub(width / 2).max(lo).min(hi - width);
        (start, start + width)
    }

    /// Epochs where `f` crosses `threshold`, refined by interpolation
    pub fn find_crossings(&self, f: impl Fn(&StateVector) -> f64, threshold: f64) -> Result<Vec<Instant>> {
        let Some(first) = self.states.first() else {
            return Ok(Vec::new());
        };
        let xs = self.elapsed();
        let ys: Vec<f64> = self.states.iter().map(&f).collect();

        let mut crossings = Vec::new();
        for j in 0..ys.len().saturating_sub(1) {
            let a = ys[j] - threshold;
            let b = ys[j + 1] - threshold;
            let brackets = (a < 0.0 && b >= 0.0) || (a > 0.0 && b <= 0.0);
            if !brackets {
                continue;
            }
            let (lo, hi) = self.segment(j, INTERPOLATION_NODES);
            if j + 1 >= hi {
                // Bracket straddles a center change
                continue;
            }
            if let Some(t) = refine_crossing(&xs[lo..hi], &ys[lo..hi], j - lo, threshold)? {
                crossings.push(offset(&first.epoch, t));
            }
        }
        Ok(crossings)
    }
}

/// Fixed-step propagator over a time window
pub struct Propagator {
    window: Window,
    environment: Environment,
    forces: CompositeForce,
    integrator: Box<dyn Integrator>,
    initial_state: StateVector,
    recenter: bool,
}

impl Propagator {
    /// Build forces and integrator from `settings` for `spacecraft`
    ///
    /// The initial orbit is transported to the window start and expressed
    /// in ICRF.
    pub fn new(
        window: Window,
        spacecraft: &Spacecraft,
        environment: Environment,
        settings: &PropagationSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let center = spacecraft.initial_orbit.center().id;
        let environment = settings.prepare_environment(&environment, center)?;
        let forces = settings.build_forces(&environment, spacecraft)?;
        let integrator = VelocityVerlet::new(settings.step_seconds)?;
        let initial_state = Self::initial_state(window, spacecraft, &environment)?;
        Ok(Self::with_models(
            window,
            initial_state,
            environment,
            forces,
            Box::new(integrator),
        )
        .with_recentering(settings.recenter))
    }

    /// Propagator over explicit forces and integrator
    pub fn with_models(
        window: Window,
        initial_state: StateVector,
        environment: Environment,
        forces: CompositeForce,
        integrator: Box<dyn Integrator>,
    ) -> Self {
        Self {
            window,
            environment,
            forces,
            integrator,
            initial_state,
            recenter: true,
        }
    }

    /// Enable or disable sphere-of-influence re-centering
    pub fn with_recentering(mut self, recenter: bool) -> Self {
        self.recenter = recenter;
        self
    }

    /// The spacecraft's orbit at the window start, in ICRF
    pub fn initial_state(window: Window, spacecraft: &Spacecraft, environment: &Environment) -> Result<StateVector> {
        let state = spacecraft
            .initial_orbit
            .at_epoch(window.start())?
            .to_frame(&Frame::ICRF, &*environment.ephemeris)?;
        environment.body(state.center.id)?;
        Ok(state)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn forces(&self) -> &CompositeForce {
        &self.forces
    }

    pub fn start_state(&self) -> &StateVector {
        &self.initial_state
    }

    /// Number of cache slots: whole steps in the window, partial step dropped
    pub fn slot_count(&self) -> Result<usize> {
        let slots = (self.window.duration_seconds() / self.integrator.step() + SLOT_EPSILON).floor();
        if slots < 1.0 {
            return Err(Error::out_of_range(format!(
                "window of {:.3} s is shorter than one {} s step",
                self.window.duration_seconds(),
                self.integrator.step()
            )));
        }
        Ok(slots as usize)
    }

    /// Propagate `spacecraft` over the window, executing `plan` in order
    pub fn propagate(&mut self, spacecraft: &mut Spacecraft, plan: &mut ManeuverPlan) -> Result<PropagationResult> {
        plan.validate(spacecraft, &self.window)?;
        let slots = self.slot_count()?;
        let step = self.integrator.step();
        let start = self.window.start();

        log::info!(
            "Propagating {} for {:.1} s: {} steps of {} s with {}, forces [{}]",
            spacecraft.name,
            self.window.duration_seconds(),
            slots,
            step,
            self.integrator.name(),
            self.forces.model_names().join(", ")
        );

        let mut cache: Vec<StateVector> = (0..slots)
            .map(|i| {
                StateVector::placeholder(
                    offset(&start, i as f64 * step),
                    self.initial_state.center,
                    self.initial_state.frame.clone(),
                )
            })
            .collect();
        cache[0] = self.initial_state.clone();

        self.forces.update_ballistic(&spacecraft.ballistic());
        self.integrator.seed(&cache[0], &self.forces)?;

        let mut orientations = Vec::new();
        let mut maneuvers = Vec::new();
        let mut center_changes = Vec::new();

        for i in 1..slots {
            if let Some(maneuver) = plan.standby() {
                if maneuver.can_execute(&cache[i - 1]) {
                    let outcome = maneuver.try_execute(&cache[i - 1], spacecraft)?;
                    log::info!(
                        "Executed maneuver {} at slot {}: |Δv| = {:.6} km/s, {:.3} kg propellant",
                        outcome.name,
                        i - 1,
                        outcome.delta_v.norm(),
                        outcome.fuel_used
                    );
                    cache[i - 1] = outcome.state.clone();
                    self.forces.update_ballistic(&spacecraft.ballistic());
                    self.integrator.seed(&cache[i - 1], &self.forces)?;
                    orientations.push(outcome.orientation.clone());
                    maneuvers.push(outcome);
                    plan.advance();
                }
            }

            self.integrator.integrate(&self.forces, &mut cache, i)?;

            if self.recenter {
                if let Some(target) = self.recenter_target(&cache[i])? {
                    let from = cache[i].center.id;
                    cache[i] = self.recentered(&cache[i], target)?;
                    self.integrator.seed(&cache[i], &self.forces)?;
                    log::info!("Re-centered {} from {} to {} at slot {}", spacecraft.name, from, target, i);
                    center_changes.push(CenterChange {
                        index: i,
                        epoch: cache[i].epoch,
                        from,
                        to: target,
                    });
                }
            }
        }

        if !plan.is_complete() {
            log::warn!(
                "{} of {} maneuvers did not trigger within the window",
                plan.len() - plan.executed(),
                plan.len()
            );
        }
        log::info!(
            "Finished propagating {}: {} states, {} maneuvers, {} center changes",
            spacecraft.name,
            cache.len(),
            maneuvers.len(),
            center_changes.len()
        );

        Ok(PropagationResult {
            states: cache,
            orientations,
            maneuvers,
            center_changes,
        })
    }

    /// Body whose sphere of influence the state has entered or left
    ///
    /// Only bodies with a gravity term in the force set are candidates.
    fn recenter_target(&self, state: &StateVector) -> Result<Option<NaifId>> {
        let arena = &self.environment.arena;
        let ephemeris = &*self.environment.ephemeris;
        let bodies = self.forces.attracting_bodies();
        let center = state.center.id;

        for satellite in arena.satellites(center) {
            if !bodies.contains(&satellite.id) {
                continue;
            }
            let Some(soi) = arena.sphere_of_influence(satellite.id, ephemeris, &state.epoch)? else {
                continue;
            };
            let body = self
                .environment
                .relative_state(&state.epoch, center, satellite.id, &state.frame)?;
            if (state.position - body.position).norm() < soi {
                return Ok(Some(satellite.id));
            }
        }

        if let Some(parent) = arena.get(center)?.parent {
            if bodies.contains(&parent) {
                if let Some(soi) = arena.sphere_of_influence(center, ephemeris, &state.epoch)? {
                    if state.radius() > soi {
                        return Ok(Some(parent));
                    }
                }
            }
        }
        Ok(None)
    }

    /// `state` re-expressed relative to `target`
    fn recentered(&self, state: &StateVector, target: NaifId) -> Result<StateVector> {
        let body = self
            .environment
            .relative_state(&state.epoch, state.center.id, target, &state.frame)?;
        Ok(StateVector::new(
            state.position - body.position,
            state.velocity - body.velocity,
            state.epoch,
            self.environment.arena.center(target)?,
            state.frame.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Center, EARTH, MOON, MU_EARTH};
    use crate::orbital::KeplerianElements;
    use crate::propagation::maneuver::{BurnTarget, ImpulsiveManeuver};
    use crate::spacecraft::{Engine, FuelTank};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    fn circular(r: f64) -> StateVector {
        StateVector::new(
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, (MU_EARTH / r).sqrt(), 0.0),
            epoch(),
            Center::earth(),
            Frame::ICRF,
        )
    }

    fn spacecraft(orbit: StateVector) -> Spacecraft {
        Spacecraft::new("test", -1, 500.0, orbit)
            .unwrap()
            .with_tank(FuelTank::new("main", 50.0, 50.0).unwrap())
            .with_engine(Engine::new("main", 100.0, 320.0).unwrap())
    }

    #[test]
    fn test_slot_count_truncates() {
        let env = Environment::solar_system().unwrap();
        let sc = spacecraft(circular(7000.0));
        let settings = PropagationSettings {
            step_seconds: 10.0,
            ..PropagationSettings::two_body()
        };
        let window = Window::from_duration(epoch(), 105.0).unwrap();
        let propagator = Propagator::new(window, &sc, env.clone(), &settings).unwrap();
        assert_eq!(propagator.slot_count().unwrap(), 10);

        let short = Window::from_duration(epoch(), 5.0).unwrap();
        let propagator = Propagator::new(short, &sc, env, &settings).unwrap();
        assert!(matches!(propagator.slot_count(), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_states_on_step_grid() {
        let env = Environment::solar_system().unwrap();
        let mut sc = spacecraft(circular(7000.0));
        let window = Window::from_duration(epoch(), 600.0).unwrap();
        let mut propagator = Propagator::new(window, &sc, env, &PropagationSettings::two_body()).unwrap();
        let result = propagator.propagate(&mut sc, &mut ManeuverPlan::new()).unwrap();

        assert_eq!(result.len(), 600);
        let first = result.first().unwrap();
        assert!((first.position - circular(7000.0).position).norm() < 1e-6);
        assert_eq!(first.epoch, epoch());
        for (i, state) in result.states.iter().enumerate() {
            assert_relative_eq!(seconds_between(&epoch(), &state.epoch), i as f64, epsilon = 1e-6);
            assert_eq!(state.center.id, EARTH);
        }
        assert!(result.maneuvers.is_empty());
        assert!(result.center_changes.is_empty());
    }

    #[test]
    fn test_initial_orbit_transported_to_window_start() {
        let env = Environment::solar_system().unwrap();
        let elements = KeplerianElements::from_state_vector(&circular(7000.0)).unwrap();
        let sc = spacecraft(circular(7000.0));
        let later = offset(&epoch(), 300.0);
        let window = Window::from_duration(later, 60.0).unwrap();
        let start = Propagator::initial_state(window, &sc, &env).unwrap();
        let expected = elements.at_epoch(later).unwrap().to_state_vector().unwrap();
        assert_eq!(start.epoch, later);
        assert!((start.position - expected.position).norm() < 1e-6);
    }

    #[test]
    fn test_maneuver_changes_orbit_and_mass() {
        let env = Environment::solar_system().unwrap();
        let mut sc = spacecraft(circular(7000.0));
        let dry_plus_fuel = sc.mass();
        let window = Window::from_duration(epoch(), 120.0).unwrap();
        let burn_epoch = offset(&epoch(), 60.0);
        let mut plan = ManeuverPlan::new()
            .with(ImpulsiveManeuver::new("raise", burn_epoch, BurnTarget::Prograde(0.1)).unwrap());

        let mut propagator = Propagator::new(window, &sc, env, &PropagationSettings::two_body()).unwrap();
        let result = propagator.propagate(&mut sc, &mut plan).unwrap();

        assert!(plan.is_complete());
        assert_eq!(result.maneuvers.len(), 1);
        assert_eq!(result.orientations.len(), 1);
        let outcome = &result.maneuvers[0];
        assert_eq!(outcome.epoch, burn_epoch);
        assert_relative_eq!(sc.mass(), dry_plus_fuel - outcome.fuel_used, epsilon = 1e-9);

        // Energy jumps at the burn slot and stays higher afterwards
        let before = result.states[0].specific_energy();
        let after = result.last().unwrap().specific_energy();
        assert!(after > before + 0.5);
        assert_eq!(result.states[60], outcome.state);
    }

    #[test]
    fn test_state_at_matches_nodes_and_closed_form() {
        let env = Environment::solar_system().unwrap();
        let mut sc = spacecraft(circular(7000.0));
        let window = Window::from_duration(epoch(), 300.0).unwrap();
        let settings = PropagationSettings {
            step_seconds: 10.0,
            ..PropagationSettings::two_body()
        };
        let mut propagator = Propagator::new(window, &sc, env, &settings).unwrap();
        let result = propagator.propagate(&mut sc, &mut ManeuverPlan::new()).unwrap();

        let node = &result.states[7];
        let at_node = result.state_at(&node.epoch).unwrap();
        assert!((at_node.position - node.position).norm() < 1e-6);

        let between = offset(&epoch(), 75.0);
        let interpolated = result.state_at(&between).unwrap();
        let exact = KeplerianElements::from_state_vector(&circular(7000.0))
            .unwrap()
            .at_epoch(between)
            .unwrap()
            .to_state_vector()
            .unwrap();
        assert!((interpolated.position - exact.position).norm() < 0.05);

        assert!(result.state_at(&offset(&epoch(), 10_000.0)).is_err());
        assert!(result.state_at(&offset(&epoch(), -1.0)).is_err());
    }

    #[test]
    fn test_find_crossings() {
        let env = Environment::solar_system().unwrap();
        let mut sc = spacecraft(circular(7000.0));
        let window = Window::from_duration(epoch(), 3000.0).unwrap();
        let settings = PropagationSettings {
            step_seconds: 5.0,
            ..PropagationSettings::two_body()
        };
        let mut propagator = Propagator::new(window, &sc, env, &settings).unwrap();
        let result = propagator.propagate(&mut sc, &mut ManeuverPlan::new()).unwrap();

        // x = 0 a quarter period after the start
        let period = circular(7000.0).period().unwrap();
        let crossings = result.find_crossings(|s| s.position.x, 0.0).unwrap();
        assert_eq!(crossings.len(), 1);
        assert_relative_eq!(seconds_between(&epoch(), &crossings[0]), period / 4.0, epsilon = 0.5);
    }

    #[test]
    fn test_recenter_to_moon() {
        let env = Environment::solar_system().unwrap();
        let moon = env.relative_state(&epoch(), EARTH, MOON, &Frame::ICRF).unwrap();
        // Start just inside the lunar sphere of influence, moving with the Moon
        let position = moon.position - moon.position.normalize() * 20_000.0;
        let orbit = StateVector::new(position, moon.velocity, epoch(), Center::earth(), Frame::ICRF);
        let mut sc = spacecraft(orbit);

        let settings = PropagationSettings {
            step_seconds: 60.0,
            additional_bodies: vec![MOON],
            ..PropagationSettings::two_body()
        };
        let window = Window::from_duration(epoch(), 600.0).unwrap();
        let mut propagator = Propagator::new(window, &sc, env.clone(), &settings).unwrap();
        let result = propagator.propagate(&mut sc, &mut ManeuverPlan::new()).unwrap();

        assert_eq!(result.center_changes.len(), 1);
        let change = &result.center_changes[0];
        assert_eq!((change.from, change.to), (EARTH, MOON));
        assert_eq!(change.index, 1);
        let last = result.last().unwrap();
        assert_eq!(last.center.id, MOON);
        assert!(last.radius() < 30_000.0);
    }

    #[test]
    fn test_recenter_from_moon_to_earth() {
        let env = Environment::solar_system().unwrap();
        let moon = env.relative_state(&epoch(), EARTH, MOON, &Frame::ICRF).unwrap();
        // At rest relative to the Moon, well beyond its sphere of influence
        let position = -moon.position.normalize() * 100_000.0;
        let center = env.arena.center(MOON).unwrap();
        let orbit = StateVector::new(position, Vector3::zeros(), epoch(), center, Frame::ICRF);
        let mut sc = spacecraft(orbit);

        let settings = PropagationSettings {
            step_seconds: 60.0,
            additional_bodies: vec![EARTH],
            ..PropagationSettings::two_body()
        };
        let window = Window::from_duration(epoch(), 600.0).unwrap();
        let mut propagator = Propagator::new(window, &sc, env.clone(), &settings).unwrap();
        let result = propagator.propagate(&mut sc, &mut ManeuverPlan::new()).unwrap();

        assert_eq!(result.center_changes.len(), 1);
        let change = &result.center_changes[0];
        assert_eq!((change.from, change.to), (MOON, EARTH));
        assert_eq!(change.index, 1);
        let last = result.last().unwrap();
        assert_eq!(last.center.id, EARTH);
        // Roughly the Moon's distance less the offset
        assert!(last.radius() > 250_000.0 && last.radius() < 320_000.0, "radius {}", last.radius());
    }

    #[test]
    fn test_no_recenter_without_gravity_term() {
        let env = Environment::solar_system().unwrap();
        let moon = env.relative_state(&epoch(), EARTH, MOON, &Frame::ICRF).unwrap();
        let position = moon.position - moon.position.normalize() * 20_000.0;
        let orbit = StateVector::new(position, moon.velocity, epoch(), Center::earth(), Frame::ICRF);
        let mut sc = spacecraft(orbit);

        let window = Window::from_duration(epoch(), 300.0).unwrap();
        let settings = PropagationSettings {
            step_seconds: 60.0,
            ..PropagationSettings::two_body()
        };
        let mut propagator = Propagator::new(window, &sc, env, &settings).unwrap();
        let result = propagator.propagate(&mut sc, &mut ManeuverPlan::new()).unwrap();
        assert!(result.center_changes.is_empty());
    }
}
