//! Spacecraft physical and propulsion properties

use crate::ephemeris::StateOrientation;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::orbital::OrbitalParameters;
use nalgebra::Vector3;

/// Standard gravity (m/s²)
pub const G0: f64 = 9.80665;

/// A propellant tank
#[derive(Debug, Clone, PartialEq)]
pub struct FuelTank {
    pub name: String,
    /// Capacity (kg)
    pub capacity: f64,
    /// Remaining propellant (kg)
    pub quantity: f64,
}

impl FuelTank {
    pub fn new(name: impl Into<String>, capacity: f64, quantity: f64) -> Result<Self> {
        let name = name.into();
        if !(capacity >= 0.0 && quantity >= 0.0) {
            return Err(Error::invalid(format!("tank {name} has negative capacity or quantity")));
        }
        if quantity > capacity {
            return Err(Error::invalid(format!(
                "tank {name} holds {quantity} kg but its capacity is {capacity} kg"
            )));
        }
        Ok(Self {
            name,
            capacity,
            quantity,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= 0.0
    }
}

/// A thruster drawing from the spacecraft's tanks
#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub name: String,
    /// Thrust (N)
    pub thrust: f64,
    /// Specific impulse (s)
    pub isp: f64,
}

impl Engine {
    pub fn new(name: impl Into<String>, thrust: f64, isp: f64) -> Result<Self> {
        let name = name.into();
        if !(thrust > 0.0 && isp > 0.0) {
            return Err(Error::invalid(format!("engine {name} needs positive thrust and isp")));
        }
        Ok(Self { name, thrust, isp })
    }

    /// Propellant mass flow (kg/s)
    pub fn mass_flow(&self) -> f64 {
        self.thrust / (self.isp * G0)
    }

    /// Effective exhaust velocity (km/s)
    pub fn exhaust_velocity(&self) -> f64 {
        self.isp * G0 / 1000.0
    }
}

/// Mass and surface properties seen by the non-gravitational forces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallisticProperties {
    /// Total mass (kg)
    pub mass: f64,
    pub drag_coefficient: f64,
    /// Drag reference area (m²)
    pub drag_area: f64,
    /// Radiation pressure coefficient, 1 (absorbing) to 2 (mirror)
    pub reflectivity: f64,
    /// Sunlit area (m²)
    pub srp_area: f64,
}

impl BallisticProperties {
    /// Cd·A/m (m²/kg)
    pub fn drag_ratio(&self) -> f64 {
        self.drag_coefficient * self.drag_area / self.mass
    }

    /// Cr·A/m (m²/kg)
    pub fn srp_ratio(&self) -> f64 {
        self.reflectivity * self.srp_area / self.mass
    }
}

/// A propagated vehicle
#[derive(Debug, Clone)]
pub struct Spacecraft {
    pub name: String,
    /// Negative NAIF-style identifier
    pub id: i32,
    /// Mass without propellant (kg)
    pub dry_mass: f64,
    pub tanks: Vec<FuelTank>,
    pub engines: Vec<Engine>,
    pub drag_coefficient: f64,
    /// Drag reference area (m²)
    pub drag_area: f64,
    pub reflectivity: f64,
    /// Sunlit area (m²)
    pub srp_area: f64,
    /// Body-frame axis the engines thrust along
    pub front: Vector3<f64>,
    pub initial_orbit: OrbitalParameters,
    /// Last attitude commanded by a maneuver
    pub attitude: Option<StateOrientation>,
}

impl Spacecraft {
    /// A spacecraft with no tanks or engines and unit-ish surface properties
    pub fn new(
        name: impl Into<String>,
        id: i32,
        dry_mass: f64,
        initial_orbit: impl Into<OrbitalParameters>,
    ) -> Result<Self> {
        let name = name.into();
        if !(dry_mass > 0.0) {
            return Err(Error::invalid(format!("spacecraft {name} needs a positive dry mass")));
        }
        Ok(Self {
            name,
            id,
            dry_mass,
            tanks: Vec::new(),
            engines: Vec::new(),
            drag_coefficient: 2.2,
            drag_area: 1.0,
            reflectivity: 1.3,
            srp_area: 1.0,
            front: Vector3::y(),
            initial_orbit: initial_orbit.into(),
            attitude: None,
        })
    }

    pub fn with_tank(mut self, tank: FuelTank) -> Self {
        self.tanks.push(tank);
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engines.push(engine);
        self
    }

    /// Set drag coefficient and reference area (m²)
    pub fn with_drag(mut self, drag_coefficient: f64, area: f64) -> Result<Self> {
        if !(drag_coefficient >= 0.0 && area >= 0.0) {
            return Err(Error::invalid("drag coefficient and area must be non-negative"));
        }
        self.drag_coefficient = drag_coefficient;
        self.drag_area = area;
        Ok(self)
    }

    /// Set reflectivity coefficient and sunlit area (m²)
    pub fn with_srp(mut self, reflectivity: f64, area: f64) -> Result<Self> {
        if !(0.0..=2.0).contains(&reflectivity) || !(area >= 0.0) {
            return Err(Error::invalid("reflectivity must lie in [0, 2] and area be non-negative"));
        }
        self.reflectivity = reflectivity;
        self.srp_area = area;
        Ok(self)
    }

    /// Remaining propellant over all tanks (kg)
    pub fn fuel_mass(&self) -> f64 {
        self.tanks.iter().map(|t| t.quantity).sum()
    }

    /// Dry mass plus remaining propellant (kg)
    pub fn mass(&self) -> f64 {
        self.dry_mass + self.fuel_mass()
    }

    /// Frame fixed to the spacecraft structure, used for attitude records
    pub fn body_frame(&self) -> Frame {
        Frame::new(format!("{}_BODY", self.name.to_uppercase()))
    }

    pub fn ballistic(&self) -> BallisticProperties {
        BallisticProperties {
            mass: self.mass(),
            drag_coefficient: self.drag_coefficient,
            drag_area: self.drag_area,
            reflectivity: self.reflectivity,
            srp_area: self.srp_area,
        }
    }

    /// Specific impulse of all engines firing together (s)
    pub fn effective_isp(&self) -> Result<f64> {
        if self.engines.is_empty() {
            return Err(Error::invalid(format!("spacecraft {} has no engines", self.name)));
        }
        let thrust: f64 = self.engines.iter().map(|e| e.thrust).sum();
        let flow: f64 = self.engines.iter().map(|e| e.thrust / e.isp).sum();
        Ok(thrust / flow)
    }

    /// Propellant needed for `delta_v` km/s at the current mass (kg)
    pub fn fuel_for_delta_v(&self, delta_v: f64) -> Result<f64> {
        let exhaust = self.effective_isp()? * G0 / 1000.0;
        Ok(self.mass() * (1.0 - (-delta_v.abs() / exhaust).exp()))
    }

    /// Draw the propellant for `delta_v` km/s from the tanks, in tank order
    ///
    /// Nothing is drawn if the tanks cannot cover the whole burn.
    pub fn burn(&mut self, maneuver: &str, delta_v: f64) -> Result<f64> {
        let required = self.fuel_for_delta_v(delta_v)?;
        let available = self.fuel_mass();
        if required > available {
            return Err(Error::InsufficientFuel {
                maneuver: maneuver.to_string(),
                required_kg: required,
                available_kg: available,
            });
        }

        let mut remaining = required;
        for tank in self.tanks.iter_mut() {
            let drawn = remaining.min(tank.quantity);
            tank.quantity -= drawn;
            remaining -= drawn;
            if remaining <= 0.0 {
                break;
            }
        }
        Ok(required)
    }

    /// Burn duration for `delta_v` km/s with all engines firing (s)
    pub fn burn_duration(&self, delta_v: f64) -> Result<f64> {
        let flow: f64 = self.engines.iter().map(Engine::mass_flow).sum();
        if flow <= 0.0 {
            return Err(Error::invalid(format!("spacecraft {} has no engines", self.name)));
        }
        Ok(self.fuel_for_delta_v(delta_v)? / flow)
    }
}
