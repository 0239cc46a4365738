//! Atmospheric density for drag
//!
//! A model is attached to a [`CelestialBody`](crate::body::CelestialBody)
//! and evaluated at altitude above the body's surface. Three models ship:
//! [`Exponential`] with one scale height, [`Tabulated`], a
//! piecewise-exponential standard atmosphere up to 1000 km, and
//! [`Nrlmsise00`], the empirical model with local time and activity.

mod exponential;
mod nrlmsise;
mod tabulated;

pub use exponential::Exponential;
pub use nrlmsise::Nrlmsise00;
pub use tabulated::Tabulated;

use satkit::Instant;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Density at one altitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereDensity {
    /// Mass density (kg/m³)
    pub rho: f64,
    /// Local scale height (km), when the model has one
    pub scale_height: Option<f64>,
}

impl AtmosphereDensity {
    pub fn new(rho: f64) -> Self {
        Self { rho, scale_height: None }
    }

    pub fn with_scale_height(rho: f64, scale_height: f64) -> Self {
        Self {
            rho,
            scale_height: Some(scale_height),
        }
    }

    /// Vacuum above the model ceiling
    pub fn vacuum() -> Self {
        Self::new(0.0)
    }
}

/// Density profile of one body's atmosphere
///
/// Shared between parallel propagations through the body arena.
pub trait AtmosphereModel: Debug + Send + Sync {
    fn density(&self, altitude_km: f64, epoch: &Instant) -> AtmosphereDensity;

    /// Density over a body-fixed point at geocentric `latitude` and
    /// `longitude` (rad); profiles without horizontal structure ignore them
    fn density_at(&self, altitude_km: f64, _latitude: f64, _longitude: f64, epoch: &Instant) -> AtmosphereDensity {
        self.density(altitude_km, epoch)
    }

    fn name(&self) -> &'static str;

    /// Altitude (km) above which density is zero
    fn ceiling_km(&self) -> f64;
}

/// Atmosphere selection in settings files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtmosphereModelType {
    Exponential,
    #[default]
    Tabulated,
    Nrlmsise00,
}

impl AtmosphereModelType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exponential => "Exponential",
            Self::Tabulated => "Tabulated",
            Self::Nrlmsise00 => "NRLMSISE-00",
        }
    }

    pub fn create(&self) -> Arc<dyn AtmosphereModel> {
        match self {
            Self::Exponential => Arc::new(Exponential::standard()),
            Self::Tabulated => Arc::new(Tabulated::standard()),
            Self::Nrlmsise00 => Arc::new(Nrlmsise00::new()),
        }
    }
}
