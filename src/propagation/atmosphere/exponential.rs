//! Single scale height atmosphere

use super::{AtmosphereDensity, AtmosphereModel};
use crate::error::{Error, Result};
use satkit::Instant;

/// ρ(h) = ρ₀ exp(-(h - h₀) / H), held at ρ₀ below h₀ and zero above the ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct Exponential {
    /// Density at the base altitude (kg/m³)
    pub base_density: f64,
    /// km
    pub base_altitude: f64,
    /// km
    pub scale_height: f64,
    /// km
    pub ceiling: f64,
}

impl Default for Exponential {
    fn default() -> Self {
        Self::standard()
    }
}

impl Exponential {
    /// Earth profile fitted through the standard densities at 400 and 500 km
    pub fn standard() -> Self {
        Self {
            base_density: 3.725e-12,
            base_altitude: 400.0,
            scale_height: 59.65,
            ceiling: 1000.0,
        }
    }

    pub fn new(base_density: f64, base_altitude: f64, scale_height: f64, ceiling: f64) -> Self {
        Self {
            base_density,
            base_altitude,
            scale_height,
            ceiling,
        }
    }

    /// Profile through two (altitude km, density kg/m³) samples
    pub fn through(lower: (f64, f64), upper: (f64, f64), ceiling: f64) -> Result<Self> {
        let (h1, rho1) = lower;
        let (h2, rho2) = upper;
        if !(h2 > h1) || !(rho1 > rho2) || !(rho2 > 0.0) {
            return Err(Error::invalid(format!(
                "density must fall with altitude: ({h1} km, {rho1}) to ({h2} km, {rho2})"
            )));
        }
        Ok(Self::new(rho1, h1, (h2 - h1) / (rho1 / rho2).ln(), ceiling))
    }
}

impl AtmosphereModel for Exponential {
    fn density(&self, altitude_km: f64, _epoch: &Instant) -> AtmosphereDensity {
        if altitude_km > self.ceiling {
            return AtmosphereDensity::vacuum();
        }
        let height = (altitude_km - self.base_altitude).max(0.0);
        AtmosphereDensity::with_scale_height(
            self.base_density * (-height / self.scale_height).exp(),
            self.scale_height,
        )
    }

    fn name(&self) -> &'static str {
        "Exponential"
    }

    fn ceiling_km(&self) -> f64 {
        self.ceiling
    }
}
