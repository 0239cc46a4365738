//! NRLMSISE-00 empirical atmosphere
//!
//! Wraps satkit's NRLMSISE-00. With space weather enabled the model reads
//! F10.7 and Ap for the epoch from satkit's data files; otherwise it runs
//! at fixed moderate activity.

use super::{AtmosphereDensity, AtmosphereModel};
use satkit::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nrlmsise00 {
    use_space_weather: bool,
}

impl Default for Nrlmsise00 {
    fn default() -> Self {
        Self::new()
    }
}

impl Nrlmsise00 {
    /// Top of the model (km)
    pub const CEILING_KM: f64 = 1000.0;

    /// Model driven by recorded space weather
    pub fn new() -> Self {
        Self {
            use_space_weather: true,
        }
    }

    /// Model at fixed solar and geomagnetic activity
    pub fn quiet() -> Self {
        Self {
            use_space_weather: false,
        }
    }

    pub fn uses_space_weather(&self) -> bool {
        self.use_space_weather
    }

    fn evaluate(&self, altitude_km: f64, location: Option<(f64, f64)>, epoch: &Instant) -> AtmosphereDensity {
        if altitude_km > Self::CEILING_KM {
            return AtmosphereDensity::vacuum();
        }
        let (rho, _temperature) = satkit::nrlmsise::nrlmsise(
            altitude_km.max(0.0),
            location.map(|(lat, _)| lat.to_degrees()),
            location.map(|(_, lon)| lon.to_degrees()),
            self.use_space_weather.then_some(epoch),
            self.use_space_weather,
        );
        AtmosphereDensity::new(rho)
    }
}

impl AtmosphereModel for Nrlmsise00 {
    fn density(&self, altitude_km: f64, epoch: &Instant) -> AtmosphereDensity {
        self.evaluate(altitude_km, None, epoch)
    }

    fn density_at(&self, altitude_km: f64, latitude: f64, longitude: f64, epoch: &Instant) -> AtmosphereDensity {
        self.evaluate(altitude_km, Some((latitude, longitude)), epoch)
    }

    fn name(&self) -> &'static str {
        "NRLMSISE-00"
    }

    fn ceiling_km(&self) -> f64 {
        Self::CEILING_KM
    }
}
