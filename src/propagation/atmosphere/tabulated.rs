//! Piecewise-exponential standard atmosphere
//!
//! Density within each altitude band follows ρ = ρ_b × exp(-(h - h_b) / H_b)
//! from the band's base altitude, nominal density and scale height.

use super::{AtmosphereDensity, AtmosphereModel};
use crate::error::{Error, Result};
use satkit::Instant;

/// (base altitude km, nominal density kg/m³, scale height km)
const STANDARD_BANDS: [(f64, f64, f64); 28] = [
    (0.0, 1.225, 7.249),
    (25.0, 3.899e-2, 6.349),
    (30.0, 1.774e-2, 6.682),
    (40.0, 3.972e-3, 7.554),
    (50.0, 1.057e-3, 8.382),
    (60.0, 3.206e-4, 7.714),
    (70.0, 8.770e-5, 6.549),
    (80.0, 1.905e-5, 5.799),
    (90.0, 3.396e-6, 5.382),
    (100.0, 5.297e-7, 5.877),
    (110.0, 9.661e-8, 7.263),
    (120.0, 2.438e-8, 9.473),
    (130.0, 8.484e-9, 12.636),
    (140.0, 3.845e-9, 16.149),
    (150.0, 2.070e-9, 22.523),
    (180.0, 5.464e-10, 29.740),
    (200.0, 2.789e-10, 37.105),
    (250.0, 7.248e-11, 45.546),
    (300.0, 2.418e-11, 53.628),
    (350.0, 9.518e-12, 53.298),
    (400.0, 3.725e-12, 58.515),
    (450.0, 1.585e-12, 60.828),
    (500.0, 6.967e-13, 63.822),
    (600.0, 1.454e-13, 71.835),
    (700.0, 3.614e-14, 88.667),
    (800.0, 1.170e-14, 124.64),
    (900.0, 5.245e-15, 181.05),
    (1000.0, 3.019e-15, 268.00),
];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Band {
    base_altitude: f64,
    density: f64,
    scale_height: f64,
}

/// Table-driven atmosphere
#[derive(Debug, Clone, PartialEq)]
pub struct Tabulated {
    bands: Vec<Band>,
    ceiling: f64,
}

impl Default for Tabulated {
    fn default() -> Self {
        Self::standard()
    }
}

impl Tabulated {
    /// Earth standard atmosphere from sea level to 1000 km
    pub fn standard() -> Self {
        Self {
            bands: STANDARD_BANDS
                .iter()
                .map(|&(base_altitude, density, scale_height)| Band {
                    base_altitude,
                    density,
                    scale_height,
                })
                .collect(),
            ceiling: 1000.0,
        }
    }

    /// Build from `(base altitude, density, scale height)` rows
    ///
    /// Rows must be sorted by strictly increasing base altitude with positive
    /// densities and scale heights.
    pub fn from_rows(rows: &[(f64, f64, f64)], ceiling_km: f64) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::invalid("atmosphere table has no rows"));
        }
        for pair in rows.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(Error::invalid(format!(
                    "atmosphere table altitudes not increasing at {} km",
                    pair[1].0
                )));
            }
        }
        if rows.iter().any(|&(_, rho, h)| !(rho > 0.0 && h > 0.0)) {
            return Err(Error::invalid("atmosphere table densities and scale heights must be positive"));
        }
        if ceiling_km < rows[rows.len() - 1].0 {
            return Err(Error::invalid("atmosphere ceiling below the last table row"));
        }

        Ok(Self {
            bands: rows
                .iter()
                .map(|&(base_altitude, density, scale_height)| Band {
                    base_altitude,
                    density,
                    scale_height,
                })
                .collect(),
            ceiling: ceiling_km,
        })
    }

    fn band(&self, altitude_km: f64) -> Option<&Band> {
        let idx = self
            .bands
            .partition_point(|band| band.base_altitude <= altitude_km);
        self.bands.get(idx.saturating_sub(1))
    }
}

impl AtmosphereModel for Tabulated {
    fn density(&self, altitude_km: f64, _epoch: &Instant) -> AtmosphereDensity {
        if altitude_km > self.ceiling {
            return AtmosphereDensity::vacuum();
        }
        let Some(band) = self.band(altitude_km) else {
            return AtmosphereDensity::vacuum();
        };

        let height = (altitude_km - band.base_altitude).max(0.0);
        AtmosphereDensity::with_scale_height(band.density * (-height / band.scale_height).exp(), band.scale_height)
    }

    fn name(&self) -> &'static str {
        "Tabulated"
    }

    fn ceiling_km(&self) -> f64 {
        self.ceiling
    }
}
