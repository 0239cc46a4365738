//! Named reference frames

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A named 3D reference orientation
///
/// Frames are identified by name only; their orientation relative to each
/// other is resolved by the ephemeris provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame(Cow<'static, str>);

impl Frame {
    /// International Celestial Reference Frame
    pub const ICRF: Frame = Frame(Cow::Borrowed("ICRF"));

    /// Mean equator and equinox of J2000 (treated as ICRF)
    pub const J2000: Frame = Frame(Cow::Borrowed("J2000"));

    /// Mean ecliptic and equinox of J2000
    pub const ECLIPTIC_J2000: Frame = Frame(Cow::Borrowed("ECLIPJ2000"));

    /// True equator, mean equinox (SGP4 output frame)
    pub const TEME: Frame = Frame(Cow::Borrowed("TEME"));

    /// Earth body-fixed frame
    pub const ITRF93: Frame = Frame(Cow::Borrowed("ITRF93"));

    /// Frame with an arbitrary name
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Frame with a static name, no allocation
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether this frame is one of the non-rotating ICRF-aligned frames
    pub fn is_icrf_aligned(&self) -> bool {
        matches!(self.name(), "ICRF" | "J2000" | "GCRF")
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_names() {
        assert_eq!(Frame::ICRF.name(), "ICRF");
        assert_eq!(Frame::new("IAU_MOON"), Frame::from_static("IAU_MOON"));
        assert!(Frame::J2000.is_icrf_aligned());
        assert!(!Frame::ITRF93.is_icrf_aligned());
    }
}
