//! Shared physical context of a propagation

use crate::body::{BodyArena, CelestialBody, NaifId};
use crate::ephemeris::{Aberration, AnalyticEphemeris, EphemerisProvider};
use crate::error::Result;
use crate::frame::Frame;
use crate::orbital::StateVector;
use satkit::Instant;
use std::fmt;
use std::sync::Arc;

/// Bodies and ephemeris a propagation reads from
///
/// Cheap to clone; every force model keeps its own handle.
#[derive(Clone)]
pub struct Environment {
    pub arena: Arc<BodyArena>,
    pub ephemeris: Arc<dyn EphemerisProvider>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bodies", &self.arena.len())
            .field("ephemeris", &self.ephemeris.name())
            .finish()
    }
}

impl Environment {
    pub fn new(arena: Arc<BodyArena>, ephemeris: Arc<dyn EphemerisProvider>) -> Self {
        Self { arena, ephemeris }
    }

    /// Sun, Earth and Moon with the analytic ephemeris
    pub fn solar_system() -> Result<Self> {
        Self::with_arena(BodyArena::solar_system()?)
    }

    /// `arena` served by an analytic ephemeris with the standard tracks
    pub fn with_arena(arena: BodyArena) -> Result<Self> {
        let arena = Arc::new(arena);
        let ephemeris = AnalyticEphemeris::solar_system(arena.clone())?;
        Ok(Self::new(arena, Arc::new(ephemeris)))
    }

    /// Copy with `id` replaced by `f(body)`; the ephemeris is shared
    pub fn with_body(&self, id: NaifId, f: impl FnOnce(CelestialBody) -> CelestialBody) -> Result<Self> {
        let mut arena = (*self.arena).clone();
        arena.update(id, f)?;
        Ok(Self::new(Arc::new(arena), self.ephemeris.clone()))
    }

    pub fn body(&self, id: NaifId) -> Result<&CelestialBody> {
        self.arena.get(id)
    }

    /// Geometric state of `target` relative to `observer`
    pub fn relative_state(
        &self,
        epoch: &Instant,
        observer: NaifId,
        target: NaifId,
        frame: &Frame,
    ) -> Result<StateVector> {
        self.ephemeris
            .state(epoch, observer, target, frame, Aberration::None)
    }
}
