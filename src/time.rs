//! Epoch and time window helpers
//!
//! Epochs are `satkit::Instant` values; this module only adds the window
//! type the propagator works over.

use crate::error::{Error, Result};
use satkit::{Duration, Instant};

/// Closed time interval `[start, end]`
#[derive(Debug, Clone, Copy)]
pub struct Window {
    start: Instant,
    end: Instant,
}

impl Window {
    /// Create a window, rejecting empty or reversed intervals
    pub fn new(start: Instant, end: Instant) -> Result<Self> {
        if (end - start).as_seconds() <= 0.0 {
            return Err(Error::invalid("window end must be after its start"));
        }
        Ok(Self { start, end })
    }

    /// Window of `seconds` starting at `start`
    pub fn from_duration(start: Instant, seconds: f64) -> Result<Self> {
        Self::new(start, start + Duration::from_seconds(seconds))
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    /// Window length in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start).as_seconds()
    }

    /// Whether `epoch` lies within the window (inclusive)
    pub fn contains(&self, epoch: &Instant) -> bool {
        *epoch >= self.start && *epoch <= self.end
    }
}

/// Build an epoch from a UTC calendar date
pub fn from_calendar(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: f64) -> Result<Instant> {
    Instant::from_datetime(year, month, day, hour, minute, second).map_err(|e| {
        Error::out_of_range(format!(
            "invalid date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second}: {e}"
        ))
    })
}

/// The J2000 reference epoch, 2000-01-01 12:00
pub fn j2000() -> Result<Instant> {
    from_calendar(2000, 1, 1, 12, 0, 0.0)
}

/// Seconds elapsed from `from` to `to`
pub fn seconds_between(from: &Instant, to: &Instant) -> f64 {
    (*to - *from).as_seconds()
}

/// `epoch` shifted by `seconds`
pub fn offset(epoch: &Instant, seconds: f64) -> Instant {
    *epoch + Duration::from_seconds(seconds)
}
