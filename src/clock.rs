//! Clock sources used to time metrics and spans.

use std::{fmt, time::{Duration, Instant}};

/// A monotonic nanosecond clock.
///
/// Plugin services read a `Ticker` to time standalone metrics before the
/// tracing engine is bound; the reference engine uses one to time spans.
/// Tests substitute [`ManualTicker`](crate::testing::ManualTicker).
pub trait Ticker: Send + Sync + fmt::Debug {
    /// Returns the current reading in nanoseconds.
    ///
    /// Readings are monotonic but have no relation to wall-clock time.
    fn read(&self) -> u64;

    /// Returns the time elapsed since an earlier reading.
    fn elapsed_since(&self, start: u64) -> Duration {
        Duration::from_nanos(self.read().saturating_sub(start))
    }
}

/// A [`Ticker`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemTicker {
    origin: Instant,
}

impl SystemTicker {
    /// Creates a ticker whose readings start near zero.
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for SystemTicker {
    fn read(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}
