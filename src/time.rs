//! Frame timing.
//!
//! Physics and camera updates are tuned per nominal 60 Hz frame, so the delta
//! handed to updates is the elapsed milliseconds divided by the frame length:
//! a frame that took exactly 1/60 s has a delta of `1.0`.

use instant::Instant;

/// Milliseconds per nominal frame.
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

pub trait TimeSource {
    /// Monotonic seconds since the source was created.
    fn now(&self) -> f64;
}

/// Wall clock. Backed by `performance.now()` on the web.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to. Makes simulations reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }
}

/// Turns a [`TimeSource`] into per-frame deltas.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Option<f64>,
    divisor_ms: f64,
    delta: f32,
}

impl FrameClock {
    pub fn new(divisor_ms: f64) -> Self {
        Self {
            last: None,
            divisor_ms,
            delta: 0.0,
        }
    }

    /// Samples `source` once and returns the new delta. The first tick yields 0.
    pub fn tick(&mut self, source: &impl TimeSource) -> f32 {
        let now = source.now();
        self.delta = match self.last {
            Some(last) => ((now - last) * 1000.0 / self.divisor_ms) as f32,
            None => 0.0,
        };
        self.last = Some(now);
        self.delta
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Seconds of the last sample, 0 before the first tick.
    pub fn elapsed(&self) -> f64 {
        self.last.unwrap_or(0.0)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(NOMINAL_FRAME_MS)
    }
}
