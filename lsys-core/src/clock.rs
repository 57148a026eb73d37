//! Reversible simulated clock that drives growth animation.
//!
//! The clock is either stopped or running in a [`Direction`]. Running
//! forward adds wall time to the accumulated total, running in reverse
//! subtracts it. All state sits behind a single mutex and every method
//! holds it for its whole body, so individual calls are atomic but a
//! sequence of calls is not.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::debug;

/// Source of "now" for a [`GrowthClock`].
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A time source that only moves when told to, for deterministic playback.
#[derive(Debug)]
pub struct ManualTime {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running(Direction),
}

#[derive(Debug)]
struct ClockInner {
    running: bool,
    direction: Direction,
    /// Signed seconds folded in so far.
    accumulated: f64,
    /// Start of the in-flight interval; meaningful only while running.
    started: Instant,
}

impl ClockInner {
    fn in_flight(&self, now: Instant) -> f64 {
        if !self.running {
            return 0.0;
        }
        let dt = now.saturating_duration_since(self.started).as_secs_f64();
        self.direction.sign() * dt
    }

    /// Moves the in-flight interval into `accumulated` and rebases it at `now`.
    fn fold(&mut self, now: Instant) {
        self.accumulated += self.in_flight(now);
        self.started = now;
    }
}

/// Thread-safe reversible clock.
///
/// ### Example
/// ```
/// use lsys_core::clock::{ClockState, GrowthClock};
///
/// let clock = GrowthClock::new();
/// clock.start();
/// assert!(clock.is_running());
/// clock.reset();
/// assert_eq!(clock.state(), ClockState::Stopped);
/// assert_eq!(clock.elapsed_seconds(), 0.0);
/// ```
#[derive(Debug)]
pub struct GrowthClock<T: TimeSource = MonotonicTime> {
    time: T,
    inner: Mutex<ClockInner>,
}

impl GrowthClock<MonotonicTime> {
    pub fn new() -> Self {
        Self::with_time_source(MonotonicTime)
    }
}

impl Default for GrowthClock<MonotonicTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> GrowthClock<T> {
    pub fn with_time_source(time: T) -> Self {
        let started = time.now();
        Self {
            time,
            inner: Mutex::new(ClockInner {
                running: false,
                direction: Direction::Forward,
                accumulated: 0.0,
                started,
            }),
        }
    }

    pub fn time_source(&self) -> &T {
        &self.time
    }

    fn lock(&self) -> MutexGuard<'_, ClockInner> {
        // The inner state is plain data; a panic elsewhere cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts running in the current direction. No-op if already running.
    pub fn start(&self) {
        let mut s = self.lock();
        if !s.running {
            s.running = true;
            s.started = self.time.now();
            debug!(direction = ?s.direction, "growth clock started");
        }
    }

    /// Stops and folds the in-flight interval, signed by direction.
    pub fn stop(&self) {
        let mut s = self.lock();
        if s.running {
            let now = self.time.now();
            s.fold(now);
            s.running = false;
            debug!(elapsed = s.accumulated, "growth clock stopped");
        }
    }

    /// Stops, zeroes the accumulated time and faces forward again.
    pub fn reset(&self) {
        let mut s = self.lock();
        s.running = false;
        s.direction = Direction::Forward;
        s.accumulated = 0.0;
        debug!("growth clock reset");
    }

    /// Flips the direction. Time already run keeps the sign it ran with.
    pub fn reverse(&self) {
        let mut s = self.lock();
        let now = self.time.now();
        s.fold(now);
        s.direction = s.direction.flipped();
        debug!(direction = ?s.direction, "growth clock reversed");
    }

    /// Folds the time run since the last start/update into the total.
    pub fn update(&self) {
        let mut s = self.lock();
        if s.running {
            let now = self.time.now();
            s.fold(now);
        }
    }

    /// Accumulated time plus the signed in-flight interval, in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        let s = self.lock();
        s.accumulated + s.in_flight(self.time.now())
    }

    pub fn state(&self) -> ClockState {
        let s = self.lock();
        if s.running {
            ClockState::Running(s.direction)
        } else {
            ClockState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn is_reversed(&self) -> bool {
        self.lock().direction == Direction::Reverse
    }
}
