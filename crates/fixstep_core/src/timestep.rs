//! Fixed-timestep accumulator
//!
//! Decouples the variable-rate render loop from a fixed-rate physics loop.
//! Wall-clock time is banked in an accumulator; every whole step in the bank
//! advances physics by exactly one step, and the fraction carries over to the
//! next frame.
//!
//! While paused, whole steps are still drained from the bank without
//! stepping, so resuming never replays the paused interval.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A monotonic time source in nanoseconds
pub trait Clock {
    /// Current reading; never decreases
    fn now_nanos(&self) -> u64;
}

/// Wall clock backed by [`Instant`]
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// A clock that only moves when told to
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the world.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, nanos: u64) {
        self.now.set(self.now.get().saturating_add(nanos));
    }

    /// Move the clock forward by a number of seconds
    pub fn advance_secs(&self, seconds: f32) {
        self.advance((seconds as f64 * 1e9) as u64);
    }

    /// Set the reading; ignored if it would go backwards
    pub fn set(&self, nanos: u64) {
        if nanos >= self.now.get() {
            self.now.set(nanos);
        }
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        self.now.get()
    }
}

/// Outcome of one [`FixedTimestep::advance`] call
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Advance {
    /// Physics steps taken
    pub steps: u32,
    /// Simulated seconds covered by those steps (a multiple of the step)
    pub physics_delta: f32,
}

/// Banks wall-clock time and releases it as whole fixed steps
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    step_seconds: f32,
    step_nanos: u64,
    accumulator: u64,
    last_time: Option<u64>,
    max_steps_per_frame: Option<u32>,
}

impl FixedTimestep {
    /// Create an accumulator for steps of `step_seconds`
    ///
    /// # Panics
    ///
    /// Panics if the step is not a positive number of at least one nanosecond.
    pub fn new(step_seconds: f32) -> Self {
        let step_nanos = (step_seconds * 1e9_f32) as u64;
        assert!(
            step_seconds.is_finite() && step_nanos > 0,
            "fixed step must be positive, got {step_seconds}"
        );
        Self {
            step_seconds,
            step_nanos,
            accumulator: 0,
            last_time: None,
            max_steps_per_frame: None,
        }
    }

    /// Cap the steps taken in one call
    ///
    /// `None` allows unbounded catch-up after a stalled frame. With a cap,
    /// whole steps beyond it are discarded and simulated time falls behind
    /// wall time.
    pub fn with_max_steps_per_frame(mut self, max_steps: Option<u32>) -> Self {
        self.max_steps_per_frame = max_steps.filter(|&n| n > 0);
        self
    }

    /// Step length in seconds
    pub fn step_seconds(&self) -> f32 {
        self.step_seconds
    }

    /// Step length in nanoseconds
    pub fn step_nanos(&self) -> u64 {
        self.step_nanos
    }

    /// Banked time not yet consumed, always below one step between calls
    pub fn accumulator_nanos(&self) -> u64 {
        self.accumulator
    }

    /// Forget the time since the last reading
    ///
    /// Called on resume so a stretch with no frames at all is not replayed.
    pub fn rebase(&mut self, now: u64) {
        self.last_time = Some(now);
    }

    /// Bank the time since the last call and run `step` once per whole step
    ///
    /// The first call only records `now`. While `paused`, whole steps are
    /// drained without calling `step`.
    pub fn advance(&mut self, now: u64, paused: bool, mut step: impl FnMut()) -> Advance {
        let frame_time = match self.last_time {
            Some(last) => now.saturating_sub(last),
            None => 0,
        };
        self.last_time = Some(now);
        self.accumulator += frame_time;

        let mut advance = Advance::default();
        while self.accumulator >= self.step_nanos {
            if !paused {
                if self.max_steps_per_frame.is_some_and(|max| advance.steps >= max) {
                    let dropped = self.accumulator / self.step_nanos;
                    log::warn!(
                        "Step cap of {} reached, dropping {} steps ({:.3}s of simulated time)",
                        advance.steps,
                        dropped,
                        dropped as f32 * self.step_seconds
                    );
                    self.accumulator %= self.step_nanos;
                    break;
                }
                step();
                advance.steps += 1;
                advance.physics_delta += self.step_seconds;
            }
            self.accumulator -= self.step_nanos;
        }

        advance
    }
}
