//! Time and frame pacing.

use std::fmt;
use std::time::Instant;

/// Time in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Time(f64);

impl Time {
  pub fn from_secs(secs: f64) -> Self {
    Time(secs)
  }

  /// Convert into seconds.
  pub fn as_secs(self) -> f64 {
    self.0
  }

  /// Wrap time with a given duration.
  pub fn wrap_around(self, t: Time) -> Self {
    Time(self.0 % t.0)
  }
}

impl fmt::Display for Time {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    self.0.fmt(f)
  }
}

/// Monotonic time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Monotonic(Instant);

impl Monotonic {
  pub fn now() -> Self {
    Monotonic(Instant::now())
  }

  pub fn elapsed_secs(&self) -> Time {
    Time(self.0.elapsed().as_secs_f64())
  }
}

/// Measures the time elapsed between two frames.
///
/// Sample it once per frame with [`FrameTimer::tick`].
#[derive(Clone, Copy, Debug)]
pub struct FrameTimer {
  start: Monotonic,
  last: Time,
}

impl FrameTimer {
  pub fn new() -> Self {
    FrameTimer {
      start: Monotonic::now(),
      last: Time(0.),
    }
  }

  /// Time elapsed since the timer was created.
  pub fn elapsed(&self) -> Time {
    self.start.elapsed_secs()
  }

  /// Sample the clock and return the delta since the previous sample (or since creation).
  pub fn tick(&mut self) -> Time {
    let now = self.start.elapsed_secs();
    let delta = Time(now.0 - self.last.0);

    self.last = now;
    delta
  }
}

impl Default for FrameTimer {
  fn default() -> Self {
    FrameTimer::new()
  }
}
