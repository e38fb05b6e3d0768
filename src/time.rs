//! Clock primitives that drive normalized tween progress.
//!
//! A [`Clock`] advances a progress value through `[0, 1]` at a speed of
//! `1 / duration` per second and resolves boundary crossings according to
//! its [`TimeControl`] mode.

use serde::{Deserialize, Serialize};

use crate::error::TweenError;

/// Upper bound on boundary crossings resolved within a single tick.
/// Oversized deltas on an unlimited clock clamp after this many crossings.
const CROSSING_RESOLVE_CAP: u32 = 64;

/// How a clock behaves when its progress reaches a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeControl {
    /// Run to the boundary once, then complete
    #[default]
    PlayOnce,
    /// Wrap around at the boundary and keep running
    Loop,
    /// Reverse direction at each boundary
    PingPong,
}

impl TimeControl {
    /// Get the name of this time control mode
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayOnce => "play-once",
            Self::Loop => "loop",
            Self::PingPong => "ping-pong",
        }
    }

    /// Check whether this mode revisits the range after a boundary
    #[inline]
    pub fn is_looping(&self) -> bool {
        !matches!(self, Self::PlayOnce)
    }
}

impl From<&str> for TimeControl {
    fn from(s: &str) -> Self {
        match s {
            "loop" => Self::Loop,
            "ping-pong" => Self::PingPong,
            _ => Self::PlayOnce,
        }
    }
}

/// Result of advancing a [`Clock`] by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    /// Progress after the tick, in `[0, 1]`
    pub progress: f32,
    /// At least one loop boundary was crossed during this tick
    pub loop_completed: bool,
    /// The clock reached its terminal state during this tick
    pub just_completed: bool,
}

/// Normalized progress clock for a single tween process.
///
/// Progress stays in `[0, 1]`; `speed` is the reciprocal of the duration in
/// seconds and `direction` is `+1` or `-1`. The completion flag is
/// monotonic: once set it only clears through [`Clock::restart`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    progress: f32,
    speed: f32,
    direction: f32,
    time_control: TimeControl,
    current_loop: u32,
    max_loops: i32,
    completed: bool,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            progress: 0.0,
            speed: 1.0,
            direction: 1.0,
            time_control: TimeControl::PlayOnce,
            current_loop: 0,
            max_loops: -1,
            completed: false,
        }
    }
}

impl Clock {
    /// Create a clock advancing at `speed` progress units per second.
    ///
    /// A non-finite speed is coerced to zero, freezing the clock in place.
    pub fn new(speed: f32, time_control: TimeControl) -> Self {
        let mut clock = Self {
            time_control,
            ..Self::default()
        };
        clock.set_speed(speed);
        clock
    }

    /// Create a clock for a tween lasting `duration` seconds.
    ///
    /// A zero duration parks the clock at its terminal bound, so the
    /// first tick completes with the end value.
    pub fn from_duration(duration: f32, time_control: TimeControl) -> Self {
        let mut clock = Self::new(1.0 / duration, time_control);
        if duration == 0.0 {
            clock.progress = 1.0;
        }
        clock
    }

    /// Progress in `[0, 1]`
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress units per second
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current direction, `+1.0` or `-1.0`
    #[inline]
    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// Time control mode
    #[inline]
    pub fn time_control(&self) -> TimeControl {
        self.time_control
    }

    /// Completed loop boundary crossings so far
    #[inline]
    pub fn current_loop(&self) -> u32 {
        self.current_loop
    }

    /// Loop limit, `-1` for unlimited
    #[inline]
    pub fn max_loops(&self) -> i32 {
        self.max_loops
    }

    /// Whether the clock reached its terminal state
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Set the speed, coercing non-finite values to zero.
    /// Coercion never moves the progress; the clock just stops.
    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.speed = speed;
        } else {
            self.speed = 0.0;
        }
    }

    /// Set the progress directly, clamped to `[0, 1]`
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Limit the number of loop wraps, `-1` for unlimited.
    /// A limit of `n` survives `n` full wraps and completes on the
    /// crossing after.
    pub fn set_loop_limit(&mut self, max_loops: i32) {
        self.max_loops = max_loops;
    }

    /// Flip the running direction without resetting progress
    pub fn invert_direction(&mut self) {
        self.direction = -self.direction;
    }

    /// Rewind to the direction-appropriate start and clear completion
    pub fn restart(&mut self) {
        self.progress = if self.direction > 0.0 { 0.0 } else { 1.0 };
        self.current_loop = 0;
        self.completed = false;
    }

    /// Advance by `delta` seconds and resolve any boundary crossings
    pub fn tick(&mut self, delta: f32) -> ClockTick {
        if self.completed {
            return ClockTick {
                progress: self.progress,
                loop_completed: false,
                just_completed: false,
            };
        }

        // Zero-duration clocks sit at their terminal bound and finish on
        // the first tick regardless of control mode.
        if self.speed == 0.0 && self.at_terminal_bound() {
            self.completed = true;
            return ClockTick {
                progress: self.progress,
                loop_completed: false,
                just_completed: true,
            };
        }

        self.progress += self.speed * delta * self.direction;
        let mut loop_completed = false;

        match self.time_control {
            TimeControl::PlayOnce => {
                if self.direction > 0.0 && self.progress >= 1.0 {
                    self.progress = 1.0;
                    self.completed = true;
                } else if self.direction < 0.0 && self.progress <= 0.0 {
                    self.progress = 0.0;
                    self.completed = true;
                } else {
                    self.progress = self.progress.clamp(0.0, 1.0);
                }
            }
            TimeControl::Loop => {
                if self.direction > 0.0 && self.progress >= 1.0 {
                    let crossings = self.progress.floor() as u32;
                    loop_completed = self.register_crossings(crossings);
                    if self.completed {
                        self.progress = 1.0;
                    } else {
                        self.progress = fmod(self.progress, 1.0);
                    }
                } else if self.direction < 0.0 && self.progress <= 0.0 {
                    let crossings = 1 + (-self.progress).floor() as u32;
                    loop_completed = self.register_crossings(crossings);
                    if self.completed {
                        self.progress = 0.0;
                    } else {
                        let wrapped = fmod(self.progress, 1.0);
                        self.progress = if wrapped == 0.0 { 1.0 } else { wrapped };
                    }
                }
            }
            TimeControl::PingPong => {
                let mut guard = 0;
                loop {
                    if self.direction > 0.0 && self.progress > 1.0 {
                        loop_completed = self.register_crossings(1);
                        if self.completed {
                            self.progress = 1.0;
                            break;
                        }
                        self.progress = 2.0 - self.progress;
                        self.direction = -1.0;
                    } else if self.direction < 0.0 && self.progress < 0.0 {
                        loop_completed = self.register_crossings(1);
                        if self.completed {
                            self.progress = 0.0;
                            break;
                        }
                        self.progress = -self.progress;
                        self.direction = 1.0;
                    } else {
                        break;
                    }
                    guard += 1;
                    if guard >= CROSSING_RESOLVE_CAP {
                        self.progress = self.progress.clamp(0.0, 1.0);
                        break;
                    }
                }
            }
        }

        ClockTick {
            progress: self.progress,
            loop_completed,
            just_completed: self.completed,
        }
    }

    /// Count boundary crossings against the loop limit.
    /// The limit allows `max_loops` wraps; the crossing after completes.
    /// Returns true when at least one crossing happened.
    fn register_crossings(&mut self, crossings: u32) -> bool {
        for _ in 0..crossings.min(CROSSING_RESOLVE_CAP) {
            self.current_loop += 1;
            if self.max_loops >= 0 && self.current_loop > self.max_loops as u32 {
                self.completed = true;
                break;
            }
        }
        crossings > 0
    }

    #[inline]
    fn at_terminal_bound(&self) -> bool {
        (self.direction > 0.0 && self.progress >= 1.0)
            || (self.direction < 0.0 && self.progress <= 0.0)
    }
}

/// Euclidean float remainder, always in `[0, b)`
#[inline]
fn fmod(a: f32, b: f32) -> f32 {
    ((a % b) + b) % b
}

/// Validate a tween duration in seconds
pub fn validate_duration(duration: f32) -> Result<(), TweenError> {
    if duration.is_nan() || duration < 0.0 {
        return Err(TweenError::InvalidValue {
            reason: format!("duration must be non-negative, got {duration}"),
        });
    }
    Ok(())
}

/// Wall-clock stopwatch used for metrics sampling
#[derive(Debug, Clone)]
pub struct Timer {
    started: instant::Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            started: instant::Instant::now(),
        }
    }

    /// Elapsed time in microseconds
    #[inline]
    pub fn elapsed_micros(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    /// Elapsed time in seconds
    #[inline]
    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Reset the timer, returning the elapsed microseconds up to now
    pub fn restart(&mut self) -> u64 {
        let elapsed = self.elapsed_micros();
        self.started = instant::Instant::now();
        elapsed
    }
}
