use std::time::{Duration, Instant};

/// Display-synchronized frame clock.
///
/// The host owns the actual display callback: while the clock is not paused it calls
/// [`crate::TextBlurController::on_frame`] once per refresh on the foreground thread. The
/// controller only pauses and resumes the clock; it is never recreated between animations.
pub trait FrameClock {
    /// Monotonic timestamp of the current frame.
    fn now(&self) -> Duration;

    /// Start delivering frame callbacks.
    fn resume(&mut self);

    /// Stop delivering frame callbacks until resumed.
    fn pause(&mut self);

    /// `true` while no frame callbacks should be delivered.
    fn is_paused(&self) -> bool;

    /// Detach from the display for good. Called when the owner is dropped.
    fn cancel(&mut self) {
        self.pause();
    }
}

/// Clock driven explicitly by the caller, for headless hosts and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Duration,
    paused: bool,
    cancelled: bool,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A paused clock at time zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            paused: true,
            cancelled: false,
        }
    }

    /// Move time forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// `true` after [`FrameClock::cancel`].
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn resume(&mut self) {
        if !self.cancelled {
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn cancel(&mut self) {
        self.paused = true;
        self.cancelled = true;
    }
}

/// Wall-clock time since construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
    paused: bool,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// A paused clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            paused: true,
        }
    }
}

impl FrameClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/clock.rs"]
mod tests;
