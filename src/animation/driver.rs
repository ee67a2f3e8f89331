use std::time::Duration;

/// Callback fired exactly once per blur request. `true` means the request ran to completion.
pub type Completion = Box<dyn FnOnce(bool)>;

/// Animation driver state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// No animation.
    Idle,
    /// Advancing every frame. `reverse` runs blurred-to-sharp.
    Running {
        /// Direction of travel.
        reverse: bool,
    },
    /// Progress reached the duration; the final frame must be snapped and the completion fired.
    Completing {
        /// Direction of the run that just ended.
        reverse: bool,
    },
}

/// Two adjacent stages to cross-dissolve, in direction-of-travel indices.
///
/// Read `lower` and `upper` through [`crate::StageSet::get_directional`] with `reverse`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendFrame {
    /// Stage shown at full opacity on the lower layer.
    pub lower: usize,
    /// Stage shown on the upper layer; always `lower + 1`.
    pub upper: usize,
    /// Upper layer opacity in `[0, 1]`.
    pub fraction: f32,
    /// Direction of travel.
    pub reverse: bool,
}

/// Outcome of one [`AnimationDriver::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameStep {
    /// Nothing is running.
    Idle,
    /// Show this blend.
    Blend(BlendFrame),
    /// The run ended; snap to the final state and call [`AnimationDriver::complete`].
    Finished {
        /// Final state of the label.
        blurred: bool,
    },
}

/// Maps elapsed frame time to a position in the stage sequence.
///
/// Progress accumulates as [`Duration`], so frame intervals sum exactly. The terminal check
/// (`progress >= duration`) runs at the start of a tick, so the frame that reaches the duration
/// still shows the fully travelled blend and the following tick finishes the run.
pub struct AnimationDriver {
    state: DriverState,
    progress: Duration,
    duration: Duration,
    number_of_stages: usize,
    last_tick: Option<Duration>,
    completion: Option<Completion>,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("duration", &self.duration)
            .field("number_of_stages", &self.number_of_stages)
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDriver {
    /// An idle driver.
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            progress: Duration::ZERO,
            duration: Duration::ZERO,
            number_of_stages: 0,
            last_tick: None,
            completion: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// `true` while running.
    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    /// Accumulated progress of the current run.
    pub fn progress(&self) -> Duration {
        self.progress
    }

    /// Final blurred state of the current run, if any.
    pub fn target_blurred(&self) -> Option<bool> {
        match self.state {
            DriverState::Idle => None,
            DriverState::Running { reverse } | DriverState::Completing { reverse } => {
                Some(!reverse)
            }
        }
    }

    /// Start a run toward `blurred` from progress zero.
    ///
    /// Returns the completion of a run this call replaced, which the caller must fire with
    /// `false`.
    pub fn start(
        &mut self,
        blurred: bool,
        now: Duration,
        duration: Duration,
        number_of_stages: usize,
        completion: Option<Completion>,
    ) -> Option<Completion> {
        let superseded = self.completion.take();
        self.state = DriverState::Running { reverse: !blurred };
        self.progress = Duration::ZERO;
        self.duration = duration;
        self.number_of_stages = number_of_stages.max(1);
        self.last_tick = Some(now);
        self.completion = completion;
        superseded
    }

    /// Keep the current run but attach a new completion, returning the previous one.
    pub fn replace_completion(&mut self, completion: Option<Completion>) -> Option<Completion> {
        std::mem::replace(&mut self.completion, completion)
    }

    /// Flip the direction of a running animation without a visual jump.
    ///
    /// A reverse run reads the stage set mirrored, which shifts its stage space by one slot, so the
    /// new progress is `duration - progress + duration / N`, capped at `duration`. Returns the
    /// previous completion.
    pub fn reverse_direction(&mut self, completion: Option<Completion>) -> Option<Completion> {
        let DriverState::Running { reverse } = self.state else {
            return self.replace_completion(completion);
        };
        let n = u32::try_from(self.number_of_stages.max(1)).unwrap_or(u32::MAX);
        self.state = DriverState::Running { reverse: !reverse };
        self.progress = self
            .duration
            .saturating_sub(self.progress)
            .saturating_add(self.duration / n)
            .min(self.duration);
        self.replace_completion(completion)
    }

    /// Advance to `now`.
    pub fn tick(&mut self, now: Duration) -> FrameStep {
        let DriverState::Running { reverse } = self.state else {
            return FrameStep::Idle;
        };
        if self.progress >= self.duration {
            self.state = DriverState::Completing { reverse };
            return FrameStep::Finished { blurred: !reverse };
        }

        let elapsed = self
            .last_tick
            .map(|t| now.saturating_sub(t))
            .unwrap_or_default();
        self.last_tick = Some(now);
        self.progress = self.progress.saturating_add(elapsed);
        FrameStep::Blend(self.blend())
    }

    /// Blend for the current progress.
    ///
    /// The stage index is derived from whole nanoseconds so frame boundaries land exactly on
    /// stage boundaries.
    pub fn blend(&self) -> BlendFrame {
        let reverse = matches!(
            self.state,
            DriverState::Running { reverse: true } | DriverState::Completing { reverse: true }
        );
        let n = self.number_of_stages.max(1) as u128;
        let total = self.duration.as_nanos();
        let (lower, fraction) = if total == 0 {
            (n, 0.0)
        } else {
            let scaled = self.progress.as_nanos().min(total) * n;
            let lower = scaled / total;
            let rem = scaled % total;
            (lower, (rem as f64 / total as f64) as f32)
        };
        let lower = usize::try_from(lower).unwrap_or(usize::MAX);
        BlendFrame {
            lower,
            upper: lower.saturating_add(1),
            fraction,
            reverse,
        }
    }

    /// Leave `Completing`, returning the completion to fire with `true`.
    pub fn complete(&mut self) -> Option<Completion> {
        if !matches!(self.state, DriverState::Completing { .. }) {
            return None;
        }
        self.reset();
        self.completion.take()
    }

    /// Abort any run, returning the completion to fire with `false`.
    pub fn cancel(&mut self) -> Option<Completion> {
        self.reset();
        self.completion.take()
    }

    fn reset(&mut self) {
        self.state = DriverState::Idle;
        self.progress = Duration::ZERO;
        self.last_tick = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/driver.rs"]
mod tests;
