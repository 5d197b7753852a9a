//! Progress display animation.
//!
//! A progress bar that jumps from 50 to 100 reads as a glitch. [`PercentSweep`]
//! holds the displayed value and walks it toward the persisted target one step
//! per tick, so the view layer only has to call [`PercentSweep::tick`] on its
//! frame timer and render [`PercentSweep::displayed`].

/// Step size used when none is given, in percentage points per tick.
pub const DEFAULT_STEP: f64 = 1.0;

//
// ─── PERCENT SWEEP ─────────────────────────────────────────────────────────────
//

/// Displayed percentage sweeping toward a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentSweep {
    current: f64,
    target: f64,
    step: f64,
}

impl PercentSweep {
    /// Starts settled at `value`, clamped to the 0 to 100 range.
    #[must_use]
    pub fn new(value: f64) -> Self {
        let value = clamp_percent(value);
        Self {
            current: value,
            target: value,
            step: DEFAULT_STEP,
        }
    }

    /// Starts at `from` and sweeps toward `to`.
    #[must_use]
    pub fn toward(from: f64, to: f64) -> Self {
        let mut sweep = Self::new(from);
        sweep.retarget(to);
        sweep
    }

    /// Replaces the step size. Zero, negative and non-finite steps fall back
    /// to [`DEFAULT_STEP`].
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = if step.is_finite() && step > 0.0 {
            step
        } else {
            DEFAULT_STEP
        };
        self
    }

    /// Points the sweep at a new target without disturbing the displayed
    /// value. Targets outside 0 to 100 are clamped.
    pub fn retarget(&mut self, target: f64) {
        self.target = clamp_percent(target);
    }

    /// Advances one frame. Returns `true` while the display is still moving.
    pub fn tick(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        let remaining = self.target - self.current;
        if remaining.abs() <= self.step {
            self.current = self.target;
        } else {
            self.current += self.step.copysign(remaining);
        }
        !self.is_settled()
    }

    /// Value the view should render right now.
    #[must_use]
    pub fn displayed(&self) -> f64 {
        self.current
    }

    /// Value the sweep is walking toward.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the displayed value has reached the target.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        (self.target - self.current).abs() < f64::EPSILON
    }
}

impl Default for PercentSweep {
    fn default() -> Self {
        Self::new(0.0)
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweeps_up_one_step_per_tick() {
        let mut sweep = PercentSweep::toward(0.0, 3.0);
        assert!(sweep.tick());
        assert!((sweep.displayed() - 1.0).abs() < f64::EPSILON);
        assert!(sweep.tick());
        assert!(!sweep.tick());
        assert!((sweep.displayed() - 3.0).abs() < f64::EPSILON);
        assert!(sweep.is_settled());
    }

    #[test]
    fn snaps_to_target_instead_of_overshooting() {
        let mut sweep = PercentSweep::toward(0.0, 5.0).with_step(2.0);
        sweep.tick();
        sweep.tick();
        sweep.tick();
        assert!((sweep.displayed() - 5.0).abs() < f64::EPSILON);
        assert!(sweep.is_settled());
    }

    #[test]
    fn retarget_keeps_the_displayed_value() {
        let mut sweep = PercentSweep::new(50.0);
        sweep.retarget(100.0);
        assert!((sweep.displayed() - 50.0).abs() < f64::EPSILON);
        assert!(!sweep.is_settled());
    }

    #[test]
    fn sweeps_down_when_the_target_is_below() {
        let mut sweep = PercentSweep::toward(10.0, 8.0);
        sweep.tick();
        sweep.tick();
        assert!(sweep.is_settled());
        assert!((sweep.displayed() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn targets_are_clamped_to_percent_range() {
        let mut sweep = PercentSweep::new(0.0);
        sweep.retarget(250.0);
        assert!((sweep.target() - 100.0).abs() < f64::EPSILON);
        sweep.retarget(-10.0);
        assert!(sweep.target().abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_step_falls_back_to_default() {
        let mut sweep = PercentSweep::toward(0.0, 2.0).with_step(f64::NAN);
        sweep.tick();
        assert!((sweep.displayed() - DEFAULT_STEP).abs() < f64::EPSILON);
    }
}
