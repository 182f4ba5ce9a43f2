use std::time::Duration;

/// Fixed-step accumulator for the simulation loop.
///
/// Frame time is fed in with [`advance`](Self::advance), which reports how
/// many fixed steps must run. What is left over becomes the lag fraction the
/// renderer uses to extrapolate moving bodies between two steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    accumulator: Duration,
    max_steps_per_frame: u32,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(1.0 / 60.0))
    }
}

impl FixedTimestep {
    /// Create an accumulator with the given step. Zero steps are bumped to 1µs.
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.max(Duration::from_micros(1)),
            accumulator: Duration::ZERO,
            max_steps_per_frame: 8,
        }
    }

    /// Limit the number of steps a single frame may run.
    pub fn with_max_steps(mut self, max_steps_per_frame: u32) -> Self {
        self.max_steps_per_frame = max_steps_per_frame.max(1);
        self
    }

    /// Duration of one fixed step.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Add elapsed frame time and return how many fixed steps to run now.
    ///
    /// When a stall would require more than the configured maximum, the
    /// surplus is dropped so the simulation does not spiral.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.step {
            if steps == self.max_steps_per_frame {
                tracing::debug!(
                    dropped_ms = self.accumulator.as_secs_f64() * 1000.0,
                    "fixed step budget exceeded, dropping accumulated time"
                );
                self.accumulator = Duration::ZERO;
                break;
            }
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// Progress towards the next fixed step, in `[0, 1)`.
    pub fn lag(&self) -> f32 {
        let lag = (self.accumulator.as_secs_f64() / self.step.as_secs_f64()) as f32;
        lag.clamp(0.0, 1.0 - f32::EPSILON)
    }

    /// Wall time since the last completed fixed step.
    pub fn lag_duration(&self) -> Duration {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_whole_steps() {
        let mut clock = FixedTimestep::new(Duration::from_millis(10));
        assert_eq!(clock.advance(Duration::from_millis(25)), 2);
        assert!((clock.lag() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn lag_accumulates_across_frames() {
        let mut clock = FixedTimestep::new(Duration::from_millis(10));
        assert_eq!(clock.advance(Duration::from_millis(4)), 0);
        assert_eq!(clock.advance(Duration::from_millis(4)), 0);
        assert!((clock.lag() - 0.8).abs() < 1e-4);
        assert_eq!(clock.advance(Duration::from_millis(4)), 1);
        assert!((clock.lag() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn lag_is_below_one() {
        let clock = FixedTimestep::new(Duration::from_millis(10));
        assert_eq!(clock.lag(), 0.0);
        assert!(clock.lag() < 1.0);
    }

    #[test]
    fn stall_is_capped() {
        let mut clock = FixedTimestep::new(Duration::from_millis(10)).with_max_steps(3);
        assert_eq!(clock.advance(Duration::from_secs(5)), 3);
        assert_eq!(clock.lag_duration(), Duration::ZERO);
    }

    #[test]
    fn zero_step_is_bumped() {
        let clock = FixedTimestep::new(Duration::ZERO);
        assert!(clock.step() > Duration::ZERO);
    }
}
