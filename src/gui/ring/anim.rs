use crate::config::Tuning;
use crate::gui::ring::COLLAPSED_DIAMETER;
use std::f64::consts::PI;

/// Full-size diameters the scale transitions grow towards. Derived from the
/// current geometry, so a resize mid-transition retargets the next sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTargets {
    pub large: f64,
    pub small: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalePhase {
    Collapsed,
    Expanded,
    Running {
        direction: ScaleDirection,
        started_at: i64,
    },
}

/// Scalar animation values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Current rotation angle in degrees, wraps at 360.
    pub rotation_deg: f64,
    /// Current diameter of animatable large items.
    pub large: f64,
    /// Current diameter of animatable small items.
    pub small: f64,
}

/// Animation bookkeeping for the widget: the rotation epoch and the scale
/// transition phase. Current values are never stored; [`AnimationState::sample`]
/// derives them from a frame-clock timestamp, which keeps the whole update
/// path testable without a live timer.
#[derive(Debug, Clone, Copy)]
pub struct AnimationState {
    rotation_epoch: Option<i64>,
    rotation_period_us: i64,
    scale_duration_us: i64,
    phase: ScalePhase,
}

impl AnimationState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            rotation_epoch: None,
            rotation_period_us: period_us(tuning.rotation_period_ms),
            scale_duration_us: period_us(tuning.scale_duration_ms),
            phase: ScalePhase::Collapsed,
        }
    }

    pub fn retune(&mut self, tuning: &Tuning) {
        self.rotation_period_us = period_us(tuning.rotation_period_ms);
        self.scale_duration_us = period_us(tuning.scale_duration_ms);
    }

    /// Starts the continuous rotation. A no-op while already running.
    pub fn start_rotation(&mut self, now_us: i64) {
        if self.rotation_epoch.is_none() {
            self.rotation_epoch = Some(now_us);
        }
    }

    pub fn stop_rotation(&mut self) {
        self.rotation_epoch = None;
    }

    /// Starts the show transition from the collapsed bound. Any in-flight
    /// hide is discarded so its mid-flight values cannot leak in.
    pub fn play_show(&mut self, now_us: i64) {
        self.phase = ScalePhase::Running {
            direction: ScaleDirection::Show,
            started_at: now_us,
        };
    }

    /// Starts the hide transition from the fully expanded bound.
    pub fn play_hide(&mut self, now_us: i64) {
        self.phase = ScalePhase::Running {
            direction: ScaleDirection::Hide,
            started_at: now_us,
        };
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation_epoch.is_some()
    }

    pub fn is_scaling(&self, now_us: i64) -> bool {
        match self.phase {
            ScalePhase::Running { started_at, .. } => now_us - started_at < self.scale_duration_us,
            _ => false,
        }
    }

    pub fn is_live(&self, now_us: i64) -> bool {
        self.is_rotating() || self.is_scaling(now_us)
    }

    /// Folds a finished transition into its terminal phase. Sampling a
    /// finished transition already yields the held final value; this only
    /// lets `is_scaling` settle back to false.
    pub fn settle(&mut self, now_us: i64) {
        if let ScalePhase::Running {
            direction,
            started_at,
        } = self.phase
            && now_us - started_at >= self.scale_duration_us
        {
            self.phase = match direction {
                ScaleDirection::Show => ScalePhase::Expanded,
                ScaleDirection::Hide => ScalePhase::Collapsed,
            };
        }
    }

    /// Derives the animation values at `now_us`. Pure with respect to the
    /// stored epochs; the same inputs always produce the same sample.
    pub fn sample(&self, now_us: i64, targets: ScaleTargets) -> Sample {
        let rotation_deg = match self.rotation_epoch {
            Some(epoch) => {
                ((now_us - epoch) as f64 / self.rotation_period_us as f64 * 360.0).rem_euclid(360.0)
            }
            None => 0.0,
        };

        let large = match self.phase {
            ScalePhase::Collapsed => COLLAPSED_DIAMETER,
            ScalePhase::Expanded => targets.large,
            ScalePhase::Running {
                direction,
                started_at,
            } => {
                let progress =
                    ((now_us - started_at) as f64 / self.scale_duration_us as f64).clamp(0.0, 1.0);
                let eased = ease_in_out(progress);
                match direction {
                    ScaleDirection::Show => {
                        COLLAPSED_DIAMETER + (targets.large - COLLAPSED_DIAMETER) * eased
                    }
                    ScaleDirection::Hide => {
                        targets.large - (targets.large - COLLAPSED_DIAMETER) * eased
                    }
                }
            }
        };

        // Small items track the large value until it passes their own
        // target, then hold there.
        let small = large.min(targets.small);

        Sample {
            rotation_deg,
            large,
            small,
        }
    }
}

fn period_us(ms: u64) -> i64 {
    ms.max(1) as i64 * 1000
}

fn ease_in_out(progress: f64) -> f64 {
    0.5 - 0.5 * (PI * progress).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGETS: ScaleTargets = ScaleTargets {
        large: 50.0,
        small: 37.5,
    };
    const SHOW_US: i64 = 350_000;
    const PERIOD_US: i64 = 40_000_000;

    fn anim() -> AnimationState {
        AnimationState::new(&Tuning::default())
    }

    #[test]
    fn test_rotation_idle_before_start() {
        let sample = anim().sample(123_456, TARGETS);
        assert_eq!(sample.rotation_deg, 0.0);
    }

    #[test]
    fn test_rotation_is_periodic() {
        let mut anim = anim();
        anim.start_rotation(5_000);

        let quarter = anim.sample(5_000 + PERIOD_US / 4, TARGETS);
        assert!((quarter.rotation_deg - 90.0).abs() < 1e-9);

        let t = 5_000 + 7_123_456;
        let a = anim.sample(t, TARGETS).rotation_deg;
        let b = anim.sample(t + PERIOD_US, TARGETS).rotation_deg;
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_start_rotation_is_idempotent() {
        let mut anim = anim();
        anim.start_rotation(0);
        anim.start_rotation(1_000_000);

        let sample = anim.sample(PERIOD_US / 2, TARGETS);
        assert!((sample.rotation_deg - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_easing_shape() {
        assert!((ease_in_out(0.0)).abs() < 1e-12);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-12);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
        // Symmetric around the midpoint.
        for p in [0.1, 0.25, 0.4] {
            assert!((ease_in_out(p) + ease_in_out(1.0 - p) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_show_reaches_and_holds_targets() {
        let mut anim = anim();
        anim.play_show(0);

        let done = anim.sample(SHOW_US, TARGETS);
        assert!((done.large - 50.0).abs() < 1e-9);
        assert!((done.small - 37.5).abs() < 1e-9);

        // Held after completion, with or without settling.
        let later = anim.sample(SHOW_US * 10, TARGETS);
        assert_eq!(later.large, done.large);
        anim.settle(SHOW_US * 10);
        assert!(!anim.is_scaling(SHOW_US * 10));
        assert_eq!(anim.sample(SHOW_US * 20, TARGETS).large, 50.0);
    }

    #[test]
    fn test_small_tracks_large_until_threshold() {
        let mut anim = anim();
        anim.play_show(0);

        // Midway the large value is below the small target, so both match.
        let mid = anim.sample(SHOW_US / 2, TARGETS);
        assert!(mid.large < TARGETS.small);
        assert_eq!(mid.small, mid.large);

        // Near the end the large value has passed it and small holds.
        let late = anim.sample(SHOW_US * 9 / 10, TARGETS);
        assert!(late.large > TARGETS.small);
        assert_eq!(late.small, TARGETS.small);
    }

    #[test]
    fn test_hide_mirrors_show() {
        let mut anim = anim();
        anim.play_show(0);
        anim.settle(SHOW_US);
        anim.play_hide(SHOW_US);

        let mid = anim.sample(SHOW_US + SHOW_US / 2, TARGETS);
        assert!(mid.large < TARGETS.large);

        let done = anim.sample(SHOW_US * 2, TARGETS);
        assert_eq!(done.large, COLLAPSED_DIAMETER);
        assert_eq!(done.small, COLLAPSED_DIAMETER);
    }

    #[test]
    fn test_hide_interrupting_show_ends_collapsed() {
        let mut anim = anim();
        anim.play_show(0);

        // Interrupt a third of the way in. The hide restarts from the
        // expanded bound, so its end state is independent of the show's
        // progress at interruption.
        let interrupt = SHOW_US / 3;
        anim.play_hide(interrupt);

        let done = anim.sample(interrupt + SHOW_US, TARGETS);
        assert_eq!(done.large, COLLAPSED_DIAMETER);
        assert_eq!(done.small, COLLAPSED_DIAMETER);

        anim.settle(interrupt + SHOW_US);
        assert!(!anim.is_live(interrupt + SHOW_US));
    }

    #[test]
    fn test_rotation_runs_through_scale_transitions() {
        let mut anim = anim();
        anim.start_rotation(0);
        anim.play_show(0);

        let sample = anim.sample(SHOW_US / 2, TARGETS);
        assert!(sample.rotation_deg > 0.0);
        assert!(sample.large > COLLAPSED_DIAMETER);
        assert!(anim.is_live(SHOW_US / 2));
    }
}
