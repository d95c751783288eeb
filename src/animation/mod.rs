//! Staggered entrance animation for grid cards.
//!
//! Cards are grouped into waves of `stagger_factor` items. Every card in a
//! wave shares one start delay and the delay grows with the wave number up to
//! a ceiling, so long grids never keep their last cards waiting. Positions are
//! relative to the viewport: a card re-entering the screen gets a fresh delay
//! for where it appears now (see [`EntranceTracker`]).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

mod tracker;

pub use tracker::EntranceTracker;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Easing {
    Linear,
    /// Material-style standard curve, cubic bezier (0.4, 0.0, 0.2, 1.0).
    #[default]
    FastOutSlowIn,
    EaseOutCubic,
}

impl Easing {
    /// Maps linear progress to eased progress. Exact at both ends and
    /// non-decreasing in between.
    pub fn transform(self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, t),
            Easing::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
        }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f32) -> f32 {
    fn sample(a1: f64, a2: f64, s: f64) -> f64 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    }

    // x(s) is monotonic for control points in [0, 1]; bisection keeps the
    // solved parameter monotonic in `t` as well.
    let target = f64::from(t);
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..32 {
        let mid = (lo + hi) / 2.0;
        if sample(x1, x2, mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (sample(y1, y2, (lo + hi) / 2.0) as f32).clamp(0.0, 1.0)
}

/// Tuning for the wave delay. Presentation constants, not behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaggerTuning {
    pub wave_delay: Duration,
    pub max_delay: Duration,
    pub easing: Easing,
}

impl Default for StaggerTuning {
    fn default() -> Self {
        Self {
            wave_delay: Duration::from_millis(60),
            max_delay: Duration::from_millis(600),
            easing: Easing::FastOutSlowIn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrance {
    pub wave: usize,
    pub delay: Duration,
    pub easing: Easing,
}

/// Wave number of `index`.
///
/// # Panics
///
/// Panics when `stagger_factor` is zero.
pub fn wave(index: usize, stagger_factor: usize) -> usize {
    assert!(stagger_factor > 0, "stagger factor must be positive");
    index / stagger_factor
}

impl StaggerTuning {
    pub fn entrance(&self, index: usize, stagger_factor: usize) -> Entrance {
        let wave = wave(index, stagger_factor);
        let nanos = self
            .wave_delay
            .as_nanos()
            .saturating_mul(wave as u128)
            .min(self.max_delay.as_nanos());
        let delay = u64::try_from(nanos)
            .map(Duration::from_nanos)
            .unwrap_or(self.max_delay);
        Entrance {
            wave,
            delay,
            easing: self.easing,
        }
    }
}

/// [`StaggerTuning::entrance`] with the default tuning.
pub fn compute_entrance(index: usize, stagger_factor: usize) -> Entrance {
    StaggerTuning::default().entrance(index, stagger_factor)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub delay: Duration,
    pub easing: Easing,
}

impl AnimationSpec {
    /// Linear progress in `[0, 1]` after `elapsed` time on the clock.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        (running.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.delay + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleAlphaArgs {
    pub from_scale: f32,
    pub to_scale: f32,
    pub from_alpha: f32,
    pub to_alpha: f32,
}

impl Default for ScaleAlphaArgs {
    fn default() -> Self {
        Self {
            from_scale: 0.8,
            to_scale: 1.0,
            from_alpha: 0.0,
            to_alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleAlpha {
    pub scale: f32,
    pub alpha: f32,
}

impl ScaleAlpha {
    pub fn settled(args: &ScaleAlphaArgs) -> Self {
        Self {
            scale: args.to_scale,
            alpha: args.to_alpha,
        }
    }
}

/// Both channels driven by one clock and one eased progress value.
pub fn scale_and_alpha(args: &ScaleAlphaArgs, spec: &AnimationSpec, elapsed: Duration) -> ScaleAlpha {
    sample_at(args, spec.easing, spec.progress(elapsed))
}

pub(crate) fn sample_at(args: &ScaleAlphaArgs, easing: Easing, progress: f32) -> ScaleAlpha {
    if progress <= 0.0 {
        return ScaleAlpha {
            scale: args.from_scale,
            alpha: args.from_alpha,
        };
    }
    if progress >= 1.0 {
        return ScaleAlpha::settled(args);
    }
    let eased = easing.transform(progress);
    ScaleAlpha {
        scale: lerp(args.from_scale, args.to_scale, eased),
        alpha: lerp(args.from_alpha, args.to_alpha, eased),
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let value = from + (to - from) * t;
    value.clamp(from.min(to), from.max(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_shared_within_a_wave_and_never_decreases() {
        for factor in 1..=5 {
            let mut previous = Duration::ZERO;
            for index in 0..200 {
                let entrance = compute_entrance(index, factor);
                assert_eq!(entrance.wave, index / factor);
                assert!(entrance.delay >= previous, "index {index} factor {factor}");
                if index % factor != 0 {
                    assert_eq!(entrance.delay, previous);
                }
                previous = entrance.delay;
            }
        }
    }

    #[test]
    fn delay_is_capped_for_long_lists() {
        let tuning = StaggerTuning::default();
        assert_eq!(compute_entrance(0, 2).delay, Duration::ZERO);
        assert_eq!(compute_entrance(2, 2).delay, tuning.wave_delay);
        assert_eq!(compute_entrance(1_000_000, 2).delay, tuning.max_delay);
        assert_eq!(compute_entrance(usize::MAX, 1).delay, tuning.max_delay);
    }

    #[test]
    #[should_panic(expected = "stagger factor must be positive")]
    fn zero_stagger_factor_panics() {
        compute_entrance(3, 0);
    }

    #[test]
    fn easings_are_exact_at_the_ends_and_monotonic() {
        for easing in [Easing::Linear, Easing::FastOutSlowIn, Easing::EaseOutCubic] {
            assert_eq!(easing.transform(0.0), 0.0);
            assert_eq!(easing.transform(1.0), 1.0);
            let mut last = 0.0;
            for step in 0..=100 {
                let value = easing.transform(step as f32 / 100.0);
                assert!(value >= last, "{easing} dipped at step {step}");
                assert!((0.0..=1.0).contains(&value));
                last = value;
            }
        }
    }

    #[test]
    fn fast_out_slow_in_front_loads_motion() {
        assert!(Easing::FastOutSlowIn.transform(0.5) > 0.5);
    }

    #[test]
    fn scale_and_alpha_hits_both_bounds_exactly() {
        let args = ScaleAlphaArgs {
            from_scale: 0.3,
            to_scale: 1.0,
            from_alpha: 0.1,
            to_alpha: 0.9,
        };
        let spec = AnimationSpec {
            duration: Duration::from_millis(300),
            delay: Duration::from_millis(120),
            easing: Easing::FastOutSlowIn,
        };

        let start = scale_and_alpha(&args, &spec, Duration::ZERO);
        assert_eq!(start, ScaleAlpha { scale: 0.3, alpha: 0.1 });
        let still_waiting = scale_and_alpha(&args, &spec, Duration::from_millis(120));
        assert_eq!(still_waiting, start);

        let end = scale_and_alpha(&args, &spec, Duration::from_millis(420));
        assert_eq!(end, ScaleAlpha { scale: 1.0, alpha: 0.9 });
        assert!(spec.is_finished(Duration::from_millis(420)));
    }

    #[test]
    fn intermediate_values_stay_within_bounds_for_reversed_channels() {
        let args = ScaleAlphaArgs {
            from_scale: 1.2,
            to_scale: 0.5,
            from_alpha: 1.0,
            to_alpha: 0.0,
        };
        let spec = AnimationSpec {
            duration: Duration::from_millis(100),
            delay: Duration::ZERO,
            easing: Easing::EaseOutCubic,
        };
        for ms in 1..100 {
            let value = scale_and_alpha(&args, &spec, Duration::from_millis(ms));
            assert!((0.5..=1.2).contains(&value.scale), "scale at {ms}ms");
            assert!((0.0..=1.0).contains(&value.alpha), "alpha at {ms}ms");
        }
    }

    #[test]
    fn zero_duration_completes_after_delay() {
        let spec = AnimationSpec {
            duration: Duration::ZERO,
            delay: Duration::from_millis(10),
            easing: Easing::Linear,
        };
        assert_eq!(spec.progress(Duration::from_millis(5)), 0.0);
        assert_eq!(spec.progress(Duration::from_millis(10)), 1.0);
    }
}
