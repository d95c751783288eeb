use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{sample_at, AnimationSpec, ScaleAlpha, ScaleAlphaArgs, StaggerTuning};

/// Per-card entrance clocks for the cards currently on screen.
///
/// The event loop calls [`EntranceTracker::sync_visible`] once per frame with
/// the ids it is about to draw. Cards that left the viewport are dropped, so
/// coming back restarts their entrance from the initial values.
#[derive(Debug)]
pub struct EntranceTracker {
    enabled: bool,
    tuning: StaggerTuning,
    stagger_factor: usize,
    duration: Duration,
    args: ScaleAlphaArgs,
    running: HashMap<i64, Running>,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    started_at: Instant,
    spec: AnimationSpec,
}

impl EntranceTracker {
    /// # Panics
    ///
    /// Panics when `stagger_factor` is zero.
    pub fn new(
        tuning: StaggerTuning,
        stagger_factor: usize,
        duration: Duration,
        args: ScaleAlphaArgs,
    ) -> Self {
        assert!(stagger_factor > 0, "stagger factor must be positive");
        Self {
            enabled: true,
            tuning,
            stagger_factor,
            duration,
            args,
            running: HashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        let mut tracker = Self::new(
            StaggerTuning::default(),
            1,
            Duration::ZERO,
            ScaleAlphaArgs::default(),
        );
        tracker.enabled = false;
        tracker
    }

    /// `visible` lists the ids on screen in render order.
    pub fn sync_visible(&mut self, visible: &[i64], now: Instant) {
        if !self.enabled {
            return;
        }
        self.running.retain(|id, _| visible.contains(id));
        for (position, id) in visible.iter().enumerate() {
            if self.running.contains_key(id) {
                continue;
            }
            let entrance = self.tuning.entrance(position, self.stagger_factor);
            tracing::trace!(note_id = *id, position, wave = entrance.wave, "card entering viewport");
            self.running.insert(
                *id,
                Running {
                    started_at: now,
                    spec: AnimationSpec {
                        duration: self.duration,
                        delay: entrance.delay,
                        easing: entrance.easing,
                    },
                },
            );
        }
    }

    pub fn sample(&self, id: i64, now: Instant) -> ScaleAlpha {
        match self.running.get(&id) {
            Some(running) if self.enabled => {
                let elapsed = now.saturating_duration_since(running.started_at);
                sample_at(&self.args, running.spec.easing, running.spec.progress(elapsed))
            }
            _ => ScaleAlpha::settled(&self.args),
        }
    }

    /// Whether any card still needs frames.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.enabled
            && self.running.values().any(|running| {
                !running
                    .spec
                    .is_finished(now.saturating_duration_since(running.started_at))
            })
    }

    /// Forget every card so the next sync replays the whole entrance.
    pub fn clear(&mut self) {
        self.running.clear();
    }
}
