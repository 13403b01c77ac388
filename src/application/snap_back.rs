// Time-bounded animation returning a released pan slider to its rest position
use std::time::{Duration, Instant};

pub const SNAP_BACK_DURATION: Duration = Duration::from_millis(200);

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

/// Progress is measured against a monotonic clock, so a late frame jumps
/// ahead instead of stretching the animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapBack {
    from: f64,
    started_at: Instant,
    duration: Duration,
}

impl SnapBack {
    pub fn new(from: f64, started_at: Instant) -> Self {
        Self::with_duration(from, started_at, SNAP_BACK_DURATION)
    }

    pub fn with_duration(from: f64, started_at: Instant, duration: Duration) -> Self {
        Self {
            from,
            started_at,
            duration,
        }
    }

    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Slider value at `now`; exactly 0 once the animation is over
    pub fn value_at(&self, now: Instant) -> f64 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            0.0
        } else {
            self.from * (1.0 - ease_out_cubic(progress))
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}
