use std::time::{Duration, Instant};

pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct RatioControl {
    committed: f64,
    draft: f64,
    dragging: bool,
    pending: Option<(Instant, f64)>,
    settle: Duration,
}

fn clamp(ratio: f64) -> Option<f64> {
    (!ratio.is_nan()).then(|| ratio.clamp(0.0, 1.0))
}

impl RatioControl {
    pub fn new(committed: f64) -> Self {
        let committed = clamp(committed).unwrap_or(super::reveal::DEFAULT_RATIO);
        Self {
            committed,
            draft: committed,
            dragging: false,
            pending: None,
            settle: SETTLE_DELAY,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn committed(&self) -> f64 {
        self.committed
    }

    pub fn draft(&self) -> f64 {
        self.draft
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whole-percent label of the draft, as shown next to the slider.
    pub fn percent(&self) -> u32 {
        (self.draft * 100.0).round() as u32
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn drag_to(&mut self, ratio: f64) {
        if let Some(ratio) = clamp(ratio) {
            self.draft = ratio;
        }
    }

    /// End of a drag: schedule the draft for commit.
    pub fn release(&mut self, now: Instant) {
        if self.dragging {
            self.dragging = false;
            self.schedule(now);
        }
    }

    /// Discrete adjustment (keyboard, apply button): set and schedule at once.
    pub fn nudge(&mut self, ratio: f64, now: Instant) {
        self.drag_to(ratio);
        self.schedule(now);
    }

    fn schedule(&mut self, now: Instant) {
        // a newer commit supersedes any pending one
        self.pending = Some((now + self.settle, self.draft));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(at, _)| at)
    }

    /// Commit a pending value whose settle delay has passed. Returns the newly
    /// committed ratio.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        match self.pending {
            Some((at, value)) if at <= now => {
                self.pending = None;
                self.committed = value;
                Some(value)
            }
            _ => None,
        }
    }

    /// Follow a committed value changed elsewhere, unless a drag is in progress.
    pub fn sync(&mut self, committed: f64) {
        if let Some(committed) = clamp(committed) {
            self.committed = committed;
            if !self.dragging {
                self.draft = committed;
            }
        }
    }

    /// Drop any pending commit, e.g. when the view goes away.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_does_not_commit() {
        let now = Instant::now();
        let mut control = RatioControl::new(0.5);
        control.begin_drag();
        for step in 0..10 {
            control.drag_to(f64::from(step) / 10.0);
            assert_eq!(control.poll(now + Duration::from_secs(1)), None);
        }
        assert_eq!(control.committed(), 0.5);
        assert_eq!(control.draft(), 0.9);
    }

    #[test]
    fn test_release_commits_after_settle() {
        let now = Instant::now();
        let mut control = RatioControl::new(0.5);
        control.begin_drag();
        control.drag_to(0.2);
        control.release(now);

        assert_eq!(control.poll(now + Duration::from_millis(10)), None);
        assert_eq!(control.poll(now + SETTLE_DELAY), Some(0.2));
        assert_eq!(control.committed(), 0.2);
        assert_eq!(control.poll(now + SETTLE_DELAY * 2), None);
    }

    #[test]
    fn test_nudge_supersedes_pending() {
        let now = Instant::now();
        let mut control = RatioControl::new(0.5);
        control.nudge(0.3, now);
        control.nudge(0.4, now + Duration::from_millis(20));

        assert_eq!(control.poll(now + SETTLE_DELAY), None);
        assert_eq!(
            control.poll(now + Duration::from_millis(20) + SETTLE_DELAY),
            Some(0.4)
        );
    }

    #[test]
    fn test_sync_respects_drag() {
        let mut control = RatioControl::new(0.5);
        control.begin_drag();
        control.drag_to(0.8);
        control.sync(0.1);
        assert_eq!(control.draft(), 0.8);
        assert_eq!(control.committed(), 0.1);

        let mut idle = RatioControl::new(0.5);
        idle.sync(0.1);
        assert_eq!(idle.draft(), 0.1);
    }

    #[test]
    fn test_cancel_and_clamp() {
        let now = Instant::now();
        let mut control = RatioControl::new(2.0);
        assert_eq!(control.committed(), 1.0);
        control.nudge(-1.0, now);
        control.cancel();
        assert_eq!(control.poll(now + SETTLE_DELAY), None);
        assert_eq!(control.draft(), 0.0);
        assert_eq!(control.percent(), 0);
    }
}
