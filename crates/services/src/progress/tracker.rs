use std::mem;

/// A video counts as watched once playback crosses this share of its
/// duration.
pub const WATCH_THRESHOLD: f64 = 0.8;

/// Per-view playback bookkeeping for one open lesson.
///
/// The tracker owns two things: the watched latch, which fires at most once
/// per view however often playback reports arrive, and the running count of
/// seconds spent on the page, drained in batches by whoever persists them.
#[derive(Debug, Clone, Default)]
pub struct LessonViewTracker {
    watched_fired: bool,
    pending_secs: u64,
}

impl LessonViewTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one playback report. Returns `true` exactly once, when the
    /// threshold is first crossed.
    pub fn observe_playback(&mut self, position_secs: f64, duration_secs: f64) -> bool {
        if self.watched_fired || duration_secs <= 0.0 {
            return false;
        }
        if position_secs / duration_secs >= WATCH_THRESHOLD {
            self.watched_fired = true;
            return true;
        }
        false
    }

    /// Arms the latch without firing it, for lessons already watched on a
    /// previous visit.
    pub fn latch_watched(&mut self) {
        self.watched_fired = true;
    }

    /// Counts one second of time on the page.
    pub fn tick_second(&mut self) {
        self.pending_secs = self.pending_secs.saturating_add(1);
    }

    /// Drains the unpersisted seconds, leaving zero behind.
    pub fn take_pending_secs(&mut self) -> u64 {
        mem::take(&mut self.pending_secs)
    }

    #[must_use]
    pub fn pending_secs(&self) -> u64 {
        self.pending_secs
    }

    #[must_use]
    pub fn watched(&self) -> bool {
        self.watched_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_when_the_threshold_is_crossed() {
        let mut tracker = LessonViewTracker::new();
        assert!(!tracker.observe_playback(30.0, 100.0));
        assert!(tracker.observe_playback(80.0, 100.0));
        assert!(tracker.watched());
        assert!(!tracker.observe_playback(95.0, 100.0));
    }

    #[test]
    fn zero_duration_never_fires() {
        let mut tracker = LessonViewTracker::new();
        assert!(!tracker.observe_playback(10.0, 0.0));
        assert!(!tracker.watched());
    }

    #[test]
    fn pre_latched_tracker_stays_silent() {
        let mut tracker = LessonViewTracker::new();
        tracker.latch_watched();
        assert!(!tracker.observe_playback(100.0, 100.0));
    }

    #[test]
    fn seconds_accumulate_and_drain() {
        let mut tracker = LessonViewTracker::new();
        tracker.tick_second();
        tracker.tick_second();
        tracker.tick_second();
        assert_eq!(tracker.pending_secs(), 3);
        assert_eq!(tracker.take_pending_secs(), 3);
        assert_eq!(tracker.pending_secs(), 0);
    }
}
