use chrono::{DateTime, Utc};

use crate::progress::progress_for;

/// A persisted progress raise: the old and new stored values.
///
/// Produced only when the recomputed progress strictly exceeds the stored
/// one; callers use it to drive the animated sweep between the two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRaise {
    pub from: f64,
    pub to: f64,
}

/// Per-user, per-lesson progress document.
///
/// Progress is derived from the two milestone flags and only ever raised;
/// quiz scores keep a running maximum; viewing time accumulates. Every
/// mutation refreshes `last_accessed`.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonStats {
    video_watched: bool,
    test_completed: bool,
    lesson_progress: f64,
    time_spent_secs: u64,
    max_quiz_score: f64,
    last_accessed: DateTime<Utc>,
}

impl LessonStats {
    /// Zeroed stats for a first access.
    #[must_use]
    pub fn new_zeroed(now: DateTime<Utc>) -> Self {
        Self {
            video_watched: false,
            test_completed: false,
            lesson_progress: 0.0,
            time_spent_secs: 0,
            max_quiz_score: 0.0,
            last_accessed: now,
        }
    }

    /// Rebuilds stats from stored fields.
    #[must_use]
    pub fn from_persisted(
        video_watched: bool,
        test_completed: bool,
        lesson_progress: f64,
        time_spent_secs: u64,
        max_quiz_score: f64,
        last_accessed: DateTime<Utc>,
    ) -> Self {
        Self {
            video_watched,
            test_completed,
            lesson_progress,
            time_spent_secs,
            max_quiz_score,
            last_accessed,
        }
    }

    /// Latches the video-watched milestone.
    pub fn mark_video_watched(&mut self, now: DateTime<Utc>) {
        self.video_watched = true;
        self.last_accessed = now;
    }

    /// Records a graded quiz: raises the running max score and latches the
    /// test-completed milestone.
    pub fn record_quiz(&mut self, score: f64, now: DateTime<Utc>) {
        self.max_quiz_score = self.max_quiz_score.max(score);
        self.test_completed = true;
        self.last_accessed = now;
    }

    /// Recomputes progress from the milestone flags and raises the stored
    /// value when the candidate is strictly greater.
    ///
    /// Returns the raise when one happened, `None` when the stored value
    /// already covers the candidate.
    pub fn raise_progress(&mut self, now: DateTime<Utc>) -> Option<ProgressRaise> {
        let candidate = progress_for(self.video_watched, self.test_completed);
        if candidate <= self.lesson_progress {
            return None;
        }
        let raise = ProgressRaise {
            from: self.lesson_progress,
            to: candidate,
        };
        self.lesson_progress = candidate;
        self.last_accessed = now;
        Some(raise)
    }

    /// Adds locally accumulated viewing seconds.
    pub fn add_time(&mut self, delta_secs: u64, now: DateTime<Utc>) {
        self.time_spent_secs = self.time_spent_secs.saturating_add(delta_secs);
        self.last_accessed = now;
    }

    // Accessors
    #[must_use]
    pub fn video_watched(&self) -> bool {
        self.video_watched
    }

    #[must_use]
    pub fn test_completed(&self) -> bool {
        self.test_completed
    }

    #[must_use]
    pub fn lesson_progress(&self) -> f64 {
        self.lesson_progress
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn max_quiz_score(&self) -> f64 {
        self.max_quiz_score
    }

    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
