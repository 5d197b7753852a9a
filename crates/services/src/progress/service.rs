use nihongo_core::Clock;
use nihongo_core::model::{
    ExerciseId, ExerciseStats, LessonId, LessonStats, ProgressRaise, QuizScore, StatsKey, UserId,
    UserStats, UserSummary,
};
use nihongo_core::progress::is_complete;
use storage::StatsStore;

use crate::error::ProgressError;

/// Outcome of one graded quiz submission: the sheet's score, the lesson
/// progress movement it caused, and the attempt history after recording it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub percent: f64,
    pub raise: Option<ProgressRaise>,
    pub number_of_tries: u32,
    pub average_accuracy: f64,
    pub max_exercise_score: f64,
}

/// Persistence rules for everything a user does inside a lesson.
///
/// Per-lesson stats, per-exercise attempt history and the profile roll-up
/// are kept in step here: each recorded event writes the lesson document
/// and amends the profile in the same call.
///
/// Every write is a plain read-modify-save with last-write-wins at the
/// store; two sessions recording for the same user concurrently can drop
/// one raise.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    stats: StatsStore,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, stats: StatsStore) -> Self {
        Self { clock, stats }
    }

    /// Stats for a lesson the user just opened, created zeroed on first
    /// visit. Also points the profile's last-lesson marker at it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a read or write fails.
    pub async fn open_lesson_stats(
        &self,
        user: &UserId,
        lesson: &LessonId,
    ) -> Result<LessonStats, ProgressError> {
        let key = StatsKey::for_lesson(user, lesson);
        let stats = match self.stats.lesson_stats(&key).await? {
            Some(stats) => stats,
            None => {
                let stats = LessonStats::new_zeroed(self.clock.now());
                self.stats.save_lesson_stats(&key, &stats).await?;
                stats
            }
        };
        self.amend_profile(user, |profile| profile.touch_last_lesson(lesson))
            .await?;
        Ok(stats)
    }

    /// Records that the lesson's video crossed the watch threshold.
    ///
    /// Progress only ever moves up; re-watching an already-watched video
    /// reports `None`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a read or write fails.
    pub async fn mark_video_watched(
        &self,
        user: &UserId,
        lesson: &LessonId,
    ) -> Result<Option<ProgressRaise>, ProgressError> {
        let key = StatsKey::for_lesson(user, lesson);
        let mut stats = self.load_or_zeroed(&key).await?;
        stats.mark_video_watched(self.clock.now());
        let raise = stats.raise_progress(self.clock.now());
        self.stats.save_lesson_stats(&key, &stats).await?;

        if raise.is_some_and(|raise| is_complete(raise.to)) {
            self.amend_profile(user, UserStats::mark_lesson_completed)
                .await?;
        }
        Ok(raise)
    }

    /// Records one graded quiz, updating the lesson document, the attempt
    /// history and the profile's per-lesson best score.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a read or write fails.
    pub async fn record_quiz(
        &self,
        user: &UserId,
        lesson: &LessonId,
        score: QuizScore,
    ) -> Result<QuizOutcome, ProgressError> {
        let percent = score.percentage();

        let key = StatsKey::for_lesson(user, lesson);
        let mut stats = self.load_or_zeroed(&key).await?;
        stats.record_quiz(percent, self.clock.now());
        let raise = stats.raise_progress(self.clock.now());
        self.stats.save_lesson_stats(&key, &stats).await?;

        let attempts = self
            .record_exercise_attempt(user, &ExerciseId::for_lesson(lesson), score)
            .await?;

        let best = stats.max_quiz_score();
        let completed_now = raise.is_some_and(|raise| is_complete(raise.to));
        self.amend_profile(user, |profile| {
            profile.record_quiz_score(lesson, best);
            if completed_now {
                profile.mark_lesson_completed();
            }
        })
        .await?;

        Ok(QuizOutcome {
            percent,
            raise,
            number_of_tries: attempts.number_of_tries(),
            average_accuracy: attempts.average_accuracy(),
            max_exercise_score: attempts.max_exercise_score(),
        })
    }

    /// Appends one attempt to the exercise history and returns the updated
    /// document.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a read or write fails.
    pub async fn record_exercise_attempt(
        &self,
        user: &UserId,
        exercise: &ExerciseId,
        score: QuizScore,
    ) -> Result<ExerciseStats, ProgressError> {
        let key = StatsKey::for_exercise(user, exercise);
        let mut stats = self
            .stats
            .exercise_stats(&key)
            .await?
            .unwrap_or_else(ExerciseStats::new_zeroed);
        stats.record_attempt(score.percentage());
        self.stats.save_exercise_stats(&key, &stats).await?;
        Ok(stats)
    }

    /// Adds batched on-page seconds to the lesson document and the profile
    /// total. A zero delta writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a read or write fails.
    pub async fn flush_time(
        &self,
        user: &UserId,
        lesson: &LessonId,
        delta_secs: u64,
    ) -> Result<(), ProgressError> {
        if delta_secs == 0 {
            return Ok(());
        }

        let key = StatsKey::for_lesson(user, lesson);
        let mut stats = self.load_or_zeroed(&key).await?;
        stats.add_time(delta_secs, self.clock.now());
        self.stats.save_lesson_stats(&key, &stats).await?;

        self.amend_profile(user, |profile| profile.add_time(delta_secs))
            .await
    }

    /// Aggregates every stats document the user owns into the home-view
    /// summary.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a scan fails.
    pub async fn load_summary(&self, user: &UserId) -> Result<UserSummary, ProgressError> {
        let lessons = self.stats.lesson_stats_for_user(user).await?;
        let exercises = self.stats.exercise_stats_for_user(user).await?;
        Ok(UserSummary::from_stats(&lessons, &exercises))
    }

    /// The user's profile, created zeroed on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a read or write fails.
    pub async fn ensure_user_stats(&self, user: &UserId) -> Result<UserStats, ProgressError> {
        match self.stats.user_stats(user).await? {
            Some(stats) => Ok(stats),
            None => {
                let stats = UserStats::new_zeroed();
                self.stats.save_user_stats(user, &stats).await?;
                Ok(stats)
            }
        }
    }

    async fn load_or_zeroed(&self, key: &StatsKey) -> Result<LessonStats, ProgressError> {
        Ok(self
            .stats
            .lesson_stats(key)
            .await?
            .unwrap_or_else(|| LessonStats::new_zeroed(self.clock.now())))
    }

    /// Applies one mutation to the profile, creating it when absent.
    /// Existing profiles go through the update-only write path.
    async fn amend_profile(
        &self,
        user: &UserId,
        amend: impl FnOnce(&mut UserStats),
    ) -> Result<(), ProgressError> {
        match self.stats.user_stats(user).await? {
            Some(mut profile) => {
                amend(&mut profile);
                self.stats.update_user_stats(user, &profile).await?;
            }
            None => {
                let mut profile = UserStats::new_zeroed();
                amend(&mut profile);
                self.stats.save_user_stats(user, &profile).await?;
            }
        }
        Ok(())
    }
}
