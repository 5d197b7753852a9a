use crate::model::exercise_stats::ExerciseStats;
use crate::model::lesson_stats::LessonStats;
use crate::progress::mean;

/// Cross-lesson rollup for one user, derived from the per-lesson and
/// per-exercise stats documents found under the user's key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserSummary {
    total_time_spent_secs: u64,
    average_progress: f64,
    average_accuracy: f64,
}

impl UserSummary {
    /// Aggregates the documents a per-user scan produced.
    ///
    /// Average progress covers every lesson document that exists; average
    /// accuracy covers only exercise entries with a non-zero mean. Either
    /// average is zero when no document qualifies.
    #[must_use]
    pub fn from_stats(lessons: &[LessonStats], exercises: &[ExerciseStats]) -> Self {
        let total_time_spent_secs = lessons
            .iter()
            .fold(0_u64, |sum, stats| sum.saturating_add(stats.time_spent_secs()));

        let progress_values: Vec<f64> = lessons.iter().map(LessonStats::lesson_progress).collect();

        let accuracy_values: Vec<f64> = exercises
            .iter()
            .map(ExerciseStats::average_accuracy)
            .filter(|accuracy| *accuracy > 0.0)
            .collect();

        Self {
            total_time_spent_secs,
            average_progress: mean(&progress_values),
            average_accuracy: mean(&accuracy_values),
        }
    }

    // Accessors
    #[must_use]
    pub fn total_time_spent_secs(&self) -> u64 {
        self.total_time_spent_secs
    }

    #[must_use]
    pub fn average_progress(&self) -> f64 {
        self.average_progress
    }

    #[must_use]
    pub fn average_accuracy(&self) -> f64 {
        self.average_accuracy
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn lesson_stats(progress: f64, time_secs: u64) -> LessonStats {
        LessonStats::from_persisted(false, false, progress, time_secs, 0.0, fixed_now())
    }

    #[test]
    fn empty_input_yields_zeros() {
        let summary = UserSummary::from_stats(&[], &[]);
        assert_eq!(summary.total_time_spent_secs(), 0);
        assert!((summary.average_progress() - 0.0).abs() < f64::EPSILON);
        assert!((summary.average_accuracy() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sums_time_and_averages_progress() {
        let lessons = vec![lesson_stats(100.0, 120), lesson_stats(50.0, 60), lesson_stats(0.0, 0)];
        let summary = UserSummary::from_stats(&lessons, &[]);

        assert_eq!(summary.total_time_spent_secs(), 180);
        assert!((summary.average_progress() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_ignores_zero_entries() {
        let with_tries = ExerciseStats::from_persisted(vec![80.0, 60.0], 80.0);
        let untouched = ExerciseStats::new_zeroed();
        let summary = UserSummary::from_stats(&[], &[with_tries, untouched]);

        assert!((summary.average_accuracy() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_accuracy_entries_yield_zero_average() {
        let untouched = ExerciseStats::new_zeroed();
        let summary = UserSummary::from_stats(&[], &[untouched.clone(), untouched]);
        assert!((summary.average_accuracy() - 0.0).abs() < f64::EPSILON);
    }
}
