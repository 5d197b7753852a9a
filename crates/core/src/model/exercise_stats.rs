use crate::progress::mean;

/// Per-user, per-exercise attempt history.
///
/// `tries` is append-only; the average and maximum are derived from it and
/// rewritten together with every attempt, so the stored aggregates never
/// drift from the list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExerciseStats {
    tries: Vec<f64>,
    max_exercise_score: f64,
    average_accuracy: f64,
}

impl ExerciseStats {
    /// Empty history for a first attempt.
    #[must_use]
    pub fn new_zeroed() -> Self {
        Self::default()
    }

    /// Rebuilds stats from the stored attempt list, rederiving the
    /// aggregates from it.
    #[must_use]
    pub fn from_persisted(tries: Vec<f64>, max_exercise_score: f64) -> Self {
        let average_accuracy = mean(&tries);
        Self {
            tries,
            max_exercise_score,
            average_accuracy,
        }
    }

    /// Appends one graded attempt, refreshing the mean and the running max.
    pub fn record_attempt(&mut self, score: f64) {
        self.tries.push(score);
        self.average_accuracy = mean(&self.tries);
        self.max_exercise_score = self.max_exercise_score.max(score);
    }

    // Accessors
    #[must_use]
    pub fn tries(&self) -> &[f64] {
        &self.tries
    }

    /// Attempt count; always equals the length of `tries`.
    #[must_use]
    pub fn number_of_tries(&self) -> u32 {
        // Attempt counts are human-scale.
        #[allow(clippy::cast_possible_truncation)]
        {
            self.tries.len() as u32
        }
    }

    #[must_use]
    pub fn average_accuracy(&self) -> f64 {
        self.average_accuracy
    }

    #[must_use]
    pub fn max_exercise_score(&self) -> f64 {
        self.max_exercise_score
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
