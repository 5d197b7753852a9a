//! Pure progress arithmetic shared by the stats models and services.

/// A lesson counts as fully complete at this progress value.
pub const COMPLETE: f64 = 100.0;

/// Progress contributed by each of the two lesson milestones.
const MILESTONE_WEIGHT: f64 = 50.0;

/// Progress percentage for a lesson's two milestones: half for watching the
/// video, half for completing the test, capped at 100.
#[must_use]
pub fn progress_for(video_watched: bool, test_completed: bool) -> f64 {
    let mut progress = 0.0;
    if video_watched {
        progress += MILESTONE_WEIGHT;
    }
    if test_completed {
        progress += MILESTONE_WEIGHT;
    }
    progress.min(COMPLETE)
}

/// Whether a progress value has reached completion.
#[must_use]
pub fn is_complete(progress: f64) -> bool {
    progress >= COMPLETE
}

/// Percentage of correct answers out of a total.
///
/// An empty total scores zero rather than dividing by it.
#[must_use]
pub fn score_percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * f64::from(correct) / f64::from(total)
}

/// Arithmetic mean of a slice of percentages; zero when empty.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    // Stats lists stay small (one entry per attempt or lesson), so a plain
    // sum does not accumulate meaningful error.
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    values.iter().sum::<f64>() / count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_covers_all_milestone_combinations() {
        assert!((progress_for(false, false) - 0.0).abs() < f64::EPSILON);
        assert!((progress_for(true, false) - 50.0).abs() < f64::EPSILON);
        assert!((progress_for(false, true) - 50.0).abs() < f64::EPSILON);
        assert!((progress_for(true, true) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completion_threshold() {
        assert!(!is_complete(99.9));
        assert!(is_complete(100.0));
    }

    #[test]
    fn score_percentage_handles_empty_total() {
        assert!((score_percentage(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((score_percentage(3, 4) - 75.0).abs() < f64::EPSILON);
        assert!((score_percentage(4, 4) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert!((mean(&[]) - 0.0).abs() < f64::EPSILON);
        assert!((mean(&[80.0, 60.0, 100.0]) - 80.0).abs() < f64::EPSILON);
    }
}
