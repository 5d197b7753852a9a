use std::collections::BTreeMap;

use crate::model::ids::LessonId;

/// Per-user profile counters, stored once per user.
///
/// Created with zeroed fields at first sign-in. The counters here are
/// maintained alongside the per-lesson documents; cross-lesson rollups are
/// still derived from those documents, not from this one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserStats {
    total_time_spent_secs: u64,
    lessons_completed: u32,
    last_lesson_id: Option<LessonId>,
    quiz_scores: BTreeMap<LessonId, f64>,
}

impl UserStats {
    /// Zeroed profile for a first sign-in.
    #[must_use]
    pub fn new_zeroed() -> Self {
        Self::default()
    }

    /// Rebuilds the profile from stored fields.
    #[must_use]
    pub fn from_persisted(
        total_time_spent_secs: u64,
        lessons_completed: u32,
        last_lesson_id: Option<LessonId>,
        quiz_scores: BTreeMap<LessonId, f64>,
    ) -> Self {
        Self {
            total_time_spent_secs,
            lessons_completed,
            last_lesson_id,
            quiz_scores,
        }
    }

    /// Remembers the lesson the user most recently opened.
    pub fn touch_last_lesson(&mut self, lesson: &LessonId) {
        self.last_lesson_id = Some(lesson.clone());
    }

    /// Mirrors the per-lesson running-max quiz score into the profile.
    pub fn record_quiz_score(&mut self, lesson: &LessonId, max_score: f64) {
        self.quiz_scores.insert(lesson.clone(), max_score);
    }

    /// Counts one lesson whose progress first reached completion.
    pub fn mark_lesson_completed(&mut self) {
        self.lessons_completed = self.lessons_completed.saturating_add(1);
    }

    /// Adds flushed viewing seconds to the profile total.
    pub fn add_time(&mut self, delta_secs: u64) {
        self.total_time_spent_secs = self.total_time_spent_secs.saturating_add(delta_secs);
    }

    // Accessors
    #[must_use]
    pub fn total_time_spent_secs(&self) -> u64 {
        self.total_time_spent_secs
    }

    #[must_use]
    pub fn lessons_completed(&self) -> u32 {
        self.lessons_completed
    }

    #[must_use]
    pub fn last_lesson_id(&self) -> Option<&LessonId> {
        self.last_lesson_id.as_ref()
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &BTreeMap<LessonId, f64> {
        &self.quiz_scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_profile_is_empty() {
        let stats = UserStats::new_zeroed();
        assert_eq!(stats.total_time_spent_secs(), 0);
        assert_eq!(stats.lessons_completed(), 0);
        assert_eq!(stats.last_lesson_id(), None);
        assert!(stats.quiz_scores().is_empty());
    }

    #[test]
    fn quiz_scores_overwrite_per_lesson() {
        let mut stats = UserStats::new_zeroed();
        let lesson = LessonId::new("l1");
        stats.record_quiz_score(&lesson, 60.0);
        stats.record_quiz_score(&lesson, 80.0);

        assert_eq!(stats.quiz_scores().len(), 1);
        assert!((stats.quiz_scores()[&lesson] - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn counters_accumulate() {
        let mut stats = UserStats::new_zeroed();
        stats.add_time(30);
        stats.add_time(15);
        stats.mark_lesson_completed();
        stats.touch_last_lesson(&LessonId::new("l2"));

        assert_eq!(stats.total_time_spent_secs(), 45);
        assert_eq!(stats.lessons_completed(), 1);
        assert_eq!(stats.last_lesson_id(), Some(&LessonId::new("l2")));
    }
}
