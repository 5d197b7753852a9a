use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user, issued by the external auth provider.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new `UserId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a lesson, matching its document key in the store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    /// Creates a new `LessonId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for an exercise.
///
/// Exercises are stored under their lesson's id, so an exercise id usually
/// carries the same string as the lesson it belongs to.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(String);

impl ExerciseId {
    /// Creates a new `ExerciseId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id of the exercise attached to a lesson.
    #[must_use]
    pub fn for_lesson(lesson: &LessonId) -> Self {
        Self(lesson.as_str().to_owned())
    }

    /// Returns the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//
// ─── COMPOSITE STATS KEYS ──────────────────────────────────────────────────────
//

/// Document key for per-user stats: `{userId}_{lessonId}` or
/// `{userId}_{exerciseId}`.
///
/// Keys are construct-only: ids may themselves contain underscores, so a key
/// is never split back into its parts. Per-user scans instead match on the
/// `{userId}_` prefix.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsKey(String);

impl StatsKey {
    /// Key for a user's stats on one lesson.
    #[must_use]
    pub fn for_lesson(user: &UserId, lesson: &LessonId) -> Self {
        Self(format!("{}_{}", user.as_str(), lesson.as_str()))
    }

    /// Key for a user's stats on one exercise.
    #[must_use]
    pub fn for_exercise(user: &UserId, exercise: &ExerciseId) -> Self {
        Self(format!("{}_{}", user.as_str(), exercise.as_str()))
    }

    /// Returns the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix selecting every stats key that belongs to `user`.
    #[must_use]
    pub fn user_prefix(user: &UserId) -> String {
        format!("{}_", user.as_str())
    }

    /// Whether a raw document key belongs to `user`.
    #[must_use]
    pub fn key_belongs_to(key: &str, user: &UserId) -> bool {
        key.starts_with(&Self::user_prefix(user))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExerciseId({})", self.0)
    }
}

impl fmt::Debug for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatsKey({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        let id = UserId::new("u-42");
        assert_eq!(id.to_string(), "u-42");
    }

    #[test]
    fn test_exercise_id_for_lesson() {
        let lesson = LessonId::new("lesson001");
        let exercise = ExerciseId::for_lesson(&lesson);
        assert_eq!(exercise.as_str(), "lesson001");
    }

    #[test]
    fn test_lesson_stats_key_format() {
        let key = StatsKey::for_lesson(&UserId::new("u1"), &LessonId::new("lesson001"));
        assert_eq!(key.as_str(), "u1_lesson001");
    }

    #[test]
    fn test_exercise_stats_key_format() {
        let key = StatsKey::for_exercise(&UserId::new("u1"), &ExerciseId::new("lesson001"));
        assert_eq!(key.as_str(), "u1_lesson001");
    }

    #[test]
    fn test_user_prefix_matches_own_keys_only() {
        let user = UserId::new("u1");
        let key = StatsKey::for_lesson(&user, &LessonId::new("a"));
        assert!(StatsKey::key_belongs_to(key.as_str(), &user));
        assert!(!StatsKey::key_belongs_to(key.as_str(), &UserId::new("u10")));
        assert!(!StatsKey::key_belongs_to("u10_a", &user));
    }

    #[test]
    fn test_keys_with_underscored_ids_still_prefix_match() {
        let user = UserId::new("user_one");
        let key = StatsKey::for_lesson(&user, &LessonId::new("lesson_1"));
        assert_eq!(key.as_str(), "user_one_lesson_1");
        assert!(StatsKey::key_belongs_to(key.as_str(), &user));
    }
}
