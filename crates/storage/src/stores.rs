use std::sync::Arc;

use nihongo_core::model::{
    Exercise, ExerciseId, ExerciseStats, Lesson, LessonId, LessonStats, StatsKey, UserId,
    UserStats,
};

use crate::document::{DocumentStore, InMemoryStore, StorageError};
use crate::mapping;

// Collection names are shared with the web clients reading the same
// database, so they stay in their original spelling.
const LESSONS: &str = "lessons";
const EXERCISES: &str = "exercises";
const USER_LESSON_STATS: &str = "userLessonStats";
const USER_TEST_DATA: &str = "userTestData";
const USER_STATS: &str = "userStats";

/// Typed access to the lesson catalog and its exercises.
#[derive(Clone)]
pub struct LessonStore {
    store: Arc<dyn DocumentStore>,
}

impl LessonStore {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All lessons, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails or a document is corrupt.
    pub async fn lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let documents = self.store.list(LESSONS).await?;
        documents
            .iter()
            .map(|document| mapping::map_lesson(&document.key, &document.fields))
            .collect()
    }

    /// Fetch one lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    pub async fn lesson(&self, id: &LessonId) -> Result<Lesson, StorageError> {
        let fields = self
            .store
            .get(LESSONS, id.as_str())
            .await?
            .ok_or(StorageError::NotFound)?;
        mapping::map_lesson(id.as_str(), &fields)
    }

    /// The exercise attached to a lesson, `None` when the lesson has none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fetch fails or the document is corrupt.
    pub async fn exercise(&self, id: &ExerciseId) -> Result<Option<Exercise>, StorageError> {
        match self.store.get(EXERCISES, id.as_str()).await? {
            Some(fields) => Ok(Some(mapping::map_exercise(id.as_str(), &fields)?)),
            None => Ok(None),
        }
    }

    /// Persist or update a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        self.store
            .set(LESSONS, lesson.id().as_str(), mapping::lesson_fields(lesson))
            .await
    }

    /// Persist or update an exercise.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        self.store
            .set(
                EXERCISES,
                exercise.id().as_str(),
                mapping::exercise_fields(exercise),
            )
            .await
    }
}

/// Typed access to the per-user stats collections.
#[derive(Clone)]
pub struct StatsStore {
    store: Arc<dyn DocumentStore>,
}

impl StatsStore {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Per-lesson stats under a composite key, `None` on first access.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fetch fails.
    pub async fn lesson_stats(&self, key: &StatsKey) -> Result<Option<LessonStats>, StorageError> {
        Ok(self
            .store
            .get(USER_LESSON_STATS, key.as_str())
            .await?
            .map(|fields| mapping::map_lesson_stats(&fields)))
    }

    /// Create the stats document or replace its fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_lesson_stats(
        &self,
        key: &StatsKey,
        stats: &LessonStats,
    ) -> Result<(), StorageError> {
        self.store
            .set(
                USER_LESSON_STATS,
                key.as_str(),
                mapping::lesson_stats_fields(stats)?,
            )
            .await
    }

    /// Write back stats that are known to exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document was never created,
    /// or other storage errors.
    pub async fn update_lesson_stats(
        &self,
        key: &StatsKey,
        stats: &LessonStats,
    ) -> Result<(), StorageError> {
        self.store
            .update(
                USER_LESSON_STATS,
                key.as_str(),
                mapping::lesson_stats_fields(stats)?,
            )
            .await
    }

    /// Every per-lesson stats document belonging to one user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails.
    pub async fn lesson_stats_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<LessonStats>, StorageError> {
        let documents = self.store.list(USER_LESSON_STATS).await?;
        Ok(documents
            .iter()
            .filter(|document| StatsKey::key_belongs_to(&document.key, user))
            .map(|document| mapping::map_lesson_stats(&document.fields))
            .collect())
    }

    /// Per-exercise stats under a composite key, `None` before any attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fetch fails.
    pub async fn exercise_stats(
        &self,
        key: &StatsKey,
    ) -> Result<Option<ExerciseStats>, StorageError> {
        Ok(self
            .store
            .get(USER_TEST_DATA, key.as_str())
            .await?
            .map(|fields| mapping::map_exercise_stats(&fields)))
    }

    /// Create or replace the per-exercise stats document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_exercise_stats(
        &self,
        key: &StatsKey,
        stats: &ExerciseStats,
    ) -> Result<(), StorageError> {
        self.store
            .set(
                USER_TEST_DATA,
                key.as_str(),
                mapping::exercise_stats_fields(stats),
            )
            .await
    }

    /// Every per-exercise stats document belonging to one user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails.
    pub async fn exercise_stats_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<ExerciseStats>, StorageError> {
        let documents = self.store.list(USER_TEST_DATA).await?;
        Ok(documents
            .iter()
            .filter(|document| StatsKey::key_belongs_to(&document.key, user))
            .map(|document| mapping::map_exercise_stats(&document.fields))
            .collect())
    }

    /// The user's profile counters, `None` before first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fetch fails.
    pub async fn user_stats(&self, user: &UserId) -> Result<Option<UserStats>, StorageError> {
        Ok(self
            .store
            .get(USER_STATS, user.as_str())
            .await?
            .map(|fields| mapping::map_user_stats(&fields)))
    }

    /// Create the profile document or replace its fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_user_stats(
        &self,
        user: &UserId,
        stats: &UserStats,
    ) -> Result<(), StorageError> {
        self.store
            .set(USER_STATS, user.as_str(), mapping::user_stats_fields(stats)?)
            .await
    }

    /// Write back a profile that is known to exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile was never created,
    /// or other storage errors.
    pub async fn update_user_stats(
        &self,
        user: &UserId,
        stats: &UserStats,
    ) -> Result<(), StorageError> {
        self.store
            .update(USER_STATS, user.as_str(), mapping::user_stats_fields(stats)?)
            .await
    }
}

/// Aggregates the typed stores behind one document backend for easy
/// backend swapping.
#[derive(Clone)]
pub struct Stores {
    pub lessons: LessonStore,
    pub stats: StatsStore,
}

impl Stores {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            lessons: LessonStore::new(Arc::clone(&store)),
            stats: StatsStore::new(store),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nihongo_core::time::fixed_now;

    #[tokio::test]
    async fn lesson_stats_scan_only_sees_the_given_user() {
        let stores = Stores::in_memory();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let lesson = LessonId::new("l1");

        let mut stats = LessonStats::new_zeroed(fixed_now());
        stats.add_time(10, fixed_now());
        stores
            .stats
            .save_lesson_stats(&StatsKey::for_lesson(&alice, &lesson), &stats)
            .await
            .unwrap();
        stores
            .stats
            .save_lesson_stats(
                &StatsKey::for_lesson(&bob, &lesson),
                &LessonStats::new_zeroed(fixed_now()),
            )
            .await
            .unwrap();

        let scanned = stores.stats.lesson_stats_for_user(&alice).await.unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].time_spent_secs(), 10);
    }

    #[tokio::test]
    async fn scan_for_user_with_no_documents_is_empty() {
        let stores = Stores::in_memory();
        let scanned = stores
            .stats
            .lesson_stats_for_user(&UserId::new("nobody"))
            .await
            .unwrap();
        assert!(scanned.is_empty());
    }

    #[tokio::test]
    async fn missing_lesson_is_not_found() {
        let stores = Stores::in_memory();
        let result = stores.lessons.lesson(&LessonId::new("missing")).await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn exercises_are_optional_per_lesson() {
        let stores = Stores::in_memory();
        let id = ExerciseId::for_lesson(&LessonId::new("l1"));
        assert!(stores.lessons.exercise(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn updating_missing_user_stats_is_not_found() {
        let stores = Stores::in_memory();
        let result = stores
            .stats
            .update_user_stats(&UserId::new("ghost"), &UserStats::new_zeroed())
            .await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }
}
