use nihongo_core::model::{Exercise, ExerciseId, Lesson, LessonCategory, LessonId};
use storage::LessonStore;

use crate::error::CatalogError;

/// The lessons page: every lesson, grouped by shelf.
#[derive(Debug, Clone, Default)]
pub struct LessonShelves {
    introduction: Vec<Lesson>,
    beginner: Vec<Lesson>,
    ai: Vec<Lesson>,
}

impl LessonShelves {
    // Accessors
    #[must_use]
    pub fn introduction(&self) -> &[Lesson] {
        &self.introduction
    }

    #[must_use]
    pub fn beginner(&self) -> &[Lesson] {
        &self.beginner
    }

    #[must_use]
    pub fn ai(&self) -> &[Lesson] {
        &self.ai
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.introduction.is_empty() && self.beginner.is_empty() && self.ai.is_empty()
    }
}

/// One lesson ready to render, with its player URL already derived.
#[derive(Debug, Clone)]
pub struct LessonPage {
    lesson: Lesson,
    embed_url: Option<String>,
}

impl LessonPage {
    // Accessors
    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    /// Embeddable player URL; `None` when the stored watch URL does not
    /// yield one, in which case the page renders without a player.
    #[must_use]
    pub fn embed_url(&self) -> Option<&str> {
        self.embed_url.as_deref()
    }
}

/// Read side of the lesson catalog.
#[derive(Clone)]
pub struct CatalogService {
    lessons: LessonStore,
}

impl CatalogService {
    #[must_use]
    pub fn new(lessons: LessonStore) -> Self {
        Self { lessons }
    }

    /// Loads every lesson and groups it under its shelf.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the listing fails or a stored lesson is
    /// malformed.
    pub async fn shelves(&self) -> Result<LessonShelves, CatalogError> {
        let mut shelves = LessonShelves::default();
        for lesson in self.lessons.lessons().await? {
            match lesson.category() {
                LessonCategory::Introduction => shelves.introduction.push(lesson),
                LessonCategory::Beginner => shelves.beginner.push(lesson),
                LessonCategory::Ai => shelves.ai.push(lesson),
            }
        }
        Ok(shelves)
    }

    /// Loads one lesson and derives its player URL.
    ///
    /// A watch URL that does not embed degrades the page instead of failing
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the lesson does not exist or cannot be
    /// read.
    pub async fn open_lesson(&self, id: &LessonId) -> Result<LessonPage, CatalogError> {
        let lesson = self.lessons.lesson(id).await?;
        let embed_url = match lesson.embed_url() {
            Ok(url) => Some(url),
            Err(error) => {
                tracing::warn!(lesson = %lesson.id(), %error, "lesson video url does not embed");
                None
            }
        };
        Ok(LessonPage { lesson, embed_url })
    }

    /// Loads the exercise attached to a lesson, when one exists.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the store cannot be read.
    pub async fn exercise_for(&self, lesson: &LessonId) -> Result<Option<Exercise>, CatalogError> {
        Ok(self.lessons.exercise(&ExerciseId::for_lesson(lesson)).await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use storage::Stores;

    async fn seeded_catalog() -> CatalogService {
        let stores = Stores::in_memory();
        for (id, title, category) in [
            ("lesson001", "Hiragana", LessonCategory::Introduction),
            ("lesson002", "Counting", LessonCategory::Beginner),
            ("lesson003", "Kanji radicals", LessonCategory::Beginner),
            ("lesson004", "Talking to models", LessonCategory::Ai),
        ] {
            let lesson = Lesson::new(
                LessonId::new(id),
                title,
                "",
                "https://www.youtube.com/watch?v=abc123",
                "body",
                category,
            )
            .unwrap();
            stores.lessons.save_lesson(&lesson).await.unwrap();
        }
        CatalogService::new(stores.lessons.clone())
    }

    #[tokio::test]
    async fn shelves_group_by_category() {
        let catalog = seeded_catalog().await;
        let shelves = catalog.shelves().await.unwrap();

        assert_eq!(shelves.introduction().len(), 1);
        assert_eq!(shelves.beginner().len(), 2);
        assert_eq!(shelves.ai().len(), 1);
        assert!(!shelves.is_empty());
    }

    #[tokio::test]
    async fn open_lesson_derives_the_player_url() {
        let catalog = seeded_catalog().await;
        let page = catalog.open_lesson(&LessonId::new("lesson001")).await.unwrap();

        assert_eq!(page.lesson().title(), "Hiragana");
        assert_eq!(page.embed_url(), Some("https://www.youtube.com/embed/abc123"));
    }

    #[tokio::test]
    async fn unembeddable_video_degrades_to_no_player() {
        let stores = Stores::in_memory();
        let lesson = Lesson::new(
            LessonId::new("l1"),
            "Broken video",
            "",
            "not a url",
            "",
            LessonCategory::Beginner,
        )
        .unwrap();
        stores.lessons.save_lesson(&lesson).await.unwrap();

        let catalog = CatalogService::new(stores.lessons.clone());
        let page = catalog.open_lesson(&LessonId::new("l1")).await.unwrap();
        assert_eq!(page.embed_url(), None);
    }

    #[tokio::test]
    async fn missing_lesson_is_an_error_missing_exercise_is_not() {
        let catalog = seeded_catalog().await;

        let err = catalog.open_lesson(&LessonId::new("nope")).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Storage(storage::StorageError::NotFound)
        ));

        let exercise = catalog.exercise_for(&LessonId::new("lesson001")).await.unwrap();
        assert!(exercise.is_none());
    }
}
