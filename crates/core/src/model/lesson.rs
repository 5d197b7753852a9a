use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::model::ids::LessonId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("unknown lesson category: {0}")]
    UnknownCategory(String),

    #[error("video url is not a valid url")]
    InvalidVideoUrl,

    #[error("video url has no v parameter")]
    MissingVideoId,
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Shelf a lesson appears under on the lessons page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonCategory {
    Introduction,
    Beginner,
    Ai,
}

impl LessonCategory {
    /// Returns the category's stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonCategory::Introduction => "introduction",
            LessonCategory::Beginner => "beginner",
            LessonCategory::Ai => "ai",
        }
    }
}

impl fmt::Display for LessonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LessonCategory {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "introduction" => Ok(LessonCategory::Introduction),
            "beginner" => Ok(LessonCategory::Beginner),
            "ai" => Ok(LessonCategory::Ai),
            other => Err(LessonError::UnknownCategory(other.to_string())),
        }
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A video lesson: title, description, watch URL, body text, and shelf.
///
/// The stored `video_url` is the share/watch form; the embeddable player URL
/// is derived from it on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    description: String,
    video_url: String,
    content: String,
    category: LessonCategory,
}

impl Lesson {
    /// Creates a new Lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        description: impl Into<String>,
        video_url: impl Into<String>,
        content: impl Into<String>,
        category: LessonCategory,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: description.into().trim().to_owned(),
            video_url: video_url.into().trim().to_owned(),
            content: content.into(),
            category,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The watch URL as stored, with the video id in its `v` parameter.
    #[must_use]
    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn category(&self) -> LessonCategory {
        self.category
    }

    /// Derives the embeddable player URL from the stored watch URL.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidVideoUrl` if the stored URL does not
    /// parse, or `LessonError::MissingVideoId` if it carries no `v`
    /// parameter.
    pub fn embed_url(&self) -> Result<String, LessonError> {
        let parsed = Url::parse(&self.video_url).map_err(|_| LessonError::InvalidVideoUrl)?;
        let video_id = parsed
            .query_pairs()
            .find(|(name, _)| name == "v")
            .map(|(_, value)| value.into_owned())
            .ok_or(LessonError::MissingVideoId)?;
        Ok(format!("https://www.youtube.com/embed/{video_id}"))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
