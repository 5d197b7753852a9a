mod exercise;
mod exercise_stats;
mod ids;
mod lesson;
mod lesson_stats;
mod summary;
mod user_stats;

pub use ids::{ExerciseId, LessonId, StatsKey, UserId};

pub use exercise::{Exercise, ExerciseError, Question, QuizScore, QuizSheet};
pub use exercise_stats::ExerciseStats;
pub use lesson::{Lesson, LessonCategory, LessonError};
pub use lesson_stats::{LessonStats, ProgressRaise};
pub use summary::UserSummary;
pub use user_stats::UserStats;
