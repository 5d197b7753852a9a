//! Lesson progress: persistence rules, per-view playback tracking and the
//! open-page timers.

mod service;
mod tracker;
mod view;

pub use crate::error::ProgressError;
pub use service::{ProgressService, QuizOutcome};
pub use tracker::{LessonViewTracker, WATCH_THRESHOLD};
pub use view::ActiveLessonView;
