use std::collections::HashMap;

use thiserror::Error;

use crate::model::ids::ExerciseId;
use crate::progress::score_percentage;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must offer at least two options")]
    TooFewOptions,

    #[error("answer must be one of the offered options")]
    AnswerNotAnOption,

    #[error("exercise must carry at least one question")]
    NoQuestions,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question: prompt, options, and the correct answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    answer: String,
}

impl Question {
    /// Creates a new Question.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is empty, fewer than two options are
    /// offered, or the answer is not among the options.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        answer: impl Into<String>,
    ) -> Result<Self, ExerciseError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ExerciseError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(ExerciseError::TooFewOptions);
        }
        let answer = answer.into();
        if !options.iter().any(|option| *option == answer) {
            return Err(ExerciseError::AnswerNotAnOption);
        }

        Ok(Self {
            prompt: prompt.trim().to_owned(),
            options,
            answer,
        })
    }

    // Accessors
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// The quiz attached to a lesson, stored under the lesson's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    id: ExerciseId,
    questions: Vec<Question>,
}

impl Exercise {
    /// Creates a new Exercise.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::NoQuestions` if no questions are given.
    pub fn new(id: ExerciseId, questions: Vec<Question>) -> Result<Self, ExerciseError> {
        if questions.is_empty() {
            return Err(ExerciseError::NoQuestions);
        }
        Ok(Self { id, questions })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &ExerciseId {
        &self.id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

//
// ─── QUIZ SHEET ────────────────────────────────────────────────────────────────
//

/// The score of one graded quiz pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizScore {
    correct: u32,
    total: u32,
}

impl QuizScore {
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self { correct, total }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Score as a percentage of answered-correct questions.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        score_percentage(self.correct, self.total)
    }
}

/// One working pass over an exercise: per-question selections, the
/// completion latch, and grading.
///
/// Selections are frozen once the sheet is submitted; `retry` clears them
/// and reopens the sheet.
#[derive(Debug, Clone)]
pub struct QuizSheet {
    exercise: Exercise,
    selections: HashMap<usize, String>,
    completed: bool,
}

impl QuizSheet {
    #[must_use]
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            selections: HashMap::new(),
            completed: false,
        }
    }

    /// Records the selected option for a question.
    ///
    /// Ignored once the sheet is submitted or when the index is out of
    /// range, mirroring inputs that are disabled after completion.
    pub fn select(&mut self, question: usize, option: impl Into<String>) {
        if self.completed || question >= self.exercise.questions().len() {
            return;
        }
        self.selections.insert(question, option.into());
    }

    /// Grades the sheet: a question counts as correct when its selection
    /// equals the stored answer. Latches the completed flag.
    pub fn submit(&mut self) -> QuizScore {
        self.completed = true;
        let correct = self
            .exercise
            .questions()
            .iter()
            .enumerate()
            .filter(|(index, question)| {
                self.selections.get(index).map(String::as_str) == Some(question.answer())
            })
            .count();

        // Exercises are validated non-empty, so totals stay in u32 range.
        #[allow(clippy::cast_possible_truncation)]
        QuizScore::new(correct as u32, self.exercise.questions().len() as u32)
    }

    /// Clears all selections and the completed latch for another attempt.
    pub fn retry(&mut self) {
        self.selections.clear();
        self.completed = false;
    }

    // Accessors
    #[must_use]
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn selection(&self, question: usize) -> Option<&str> {
        self.selections.get(&question).map(String::as_str)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
