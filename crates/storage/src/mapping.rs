use std::collections::BTreeMap;

use chrono::DateTime;
use nihongo_core::model::{
    Exercise, ExerciseId, ExerciseStats, Lesson, LessonCategory, LessonId, LessonStats, Question,
    UserStats,
};

use crate::document::{FieldValue, Fields, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn require_str<'a>(fields: &'a Fields, name: &'static str) -> Result<&'a str, StorageError> {
    fields
        .get(name)
        .and_then(FieldValue::as_str)
        .ok_or_else(|| StorageError::Serialization(format!("missing field: {name}")))
}

// Stats documents accumulate fields over time; absent or mistyped fields
// read as their zero value instead of failing the whole document.
fn field_bool(fields: &Fields, name: &str) -> bool {
    fields.get(name).and_then(FieldValue::as_bool).unwrap_or(false)
}

fn field_f64(fields: &Fields, name: &str) -> f64 {
    fields.get(name).and_then(FieldValue::as_f64).unwrap_or(0.0)
}

fn field_u64(fields: &Fields, name: &str) -> u64 {
    fields.get(name).and_then(FieldValue::as_u64).unwrap_or(0)
}

pub(crate) fn lesson_fields(lesson: &Lesson) -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".to_owned(), lesson.title().into());
    fields.insert("description".to_owned(), lesson.description().into());
    fields.insert("videoURL".to_owned(), lesson.video_url().into());
    fields.insert("content".to_owned(), lesson.content().into());
    fields.insert("category".to_owned(), lesson.category().as_str().into());
    fields
}

pub(crate) fn map_lesson(key: &str, fields: &Fields) -> Result<Lesson, StorageError> {
    let category: LessonCategory = require_str(fields, "category")?.parse().map_err(ser)?;
    Lesson::new(
        LessonId::new(key),
        require_str(fields, "title")?,
        fields.get("description").and_then(FieldValue::as_str).unwrap_or(""),
        fields.get("videoURL").and_then(FieldValue::as_str).unwrap_or(""),
        fields.get("content").and_then(FieldValue::as_str).unwrap_or(""),
        category,
    )
    .map_err(ser)
}

pub(crate) fn exercise_fields(exercise: &Exercise) -> Fields {
    let questions = exercise
        .questions()
        .iter()
        .map(|question| {
            let mut map = Fields::new();
            map.insert("question".to_owned(), question.prompt().into());
            map.insert(
                "options".to_owned(),
                FieldValue::Array(
                    question
                        .options()
                        .iter()
                        .map(|option| option.as_str().into())
                        .collect(),
                ),
            );
            map.insert("answer".to_owned(), question.answer().into());
            FieldValue::Map(map)
        })
        .collect();

    let mut fields = Fields::new();
    fields.insert("questions".to_owned(), FieldValue::Array(questions));
    fields
}

pub(crate) fn map_exercise(key: &str, fields: &Fields) -> Result<Exercise, StorageError> {
    let questions = fields
        .get("questions")
        .and_then(FieldValue::as_array)
        .ok_or_else(|| StorageError::Serialization("missing field: questions".into()))?
        .iter()
        .map(map_question)
        .collect::<Result<Vec<_>, _>>()?;
    Exercise::new(ExerciseId::new(key), questions).map_err(ser)
}

fn map_question(value: &FieldValue) -> Result<Question, StorageError> {
    let fields = value
        .as_map()
        .ok_or_else(|| StorageError::Serialization("question is not a map".into()))?;
    let options = fields
        .get("options")
        .and_then(FieldValue::as_array)
        .ok_or_else(|| StorageError::Serialization("missing field: options".into()))?
        .iter()
        .map(|option| {
            option
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| StorageError::Serialization("option is not a string".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Question::new(
        require_str(fields, "question")?,
        options,
        require_str(fields, "answer")?,
    )
    .map_err(ser)
}

pub(crate) fn lesson_stats_fields(stats: &LessonStats) -> Result<Fields, StorageError> {
    let time_spent = i64::try_from(stats.time_spent_secs())
        .map_err(|_| StorageError::Serialization("timeSpent overflow".into()))?;

    let mut fields = Fields::new();
    fields.insert("videoWatched".to_owned(), stats.video_watched().into());
    fields.insert("testCompleted".to_owned(), stats.test_completed().into());
    fields.insert("lessonProgress".to_owned(), stats.lesson_progress().into());
    fields.insert("timeSpent".to_owned(), time_spent.into());
    fields.insert("maxQuizScore".to_owned(), stats.max_quiz_score().into());
    fields.insert("lastAccessed".to_owned(), stats.last_accessed().into());
    Ok(fields)
}

pub(crate) fn map_lesson_stats(fields: &Fields) -> LessonStats {
    LessonStats::from_persisted(
        field_bool(fields, "videoWatched"),
        field_bool(fields, "testCompleted"),
        field_f64(fields, "lessonProgress"),
        field_u64(fields, "timeSpent"),
        field_f64(fields, "maxQuizScore"),
        fields
            .get("lastAccessed")
            .and_then(FieldValue::as_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH),
    )
}

pub(crate) fn exercise_stats_fields(stats: &ExerciseStats) -> Fields {
    let tries = stats
        .tries()
        .iter()
        .map(|score| FieldValue::Double(*score))
        .collect();

    let mut fields = Fields::new();
    fields.insert("tries".to_owned(), FieldValue::Array(tries));
    fields.insert("numberOfTries".to_owned(), i64::from(stats.number_of_tries()).into());
    fields.insert("maxExerciseScore".to_owned(), stats.max_exercise_score().into());
    fields.insert("averageAccuracy".to_owned(), stats.average_accuracy().into());
    fields
}

/// The stored average and count are written for other readers but rederived
/// from the tries here, so they can never drift from the list.
pub(crate) fn map_exercise_stats(fields: &Fields) -> ExerciseStats {
    let tries = fields
        .get("tries")
        .and_then(FieldValue::as_array)
        .map(|values| values.iter().filter_map(FieldValue::as_f64).collect())
        .unwrap_or_default();
    ExerciseStats::from_persisted(tries, field_f64(fields, "maxExerciseScore"))
}

pub(crate) fn user_stats_fields(stats: &UserStats) -> Result<Fields, StorageError> {
    let total_time = i64::try_from(stats.total_time_spent_secs())
        .map_err(|_| StorageError::Serialization("totalTimeSpent overflow".into()))?;

    let mut quiz_scores = Fields::new();
    for (lesson, score) in stats.quiz_scores() {
        quiz_scores.insert(lesson.as_str().to_owned(), (*score).into());
    }

    let mut fields = Fields::new();
    fields.insert("totalTimeSpent".to_owned(), total_time.into());
    fields.insert(
        "lessonsCompleted".to_owned(),
        i64::from(stats.lessons_completed()).into(),
    );
    fields.insert(
        "lastLessonId".to_owned(),
        match stats.last_lesson_id() {
            Some(lesson) => lesson.as_str().into(),
            None => FieldValue::Null,
        },
    );
    fields.insert("quizScores".to_owned(), FieldValue::Map(quiz_scores));
    Ok(fields)
}

pub(crate) fn map_user_stats(fields: &Fields) -> UserStats {
    let quiz_scores: BTreeMap<LessonId, f64> = fields
        .get("quizScores")
        .and_then(FieldValue::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(lesson, score)| {
                    score.as_f64().map(|value| (LessonId::new(lesson.as_str()), value))
                })
                .collect()
        })
        .unwrap_or_default();

    UserStats::from_persisted(
        field_u64(fields, "totalTimeSpent"),
        u32::try_from(field_u64(fields, "lessonsCompleted")).unwrap_or(u32::MAX),
        fields
            .get("lastLessonId")
            .and_then(FieldValue::as_str)
            .filter(|id| !id.is_empty())
            .map(LessonId::new),
        quiz_scores,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nihongo_core::time::fixed_now;

    #[test]
    fn lesson_round_trips_through_fields() {
        let lesson = Lesson::new(
            LessonId::new("l1"),
            "Greetings",
            "Saying hello",
            "https://www.youtube.com/watch?v=abc123",
            "こんにちは",
            LessonCategory::Beginner,
        )
        .unwrap();

        let mapped = map_lesson("l1", &lesson_fields(&lesson)).unwrap();
        assert_eq!(mapped, lesson);
    }

    #[test]
    fn lesson_without_a_category_is_corrupt() {
        let mut fields = Fields::new();
        fields.insert("title".to_owned(), "Greetings".into());
        assert!(matches!(
            map_lesson("l1", &fields),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn stats_fields_missing_from_old_documents_read_as_zero() {
        let mut fields = Fields::new();
        fields.insert("videoWatched".to_owned(), true.into());

        let stats = map_lesson_stats(&fields);
        assert!(stats.video_watched());
        assert!(!stats.test_completed());
        assert_eq!(stats.time_spent_secs(), 0);
        assert!(stats.lesson_progress().abs() < f64::EPSILON);
    }

    #[test]
    fn lesson_stats_round_trip() {
        let mut stats = LessonStats::new_zeroed(fixed_now());
        stats.mark_video_watched(fixed_now());
        stats.record_quiz(66.7, fixed_now());
        stats.raise_progress(fixed_now());
        stats.add_time(42, fixed_now());

        let mapped = map_lesson_stats(&lesson_stats_fields(&stats).unwrap());
        assert_eq!(mapped, stats);
    }

    #[test]
    fn exercise_stats_average_is_rederived_from_tries() {
        let mut fields = exercise_stats_fields(&ExerciseStats::new_zeroed());
        fields.insert(
            "tries".to_owned(),
            FieldValue::Array(vec![FieldValue::Double(80.0), FieldValue::Int(60)]),
        );
        fields.insert("averageAccuracy".to_owned(), 5.0.into());

        let stats = map_exercise_stats(&fields);
        assert!((stats.average_accuracy() - 70.0).abs() < f64::EPSILON);
        assert_eq!(stats.number_of_tries(), 2);
    }

    #[test]
    fn user_stats_round_trip_keeps_quiz_scores() {
        let mut stats = UserStats::new_zeroed();
        stats.touch_last_lesson(&LessonId::new("l2"));
        stats.record_quiz_score(&LessonId::new("l1"), 90.0);
        stats.mark_lesson_completed();
        stats.add_time(30);

        let mapped = map_user_stats(&user_stats_fields(&stats).unwrap());
        assert_eq!(mapped, stats);
    }

    #[test]
    fn absent_last_lesson_maps_to_null_and_back() {
        let fields = user_stats_fields(&UserStats::new_zeroed()).unwrap();
        assert_eq!(fields.get("lastLessonId"), Some(&FieldValue::Null));
        assert!(map_user_stats(&fields).last_lesson_id().is_none());
    }
}
