use nihongo_core::model::{
    Exercise, ExerciseId, ExerciseStats, Lesson, LessonCategory, LessonId, LessonStats, Question,
    StatsKey, UserId, UserStats,
};
use nihongo_core::time::fixed_now;
use storage::Stores;

fn build_lesson(id: &str, title: &str, category: LessonCategory) -> Lesson {
    Lesson::new(
        LessonId::new(id),
        title,
        "",
        "https://www.youtube.com/watch?v=abc123",
        "",
        category,
    )
    .unwrap()
}

fn build_exercise(lesson: &LessonId) -> Exercise {
    let question = Question::new(
        "What does 水 mean?",
        vec!["water".to_owned(), "fire".to_owned()],
        "water",
    )
    .unwrap();
    Exercise::new(ExerciseId::for_lesson(lesson), vec![question]).unwrap()
}

#[tokio::test]
async fn catalog_roundtrip_keeps_lessons_and_exercises() {
    let stores = Stores::in_memory();
    let lesson = build_lesson("l1", "Greetings", LessonCategory::Beginner);
    stores.lessons.save_lesson(&lesson).await.unwrap();
    stores
        .lessons
        .save_exercise(&build_exercise(lesson.id()))
        .await
        .unwrap();

    let listed = stores.lessons.lessons().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title(), "Greetings");

    let fetched = stores.lessons.lesson(&LessonId::new("l1")).await.unwrap();
    assert_eq!(fetched.category(), LessonCategory::Beginner);

    let exercise = stores
        .lessons
        .exercise(&ExerciseId::for_lesson(lesson.id()))
        .await
        .unwrap()
        .expect("exercise");
    assert_eq!(exercise.questions().len(), 1);
    assert_eq!(exercise.questions()[0].answer(), "water");
}

#[tokio::test]
async fn stats_lifecycle_accumulates_across_saves() {
    let stores = Stores::in_memory();
    let user = UserId::new("u1");
    let lesson = LessonId::new("l1");
    let key = StatsKey::for_lesson(&user, &lesson);

    // first access: nothing stored yet
    assert!(stores.stats.lesson_stats(&key).await.unwrap().is_none());

    let mut stats = LessonStats::new_zeroed(fixed_now());
    stores.stats.save_lesson_stats(&key, &stats).await.unwrap();

    stats.mark_video_watched(fixed_now());
    let raise = stats.raise_progress(fixed_now()).expect("raise");
    assert!((raise.to - 50.0).abs() < f64::EPSILON);
    stores.stats.update_lesson_stats(&key, &stats).await.unwrap();

    let stored = stores
        .stats
        .lesson_stats(&key)
        .await
        .unwrap()
        .expect("stored");
    assert!(stored.video_watched());
    assert!((stored.lesson_progress() - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn exercise_attempts_roll_up_per_user() {
    let stores = Stores::in_memory();
    let user = UserId::new("u1");
    let exercise = ExerciseId::for_lesson(&LessonId::new("l1"));
    let key = StatsKey::for_exercise(&user, &exercise);

    let mut attempts = ExerciseStats::new_zeroed();
    attempts.record_attempt(80.0);
    attempts.record_attempt(60.0);
    stores
        .stats
        .save_exercise_stats(&key, &attempts)
        .await
        .unwrap();

    let all = stores.stats.exercise_stats_for_user(&user).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].number_of_tries(), 2);
    assert!((all[0].average_accuracy() - 70.0).abs() < f64::EPSILON);
    assert!((all[0].max_exercise_score() - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn user_profile_created_once_then_updated() {
    let stores = Stores::in_memory();
    let user = UserId::new("u1");
    assert!(stores.stats.user_stats(&user).await.unwrap().is_none());

    stores
        .stats
        .save_user_stats(&user, &UserStats::new_zeroed())
        .await
        .unwrap();

    let mut profile = stores
        .stats
        .user_stats(&user)
        .await
        .unwrap()
        .expect("profile");
    profile.touch_last_lesson(&LessonId::new("l1"));
    profile.add_time(120);
    stores.stats.update_user_stats(&user, &profile).await.unwrap();

    let stored = stores
        .stats
        .user_stats(&user)
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(stored.total_time_spent_secs(), 120);
    assert_eq!(stored.last_lesson_id().map(LessonId::as_str), Some("l1"));
}
