use std::fmt;

use nihongo_core::model::{
    Exercise, ExerciseId, Lesson, LessonCategory, LessonId, Question, QuizSheet, UserId,
};
use services::{
    AppServices, Clock, GateDecision, HostedGenerativeClient, HostedSearchClient, Principal,
};
use storage::{FirestoreConfig, LessonStore, Stores};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    EmptyValue { flag: &'static str },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::EmptyValue { flag } => write!(f, "{flag} value must not be empty"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::EmptyValue { flag });
    }
    Ok(value)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- demo    [--user <id>] [--lesson <id>]");
    eprintln!("  cargo run -p app -- seed");
    eprintln!("  cargo run -p app -- summary [--user <id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --user demo-user");
    eprintln!("  --lesson lesson001");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  NIHONGO_USER, NIHONGO_LESSON");
    eprintln!("  NIHONGO_FIRESTORE_PROJECT, NIHONGO_SEARCH_APP_ID, NIHONGO_AI_API_KEY");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Demo,
    Seed,
    Summary,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "demo" => Some(Self::Demo),
            "seed" => Some(Self::Seed),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }
}

struct Args {
    user: UserId,
    lesson: LessonId,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut user = std::env::var("NIHONGO_USER")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "demo-user".into());
        let mut lesson = std::env::var("NIHONGO_LESSON")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "lesson001".into());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--user" => user = require_value(args, "--user")?,
                "--lesson" => lesson = require_value(args, "--lesson")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            user: UserId::new(user),
            lesson: LessonId::new(lesson),
        })
    }
}

fn resolve_stores() -> Stores {
    match FirestoreConfig::from_env() {
        Some(config) => {
            tracing::info!("using the hosted document store");
            Stores::firestore(config)
        }
        None => {
            tracing::info!("document store not configured, keeping data in memory");
            Stores::in_memory()
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: the demo walkthrough when no subcommand is given.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Demo,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Demo,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let stores = resolve_stores();
    let app = AppServices::from_parts(
        stores.clone(),
        HostedSearchClient::from_env(),
        HostedGenerativeClient::from_env(),
        Clock::default_clock(),
    );

    match cmd {
        Command::Demo => run_demo(&app, &stores, &parsed).await,
        Command::Seed => run_seed(&stores).await,
        Command::Summary => run_summary(&app, &stores, &parsed.user).await,
    }
}

/// Walks one user through the whole app surface: sign-in, the catalog, a
/// lesson view with playback and a quiz, a dictionary lookup, a chat
/// exchange, and the summary roll-up.
async fn run_demo(
    app: &AppServices,
    stores: &Stores,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if app.catalog().shelves().await?.is_empty() {
        seed_catalog(&stores.lessons).await?;
    }

    app.sign_in(Principal::new(args.user.clone()).with_display_name("Demo User"))
        .await?;
    let GateDecision::Render(principal) = app.gate().admit().await else {
        eprintln!("sign-in was not accepted");
        return Ok(());
    };
    println!(
        "signed in as {}",
        principal.display_name().unwrap_or(principal.id().as_str())
    );

    let shelves = app.catalog().shelves().await?;
    println!(
        "catalog: {} introduction, {} beginner, {} ai",
        shelves.introduction().len(),
        shelves.beginner().len(),
        shelves.ai().len()
    );

    let page = app.catalog().open_lesson(&args.lesson).await?;
    println!("opened `{}`", page.lesson().title());
    if let Some(embed) = page.embed_url() {
        println!("player: {embed}");
    }

    let view = app
        .open_lesson_view(args.user.clone(), args.lesson.clone())
        .await?;
    view.report_playback(250.0, 300.0).await?;
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    if let Some(exercise) = app.catalog().exercise_for(&args.lesson).await? {
        let mut sheet = QuizSheet::new(exercise);
        let answers: Vec<String> = sheet
            .exercise()
            .questions()
            .iter()
            .map(|question| question.answer().to_owned())
            .collect();
        for (index, answer) in answers.into_iter().enumerate() {
            sheet.select(index, answer);
        }
        let outcome = view.submit_quiz(&mut sheet).await?;
        println!(
            "quiz: {:.0}% (attempt {})",
            outcome.percent, outcome.number_of_tries
        );
    }

    // Give the progress bar a moment to sweep up to its new target.
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    println!("progress bar at {:.0}%", view.displayed_progress());
    view.close().await?;

    let lookup = app.dictionary().lookup("mizu").await;
    println!("dictionary hits for みず: {}", lookup.hits.len());
    println!("generated entry: {}", lookup.generated);

    let reply = app
        .chat()
        .respond("How do I say water?", Some(page.lesson().content()))
        .await;
    println!("assistant: {reply}");

    run_summary(app, stores, &args.user).await
}

async fn run_seed(stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
    if FirestoreConfig::from_env().is_none() {
        eprintln!("no document store configured; seeding the in-memory store is a dry run");
    }
    seed_catalog(&stores.lessons).await?;
    let count = stores.lessons.lessons().await?.len();
    println!("seeded {count} lessons");
    Ok(())
}

async fn run_summary(
    app: &AppServices,
    stores: &Stores,
    user: &UserId,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = app.progress().load_summary(user).await?;
    println!("summary for {}:", user.as_str());
    println!("  time spent: {}s", summary.total_time_spent_secs());
    println!("  average progress: {:.1}%", summary.average_progress());
    println!("  average accuracy: {:.1}%", summary.average_accuracy());

    if let Some(profile) = stores.stats.user_stats(user).await? {
        println!("  lessons completed: {}", profile.lessons_completed());
        if let Some(last) = profile.last_lesson_id() {
            println!("  last lesson: {}", last.as_str());
        }
    }
    Ok(())
}

async fn seed_catalog(lessons: &LessonStore) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("seeding the default catalog");
    for (lesson, questions) in default_catalog()? {
        let exercise = Exercise::new(ExerciseId::for_lesson(lesson.id()), questions)?;
        lessons.save_lesson(&lesson).await?;
        lessons.save_exercise(&exercise).await?;
    }
    Ok(())
}

#[allow(clippy::type_complexity)]
fn default_catalog() -> Result<Vec<(Lesson, Vec<Question>)>, Box<dyn std::error::Error>> {
    Ok(vec![
        (
            Lesson::new(
                LessonId::new("lesson001"),
                "Hiragana basics",
                "The five vowel kana and how to read them",
                "https://www.youtube.com/watch?v=wD3FJgij79c",
                "あ い う え お are the five vowel sounds every other kana builds on.",
                LessonCategory::Introduction,
            )?,
            vec![
                Question::new(
                    "Which kana reads as a?",
                    vec!["あ".into(), "い".into(), "う".into()],
                    "あ",
                )?,
                Question::new(
                    "Which kana reads as i?",
                    vec!["あ".into(), "い".into(), "う".into()],
                    "い",
                )?,
            ],
        ),
        (
            Lesson::new(
                LessonId::new("lesson002"),
                "Greetings",
                "Morning, daytime and evening greetings",
                "https://www.youtube.com/watch?v=kjMLXhTuXBY",
                "おはよう for the morning, こんにちは during the day, こんばんは at night.",
                LessonCategory::Beginner,
            )?,
            vec![
                Question::new(
                    "Which greeting fits the morning?",
                    vec!["おはよう".into(), "こんばんは".into()],
                    "おはよう",
                )?,
                Question::new(
                    "Which greeting fits the evening?",
                    vec!["おはよう".into(), "こんばんは".into()],
                    "こんばんは",
                )?,
            ],
        ),
        (
            Lesson::new(
                LessonId::new("lesson003"),
                "Studying with AI tools",
                "Using a generative assistant to drill vocabulary",
                "https://www.youtube.com/watch?v=1RyUDjDci0U",
                "Ask the assistant for readings, example sentences and mnemonics.",
                LessonCategory::Ai,
            )?,
            vec![Question::new(
                "What should you ask for alongside a new word?",
                vec!["An example sentence".into(), "Nothing".into()],
                "An example sentence",
            )?],
        ),
    ])
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
