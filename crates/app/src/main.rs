use std::fmt;

use quiz_core::model::{QuizSettingsDraft, Role, StartPolicy, UserId};
use services::{AppServices, ClassFilter, ClassOverview, Clock, Dashboard, QuizStore};

#[derive(Debug)]
enum ArgsError {
    MissingCommand,
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidAnswers { raw: String },
    InvalidEnv { var: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidAnswers { raw } => write!(f, "invalid --answers value: {raw}"),
            ArgsError::InvalidEnv { var, raw } => write!(f, "invalid {var} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- quiz       [--subject <name>] [--answers <list>] [--user-id <id>] [--no-delay]");
    eprintln!("  cargo run -p app -- diagnostic [--answers <list>] [--user-id <id>] [--no-delay]");
    eprintln!("  cargo run -p app -- classroom  [--course <id>] [--answers <list>] [--user-id <id>] [--no-delay]");
    eprintln!("  cargo run -p app -- overview   [--subject <name>] [--no-delay]");
    eprintln!();
    eprintln!("Answers are comma-separated option indices; `_` leaves a question unanswered,");
    eprintln!("e.g. --answers 0,2,_");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --subject Mathematics (overview: every subject)");
    eprintln!("  --course 1");
    eprintln!("  --user-id 1");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_TIME_LIMIT_SECS, QUIZ_GENERATION_DELAY_MS, QUIZ_DIAGNOSTIC_DELAY_MS,");
    eprintln!("  QUIZ_CLASSROOM_DELAY_MS, QUIZ_START_POLICY (replace|reject), QUIZ_USER_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Diagnostic,
    Classroom,
    Overview,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "diagnostic" => Some(Self::Diagnostic),
            "classroom" => Some(Self::Classroom),
            "overview" => Some(Self::Overview),
            _ => None,
        }
    }
}

struct Args {
    subject: Option<String>,
    course: String,
    answers: Vec<Option<usize>>,
    user_id: UserId,
    no_delay: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut subject = None;
        let mut course = "1".to_owned();
        let mut answers = Vec::new();
        let mut user_id = match std::env::var("QUIZ_USER_ID") {
            Ok(raw) => raw
                .parse::<UserId>()
                .map_err(|_| ArgsError::InvalidEnv {
                    var: "QUIZ_USER_ID",
                    raw,
                })?,
            Err(_) => UserId::new(1),
        };
        let mut no_delay = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--subject" => subject = Some(require_value(args, "--subject")?),
                "--course" => course = require_value(args, "--course")?,
                "--answers" => answers = parse_answers(&require_value(args, "--answers")?)?,
                "--user-id" => {
                    let value = require_value(args, "--user-id")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--no-delay" => no_delay = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            subject,
            course,
            answers,
            user_id,
            no_delay,
        })
    }
}

fn parse_answers(raw: &str) -> Result<Vec<Option<usize>>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part {
            "_" => Ok(None),
            index => index
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ArgsError::InvalidAnswers {
                    raw: raw.to_owned(),
                }),
        })
        .collect()
}

fn env_value<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ArgsError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ArgsError::InvalidEnv { var, raw }),
        Err(_) => Ok(None),
    }
}

/// Settings draft from the environment. Validation happens in `AppServices`.
fn settings_from_env(no_delay: bool) -> Result<QuizSettingsDraft, Box<dyn std::error::Error>> {
    let mut draft = QuizSettingsDraft {
        time_limit_secs: env_value("QUIZ_TIME_LIMIT_SECS")?,
        generation_delay_ms: env_value("QUIZ_GENERATION_DELAY_MS")?,
        diagnostic_delay_ms: env_value("QUIZ_DIAGNOSTIC_DELAY_MS")?,
        classroom_delay_ms: env_value("QUIZ_CLASSROOM_DELAY_MS")?,
        start_policy: std::env::var("QUIZ_START_POLICY")
            .ok()
            .map(|raw| raw.parse::<StartPolicy>())
            .transpose()?,
        shuffle_questions: None,
    };
    if no_delay {
        draft.generation_delay_ms = Some(0);
        draft.diagnostic_delay_ms = Some(0);
        draft.classroom_delay_ms = Some(0);
    }
    Ok(draft)
}

/// Resolves when the user interrupts the process.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Feed scripted answers to the store, one question at a time.
fn play_answers(
    store: &mut QuizStore,
    answers: &[Option<usize>],
) -> Result<(), Box<dyn std::error::Error>> {
    for (position, answer) in answers.iter().enumerate() {
        if position > 0 && store.advance().is_err() {
            log::warn!("ignoring {} extra answers", answers.len() - position);
            break;
        }
        if let Some(option) = answer {
            store.answer_current(*option)?;
        }
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    println!();
    println!("Quizzes taken:  {}", dashboard.quizzes_taken);
    if let Some(average) = dashboard.average_score {
        println!("Average score:  {average}%");
    }
    println!("Time spent:     {}s", dashboard.time_spent_secs);
    for subject in &dashboard.subjects {
        println!(
            "  {:<12} {} attempt(s), average {}%, best {}%",
            subject.subject, subject.attempts, subject.average_score, subject.best_score
        );
    }
}

fn print_overview(overview: &ClassOverview) {
    println!("Students:       {}", overview.total_students);
    println!("Results:        {}", overview.results);
    if let Some(average) = overview.average_performance {
        println!("Average:        {average}%");
    }
    for subject in &overview.subjects {
        println!(
            "  {:<12} average {}%, {} student(s), {} attempt(s)",
            subject.subject, subject.average, subject.students, subject.attempts
        );
    }
    println!("Difficulty:");
    for share in &overview.difficulty {
        println!(
            "  {:<12} {} answered ({}%)",
            share.difficulty.to_string(),
            share.answered,
            share.percentage
        );
    }
    println!("Top performers:");
    for (rank, top) in overview.top_performers.iter().enumerate() {
        let name = top.name.clone().unwrap_or_else(|| format!("user {}", top.user_id));
        let improvement = top
            .improvement
            .map(|delta| format!(", {delta:+}%"))
            .unwrap_or_default();
        println!(
            "  {}. {name} ({}) {}%{improvement}",
            rank + 1,
            top.subject,
            top.best_score
        );
    }
}

fn print_questions(store: &QuizStore) {
    if let Some(session) = store.session() {
        for (i, question) in session.questions().iter().enumerate() {
            println!("{}. {}", i + 1, question.prompt());
            for (index, option) in question.options().iter().enumerate() {
                println!("     [{index}] {option}");
            }
        }
    }
}

/// Play the scripted answers, finish, and print the graded result and dashboard.
async fn finish_and_report(
    services: &AppServices,
    store: &mut QuizStore,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    play_answers(store, &args.answers)?;
    let result = services.quiz_loop().finish(store, args.user_id).await?;

    println!();
    println!(
        "{}: {}% ({}/{} correct) in {}s",
        result.subject(),
        result.score(),
        result.correct_count(),
        result.total_questions(),
        result.time_spent_secs()
    );
    for (question, answer) in result.questions().iter().zip(result.user_answers()) {
        let verdict = if question.is_correct(*answer) { "correct" } else { "wrong" };
        println!("  {verdict:<7} {}", question.prompt());
        if !question.explanation().is_empty() {
            println!("          {}", question.explanation());
        }
    }

    let dashboard = services.progress().dashboard(args.user_id).await?;
    print_dashboard(&dashboard);
    Ok(())
}

async fn run_quiz(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let subject = args.subject.as_deref().unwrap_or("Mathematics");
    let mut store = services.quiz_store();
    services
        .quiz_loop()
        .load_quiz_until(&mut store, subject, interrupted())
        .await?;

    print_questions(&store);
    finish_and_report(services, &mut store, args).await
}

async fn run_classroom(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut classroom = services.classroom();
    println!("Connecting to classroom...");
    for course in classroom.connect().await? {
        let status = if course.active { "active" } else { "inactive" };
        println!(
            "  [{}] {} ({}, {}), {} students, {status}",
            course.id, course.name, course.section, course.instructor, course.students
        );
    }

    let mut store = services.quiz_store();
    let course = classroom.sync_course(&mut store, &args.course).await?;
    println!();
    println!("Synced {}: {} quiz generated", course.name, course.subject);

    print_questions(&store);
    finish_and_report(services, &mut store, args).await
}

/// Demo students and the scripted answers they give, so the overview has data.
const DEMO_CLASS: [(u64, &str, &str, &[usize]); 4] = [
    (11, "Alice Johnson", "Mathematics", &[1, 1, 2]),
    (12, "Emma Brown", "Science", &[1, 1, 0]),
    (13, "Michael Chen", "English", &[1, 0, 0]),
    (14, "Sarah Wilson", "Mathematics", &[0, 1, 2]),
];

async fn seed_demo_class(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    for (id, name, subject, answers) in DEMO_CLASS {
        let user_id = UserId::new(id);
        services.ensure_user(user_id, name, Role::Student).await?;

        let mut store = services.quiz_store();
        services.quiz_loop().load_quiz(&mut store, subject).await?;
        let answers: Vec<Option<usize>> = answers.iter().copied().map(Some).collect();
        play_answers(&mut store, &answers)?;
        services.quiz_loop().finish(&mut store, user_id).await?;
    }
    log::info!("seeded {} demo results", DEMO_CLASS.len());
    Ok(())
}

async fn run_overview(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    seed_demo_class(services).await?;
    let filter = match &args.subject {
        Some(subject) => ClassFilter::subject(subject.as_str()),
        None => ClassFilter::default(),
    };
    let overview = services.progress().class_overview(&filter).await?;
    print_overview(&overview);
    Ok(())
}

async fn run_diagnostic(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let diagnostics = services.diagnostics();
    let mut session = diagnostics.start()?;
    for (position, answer) in args.answers.iter().enumerate() {
        if position > 0 && session.advance().is_err() {
            log::warn!("ignoring {} extra answers", args.answers.len() - position);
            break;
        }
        if let Some(option) = answer {
            session.answer_current(*option)?;
        }
    }

    let outcome = diagnostics
        .complete_until(session, args.user_id, interrupted())
        .await?;
    println!(
        "Level: {} ({}%, {}/{} correct)",
        outcome.classification.level(),
        outcome.classification.percentage(),
        outcome.classification.correct_count(),
        outcome.classification.total()
    );
    println!("Subjects: {}", outcome.profile.subjects().join(", "));
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Err(ArgsError::MissingCommand.into());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            print_usage();
            ArgsError::UnknownArg(first)
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let draft = settings_from_env(args.no_delay)?;
    let services = AppServices::in_memory(Clock::system(), draft)?;
    log::debug!("settings: {:?}", services.settings());
    services
        .ensure_user(args.user_id, "Student", Role::Student)
        .await?;

    match cmd {
        Command::Quiz => run_quiz(&services, &args).await,
        Command::Diagnostic => run_diagnostic(&services, &args).await,
        Command::Classroom => run_classroom(&services, &args).await,
        Command::Overview => run_overview(&services, &args).await,
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
