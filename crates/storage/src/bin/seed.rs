use std::fmt;

use quiz_core::model::{
    Question, QuestionId, Subject, Test, TestDraft, TestId, User, UserId, UserRole,
};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    reset: bool,
    skip_samples: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3".into());
        let mut reset = false;
        let mut skip_samples = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--reset" => reset = true,
                "--no-samples" => skip_samples = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            reset,
            skip_samples,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:quiz.sqlite3)");
    eprintln!("  --reset             Delete all results and zero every user's points");
    eprintln!("  --no-samples        Skip upserting the sample tests and admin profile");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_LOG");
}

fn question(
    id: u64,
    text: &str,
    options: [&str; 4],
    correct: usize,
) -> Result<Question, quiz_core::Error> {
    Ok(Question::new(
        QuestionId::new(id),
        text,
        options.iter().map(|o| (*o).to_string()).collect(),
        correct,
    )?)
}

fn sample_tests() -> Result<Vec<Test>, quiz_core::Error> {
    let math = TestDraft {
        title: "Sonlar dunyosi".into(),
        subject: Subject::Math,
        grade: 1,
        duration_minutes: 10,
        questions: vec![
            question(1, "5 + 3 nechaga teng?", ["7", "8", "9", "6"], 1)?,
            question(
                2,
                "Meva savatida 10 ta olma bor edi, 2 tasini edingiz. Nechta qoldi?",
                ["8", "7", "9", "12"],
                0,
            )?,
        ],
    };
    let native = TestDraft {
        title: "Alifbo quvonchi".into(),
        subject: Subject::NativeLanguage,
        grade: 1,
        duration_minutes: 10,
        questions: vec![
            question(
                1,
                "O'zbek alifbosida nechta harf bor?",
                ["29 ta", "26 ta", "30 ta", "32 ta"],
                0,
            )?,
            question(
                2,
                "Qaysi so'zda \"o\" tovushi bor?",
                ["Olma", "Anor", "Besh", "Uzum"],
                0,
            )?,
        ],
    };
    let english = TestDraft {
        title: "Present Simple Quiz".into(),
        subject: Subject::English,
        grade: 6,
        duration_minutes: 10,
        questions: vec![
            question(
                1,
                "He ___ to school every day.",
                ["go", "goes", "going", "went"],
                1,
            )?,
            question(
                2,
                "They ___ football on Sundays.",
                ["play", "plays", "playing", "player"],
                0,
            )?,
        ],
    };

    Ok(vec![
        Test::new(TestId::new(1), math)?,
        Test::new(TestId::new(2), native)?,
        Test::new(TestId::new(3), english)?,
    ])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    if args.reset {
        let removed = storage.results.clear_results().await?;
        let users = storage.users.reset_points().await?;
        tracing::warn!(removed, users, "reset results and points");
    }

    if !args.skip_samples {
        let tests = sample_tests()?;
        for test in &tests {
            storage.tests.upsert_test(test).await?;
        }

        let admin_id = UserId::new(1);
        if storage.users.get_user(admin_id).await?.is_none() {
            let admin = User::from_persisted(
                admin_id,
                UserRole::Admin,
                "Tizim Admini",
                None,
                Some("👨‍🏫".into()),
                100,
            )?;
            storage.users.upsert_user(&admin).await?;
        }

        tracing::info!(tests = tests.len(), db = %args.db_url, "seeded sample data");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        tracing::error!("{err}");
        std::process::exit(2);
    }
}
