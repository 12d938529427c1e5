use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use category_quiz::{Quiz, QuizConfig, config, data, scores};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file to load the questions from
    #[arg(short, long, env = "QUIZ_QUESTIONS", default_value = data::DEFAULT_QUESTIONS_PATH)]
    questions: PathBuf,

    /// Seconds allowed per question
    #[arg(short, long, env = "QUIZ_TIME_LIMIT", default_value_t = config::DEFAULT_TIME_LIMIT_SECS)]
    time_limit: u32,

    /// Milliseconds answer feedback stays on screen
    #[arg(long, env = "QUIZ_FEEDBACK_MS", default_value_t = 1000)]
    feedback_ms: u64,

    /// Evaluate a choice as soon as it is selected instead of waiting for enter
    #[arg(long, env = "QUIZ_IMMEDIATE")]
    immediate: bool,

    /// Directory for best scores and the log file
    #[arg(long, env = "QUIZ_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Fixed shuffle seed
    #[arg(long, env = "QUIZ_SEED")]
    seed: Option<u64>,

    /// Log file (defaults to category-quiz.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> QuizConfig {
        QuizConfig {
            questions_path: self.questions,
            data_dir: self.data_dir.unwrap_or_else(scores::default_data_dir),
            time_limit_secs: self.time_limit,
            feedback_delay: Duration::from_millis(self.feedback_ms),
            require_explicit_submit: !self.immediate,
            seed: self.seed,
        }
    }
}

/// Log to a file; the terminal belongs to the quiz screens.
fn init_logging(path: PathBuf, verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = File::options().create(true).append(true).open(&path) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let log_file = args.log_file.clone();
    let verbose = args.verbose;
    let config = args.into_config();

    init_logging(
        log_file.unwrap_or_else(|| config.data_dir.join("category-quiz.log")),
        verbose,
    );
    info!(questions = %config.questions_path.display(), "starting category-quiz");

    let quiz = Quiz::from_config(config);
    if let Err(e) = quiz.run().await {
        eprintln!("Error running quiz: {}", e);
        std::process::exit(1);
    }
}
