//! # category-quiz
//!
//! A timed multiple-choice quiz over categorized questions, with a best score
//! per category that survives restarts.
//!
//! The core ([`QuizEngine`]) is headless: it talks to the screen only through
//! the [`Presenter`] trait, so it can be driven from tests or any front end.
//! The crate ships a terminal front end built on ratatui.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use category_quiz::{Quiz, QuizConfig, QuizError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let quiz = Quiz::from_config(QuizConfig::default());
//!     quiz.run().await
//! }
//! ```

mod app;
pub mod config;
pub mod data;
pub mod engine;
pub mod models;
pub mod presenter;
pub mod scores;
pub mod terminal;
pub mod timer;
mod ui;

use std::io;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use futures_util::StreamExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

pub use app::{App, Screen};
pub use config::QuizConfig;
pub use data::{LoadError, QuestionBank};
pub use engine::{EngineState, PreconditionError, QuizEngine, Signal};
pub use models::{Question, QuestionPhase, QuizSession, SessionSummary};
pub use presenter::{EventLog, Feedback, Outcome, Presenter, PresenterEvent, QuestionView};
pub use scores::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceError, ScoreStore};
pub use timer::Timer;

/// Error type for quiz operations.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("failed to load questions: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

type TerminalEngine = QuizEngine<App, JsonFileStore>;

/// A quiz wired to the terminal front end and the on-disk score store.
pub struct Quiz {
    engine: TerminalEngine,
    signals: mpsc::UnboundedReceiver<Signal>,
}

impl Quiz {
    /// Load the questions named by `config`. A load failure does not fail
    /// construction; it is shown on screen and no category can be started.
    pub fn from_config(config: QuizConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let bank = QuestionBank::load(&config.questions_path, &mut rng);
        let categories = bank
            .as_ref()
            .map(|bank| bank.categories().map(str::to_string).collect())
            .unwrap_or_default();
        let scores = ScoreStore::new(JsonFileStore::in_dir(&config.data_dir));

        let (engine, signals) = QuizEngine::new(config, bank, scores, App::new(categories));
        Self { engine, signals }
    }

    /// Run the quiz in the terminal until the user quits.
    pub async fn run(mut self) -> Result<(), QuizError> {
        let mut terminal = terminal::TerminalSession::enter()?;
        run_event_loop(&mut terminal, &mut self.engine, &mut self.signals).await
    }

    /// Get a reference to the underlying engine for custom handling.
    pub fn engine(&self) -> &TerminalEngine {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine for custom handling.
    pub fn engine_mut(&mut self) -> &mut TerminalEngine {
        &mut self.engine
    }
}

async fn run_event_loop(
    terminal: &mut terminal::QuizTerminal,
    engine: &mut TerminalEngine,
    signals: &mut mpsc::UnboundedReceiver<Signal>,
) -> Result<(), QuizError> {
    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| ui::render(frame, engine.presenter()))?;

        tokio::select! {
            Some(signal) = signals.recv() => engine.handle_signal(signal),
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if handle_input(engine, key.code) {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    engine.abandon();
    Ok(())
}

/// Returns true if the app should exit.
fn handle_input(engine: &mut TerminalEngine, key: KeyCode) -> bool {
    if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return true;
    }

    let result = match engine.presenter().screen {
        Screen::Menu => handle_menu_input(engine, key),
        Screen::Question => handle_question_input(engine, key),
        Screen::Results => handle_result_input(engine, key),
        Screen::LoadFailed => return matches!(key, KeyCode::Esc | KeyCode::Enter),
    };

    if let Err(e) = result {
        debug!(error = %e, ?key, "input rejected");
        engine.presenter_mut().set_status(e.to_string());
    }
    false
}

fn handle_menu_input(engine: &mut TerminalEngine, key: KeyCode) -> Result<(), PreconditionError> {
    match key {
        KeyCode::Down | KeyCode::Char('j') => engine.presenter_mut().select_next_category(),
        KeyCode::Up | KeyCode::Char('k') => engine.presenter_mut().select_previous_category(),
        KeyCode::Enter => {
            if let Some(category) = engine.presenter().highlighted_category().map(str::to_string) {
                engine.start_category(&category)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_question_input(
    engine: &mut TerminalEngine,
    key: KeyCode,
) -> Result<(), PreconditionError> {
    if key == KeyCode::Esc {
        engine.abandon();
        engine.presenter_mut().show_menu();
        return Ok(());
    }
    if !engine.presenter().is_answering() {
        return Ok(());
    }

    let cursor = engine.presenter().choice_cursor();
    match key {
        KeyCode::Down | KeyCode::Char('j') => engine.presenter_mut().select_next_choice(),
        KeyCode::Up | KeyCode::Char('k') => engine.presenter_mut().select_previous_choice(),
        KeyCode::Char(' ') => engine.select_choice(cursor)?,
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            engine.select_choice(index)?;
        }
        KeyCode::Enter => {
            if !engine.config().require_explicit_submit {
                engine.select_choice(cursor)?;
            } else {
                if engine.presenter().selected().is_none() {
                    engine.select_choice(cursor)?;
                }
                engine.submit()?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_result_input(engine: &mut TerminalEngine, key: KeyCode) -> Result<(), PreconditionError> {
    match key {
        KeyCode::Char('r') | KeyCode::Char('R') => {
            if let Some(category) = engine.presenter().summary().map(|s| s.category.clone()) {
                engine.start_category(&category)?;
            }
        }
        KeyCode::Enter | KeyCode::Esc => engine.presenter_mut().show_menu(),
        _ => {}
    }
    Ok(())
}
