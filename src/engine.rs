//! Quiz state machine.
//!
//! `Idle -> InProgress -> Completed`, where each question inside
//! `InProgress` goes `AwaitingSelection -> Answered`. Timer callbacks never
//! touch the engine directly: they post [`Signal`]s carrying the ticket that
//! was current when they were scheduled, and the owner of the engine feeds
//! them back through [`QuizEngine::handle_signal`]. Every transition that
//! invalidates a pending timer bumps the ticket, so late signals are dropped.

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::QuizConfig;
use crate::data::{self, LoadError, QuestionBank};
use crate::models::{QuestionPhase, QuizSession, SessionSummary};
use crate::presenter::{Feedback, Outcome, Presenter, QuestionView};
use crate::scores::{KeyValueStore, ScoreStore};
use crate::timer::Timer;

/// Timer-originated event addressed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Countdown step for the question on screen.
    Tick { ticket: u64, remaining: u32 },
    /// The question's time ran out.
    Expired { ticket: u64 },
    /// Feedback has been shown long enough.
    Advance { ticket: u64 },
}

impl Signal {
    pub fn ticket(&self) -> u64 {
        match *self {
            Signal::Tick { ticket, .. } | Signal::Expired { ticket } | Signal::Advance { ticket } => {
                ticket
            }
        }
    }
}

/// A call arrived in a state that does not accept it. Nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("questions are not loaded")]
    NotLoaded,

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("category '{0}' has no questions")]
    EmptyCategory(String),

    #[error("a session is already in progress")]
    SessionInProgress,

    #[error("no question is awaiting a selection")]
    NotAwaitingSelection,

    #[error("choice {index} is out of range for {len} options")]
    ChoiceOutOfRange { index: usize, len: usize },

    #[error("no choice has been selected")]
    NoSelection,

    #[error("no answered question to advance from")]
    NotAnswered,
}

#[derive(Debug, Clone)]
pub enum EngineState {
    Idle,
    InProgress(QuizSession),
    Completed(SessionSummary),
}

pub struct QuizEngine<P, S> {
    config: QuizConfig,
    bank: Result<QuestionBank, LoadError>,
    scores: ScoreStore<S>,
    presenter: P,
    state: EngineState,
    question_timer: Timer,
    feedback_timer: Timer,
    ticket: u64,
    signals: mpsc::UnboundedSender<Signal>,
    rng: StdRng,
}

impl<P: Presenter, S: KeyValueStore> QuizEngine<P, S> {
    /// Build an engine over the outcome of loading the question bank. A
    /// failed load is reported to the presenter and keeps the engine idle for
    /// good.
    ///
    /// The returned receiver yields the timer signals; drain it and pass each
    /// one to [`handle_signal`](Self::handle_signal).
    pub fn new(
        config: QuizConfig,
        bank: Result<QuestionBank, LoadError>,
        scores: ScoreStore<S>,
        mut presenter: P,
    ) -> (Self, mpsc::UnboundedReceiver<Signal>) {
        if let Err(e) = &bank {
            error!(error = %e, "question bank failed to load");
            presenter.on_load_failed(e);
        }

        let (signals, receiver) = mpsc::unbounded_channel();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let feedback_timer = Timer::with_period(config.feedback_delay);

        let engine = Self {
            config,
            bank,
            scores,
            presenter,
            state: EngineState::Idle,
            question_timer: Timer::new(),
            feedback_timer,
            ticket: 0,
            signals,
            rng,
        };
        (engine, receiver)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.state {
            EngineState::InProgress(session) => Some(session),
            _ => None,
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn bank(&self) -> Option<&QuestionBank> {
        self.bank.as_ref().ok()
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.bank.as_ref().err()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn best_score(&self, category: &str) -> usize {
        self.scores.best_score(category)
    }

    /// Begin a fresh session over a shuffled copy of `name`'s questions.
    pub fn start_category(&mut self, name: &str) -> Result<(), PreconditionError> {
        if matches!(self.state, EngineState::InProgress(_)) {
            return Err(PreconditionError::SessionInProgress);
        }
        let bank = self.bank.as_ref().map_err(|_| PreconditionError::NotLoaded)?;
        let questions = bank
            .questions(name)
            .ok_or_else(|| PreconditionError::UnknownCategory(name.to_string()))?;
        if questions.is_empty() {
            return Err(PreconditionError::EmptyCategory(name.to_string()));
        }

        let questions = data::shuffle(questions, &mut self.rng);
        info!(category = name, questions = questions.len(), "starting category");

        self.cancel_timers();
        self.state = EngineState::InProgress(QuizSession::new(name.to_string(), questions));
        self.present_current();
        Ok(())
    }

    /// Record choice `index` for the question on screen. Evaluates at once
    /// when explicit submission is off.
    pub fn select_choice(&mut self, index: usize) -> Result<(), PreconditionError> {
        let session = self.awaiting_session()?;
        let len = session.choices().len();
        if index >= len {
            return Err(PreconditionError::ChoiceOutOfRange { index, len });
        }
        session.select(index);
        debug!(index, "choice selected");

        if self.config.require_explicit_submit {
            self.presenter.on_choice_selected(index);
        } else {
            self.evaluate(Some(index));
        }
        Ok(())
    }

    /// Evaluate the selected choice.
    pub fn submit(&mut self) -> Result<(), PreconditionError> {
        let selected = self
            .awaiting_session()?
            .selected()
            .ok_or(PreconditionError::NoSelection)?;
        self.evaluate(Some(selected));
        Ok(())
    }

    /// The question's time ran out. Any unsubmitted selection is discarded and
    /// the question is scored as incorrect.
    pub fn on_timer_expire(&mut self) -> Result<(), PreconditionError> {
        self.awaiting_session()?;
        self.evaluate(None);
        Ok(())
    }

    /// Leave the answered question for the next one, or finish the session.
    pub fn advance(&mut self) -> Result<(), PreconditionError> {
        let more = match &mut self.state {
            EngineState::InProgress(session) if session.phase() == QuestionPhase::Answered => {
                session.move_next()
            }
            _ => return Err(PreconditionError::NotAnswered),
        };

        self.feedback_timer.cancel();
        if more {
            self.present_current();
        } else {
            self.complete();
        }
        Ok(())
    }

    /// Drop an in-progress session without recording its score.
    pub fn abandon(&mut self) {
        if let EngineState::InProgress(session) = &self.state {
            info!(category = session.category(), "session abandoned");
            self.cancel_timers();
            self.state = EngineState::Idle;
        }
    }

    pub fn handle_signal(&mut self, signal: Signal) {
        if signal.ticket() != self.ticket {
            trace!(?signal, current = self.ticket, "dropping stale signal");
            return;
        }

        let result = match signal {
            Signal::Tick { remaining, .. } => {
                self.presenter.on_timer_tick(remaining);
                Ok(())
            }
            Signal::Expired { .. } => self.on_timer_expire(),
            Signal::Advance { .. } => self.advance(),
        };
        if let Err(e) = result {
            debug!(?signal, error = %e, "signal ignored");
        }
    }

    fn awaiting_session(&mut self) -> Result<&mut QuizSession, PreconditionError> {
        match &mut self.state {
            EngineState::InProgress(session)
                if session.phase() == QuestionPhase::AwaitingSelection =>
            {
                Ok(session)
            }
            _ => Err(PreconditionError::NotAwaitingSelection),
        }
    }

    fn present_current(&mut self) {
        let view = {
            let EngineState::InProgress(session) = &mut self.state else {
                return;
            };
            let Some(question) = session.current_question() else {
                return;
            };
            let text = question.text.clone();
            let choices = data::shuffled_options(question, &mut self.rng);
            session.present(choices.clone());

            QuestionView {
                category: session.category().to_string(),
                number: session.index() + 1,
                total: session.total(),
                text,
                choices,
                time_limit: self.config.time_limit_secs,
            }
        };

        let ticket = self.next_ticket();
        let tick_tx = self.signals.clone();
        let expire_tx = self.signals.clone();
        self.question_timer.start(
            self.config.time_limit_secs,
            move |remaining| {
                let _ = tick_tx.send(Signal::Tick { ticket, remaining });
            },
            move || {
                let _ = expire_tx.send(Signal::Expired { ticket });
            },
        );

        debug!(number = view.number, total = view.total, "question ready");
        self.presenter.on_question_ready(&view);
    }

    fn evaluate(&mut self, selection: Option<usize>) {
        self.question_timer.cancel();

        let EngineState::InProgress(session) = &mut self.state else {
            return;
        };
        let correct = session.evaluate(selection);
        let outcome = match (selection, correct) {
            (None, _) => Outcome::TimeUp,
            (Some(_), true) => Outcome::Correct,
            (Some(_), false) => Outcome::Incorrect,
        };
        let feedback = Feedback::new(outcome, session.score());
        debug!(?outcome, score = feedback.score, "question evaluated");

        let ticket = self.next_ticket();
        let advance_tx = self.signals.clone();
        self.feedback_timer.start(
            1,
            |_| {},
            move || {
                let _ = advance_tx.send(Signal::Advance { ticket });
            },
        );

        self.presenter.on_feedback(&feedback);
    }

    fn complete(&mut self) {
        self.cancel_timers();

        let EngineState::InProgress(session) = std::mem::replace(&mut self.state, EngineState::Idle)
        else {
            return;
        };
        let category = session.category().to_string();
        let score = session.score();

        let best_score = match self.scores.record_score(&category, score) {
            Ok(best) => best,
            Err(e) => {
                warn!(category = %category, error = %e, "failed to persist score");
                self.scores.best_score(&category)
            }
        };

        let summary = SessionSummary {
            category,
            score,
            total: session.total(),
            best_score,
        };
        info!(
            category = %summary.category,
            score = summary.score,
            total = summary.total,
            best = summary.best_score,
            "session complete"
        );

        self.presenter.on_session_complete(&summary);
        self.state = EngineState::Completed(summary);
    }

    fn cancel_timers(&mut self) {
        self.question_timer.cancel();
        self.feedback_timer.cancel();
        self.next_ticket();
    }

    fn next_ticket(&mut self) -> u64 {
        self.ticket += 1;
        self.ticket
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::presenter::{EventLog, PresenterEvent};
    use crate::scores::MemoryStore;

    const DOC: &str = r#"{
        "css": [
            {"question": "c1", "options": ["a", "b", "c"], "answer": "a"},
            {"question": "c2", "options": ["a", "b", "c"], "answer": "b"}
        ],
        "empty": []
    }"#;

    type Engine = QuizEngine<EventLog, MemoryStore>;

    fn build(config: QuizConfig) -> (Engine, mpsc::UnboundedReceiver<Signal>) {
        QuizEngine::new(
            config.with_seed(1),
            QuestionBank::from_json_str(DOC),
            ScoreStore::new(MemoryStore::new()),
            EventLog::new(),
        )
    }

    fn index_of(engine: &Engine, correct: bool) -> usize {
        let session = engine.session().unwrap();
        let answer = &session.current_question().unwrap().answer;
        session
            .choices()
            .iter()
            .position(|choice| (choice == answer) == correct)
            .unwrap()
    }

    async fn pump(engine: &mut Engine, rx: &mut mpsc::UnboundedReceiver<Signal>) -> Signal {
        let signal = rx.recv().await.unwrap();
        engine.handle_signal(signal);
        signal
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_presents_first_question() {
        let (mut engine, _rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();

        let question = engine.presenter().last_question().unwrap();
        assert_eq!(question.number, 1);
        assert_eq!(question.total, 2);
        assert_eq!(question.category, "css");
        assert_eq!(question.choices.len(), 3);
        assert_eq!(question.time_limit, 15);
        assert_eq!(engine.session().unwrap().score(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejects_unknown_and_empty() {
        let (mut engine, _rx) = build(QuizConfig::default());
        assert_eq!(
            engine.start_category("python"),
            Err(PreconditionError::UnknownCategory("python".to_string()))
        );
        assert_eq!(
            engine.start_category("empty"),
            Err(PreconditionError::EmptyCategory("empty".to_string()))
        );
        assert!(matches!(engine.state(), EngineState::Idle));
        assert!(engine.presenter().events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejected_while_in_progress() {
        let (mut engine, _rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();
        assert_eq!(
            engine.start_category("css"),
            Err(PreconditionError::SessionInProgress)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_stays_idle() {
        let (mut engine, _rx) = QuizEngine::new(
            QuizConfig::default(),
            QuestionBank::from_json_str("{ nope"),
            ScoreStore::new(MemoryStore::new()),
            EventLog::new(),
        );
        assert!(matches!(
            engine.presenter().events.as_slice(),
            [PresenterEvent::LoadFailed(_)]
        ));
        assert!(engine.load_error().is_some());
        assert_eq!(engine.start_category("css"), Err(PreconditionError::NotLoaded));
        assert!(matches!(engine.state(), EngineState::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_choice_is_rejected() {
        let (mut engine, _rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();

        assert_eq!(
            engine.select_choice(3),
            Err(PreconditionError::ChoiceOutOfRange { index: 3, len: 3 })
        );
        let session = engine.session().unwrap();
        assert_eq!(session.selected(), None);
        assert_eq!(session.index(), 0);
        assert_eq!(session.phase(), QuestionPhase::AwaitingSelection);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_outside_session_is_rejected() {
        let (mut engine, _rx) = build(QuizConfig::default());
        assert_eq!(engine.select_choice(0), Err(PreconditionError::NotAwaitingSelection));
        assert_eq!(engine.submit(), Err(PreconditionError::NotAwaitingSelection));
        assert_eq!(engine.advance(), Err(PreconditionError::NotAnswered));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_submit_flow() {
        let (mut engine, _rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();

        assert_eq!(engine.submit(), Err(PreconditionError::NoSelection));

        let right = index_of(&engine, true);
        engine.select_choice(right).unwrap();
        assert_eq!(engine.session().unwrap().score(), 0);
        assert_eq!(
            engine.presenter().events.last(),
            Some(&PresenterEvent::ChoiceSelected(right))
        );

        engine.submit().unwrap();
        let feedback = engine.presenter().feedback();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].outcome, Outcome::Correct);
        assert_eq!(feedback[0].message, "Correct!");
        assert_eq!(feedback[0].score, 1);

        assert_eq!(engine.select_choice(0), Err(PreconditionError::NotAwaitingSelection));
        assert_eq!(engine.submit(), Err(PreconditionError::NotAwaitingSelection));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_mode_evaluates_on_select() {
        let (mut engine, _rx) = build(QuizConfig::default().with_explicit_submit(false));
        engine.start_category("css").unwrap();

        let wrong = index_of(&engine, false);
        engine.select_choice(wrong).unwrap();
        let feedback = engine.presenter().feedback();
        assert_eq!(feedback[0].outcome, Outcome::Incorrect);
        assert_eq!(engine.session().unwrap().score(), 0);
        assert_eq!(engine.session().unwrap().phase(), QuestionPhase::Answered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_auto_advances_after_delay() {
        let (mut engine, mut rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();
        let start = tokio::time::Instant::now();

        engine.select_choice(0).unwrap();
        engine.submit().unwrap();
        let signal = pump(&mut engine, &mut rx).await;

        assert!(matches!(signal, Signal::Advance { .. }));
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(engine.session().unwrap().index(), 1);
        assert_eq!(engine.presenter().last_question().unwrap().number, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_scores_incorrect_even_with_selection() {
        let (mut engine, mut rx) = build(QuizConfig::default().with_time_limit(2));
        engine.start_category("css").unwrap();
        let right = index_of(&engine, true);
        engine.select_choice(right).unwrap();

        loop {
            if let Signal::Expired { .. } = pump(&mut engine, &mut rx).await {
                break;
            }
        }

        assert_eq!(engine.presenter().ticks(), vec![1, 0]);
        let feedback = engine.presenter().feedback();
        assert_eq!(feedback[0].outcome, Outcome::TimeUp);
        assert_eq!(feedback[0].message, "Time's up!");
        assert_eq!(engine.session().unwrap().score(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_signals_are_dropped() {
        let (mut engine, _rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();
        let stale = engine.ticket;

        engine.select_choice(0).unwrap();
        engine.submit().unwrap();
        let events = engine.presenter().events.len();

        engine.handle_signal(Signal::Expired { ticket: stale });
        engine.handle_signal(Signal::Tick { ticket: stale, remaining: 3 });
        engine.handle_signal(Signal::Advance { ticket: stale });

        assert_eq!(engine.presenter().events.len(), events);
        assert_eq!(engine.session().unwrap().index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_returns_to_idle_without_recording() {
        let (mut engine, mut rx) = build(QuizConfig::default().with_time_limit(1));
        engine.start_category("css").unwrap();
        engine.abandon();

        assert!(matches!(engine.state(), EngineState::Idle));
        assert_eq!(engine.best_score("css"), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        while let Ok(signal) = rx.try_recv() {
            engine.handle_signal(signal);
        }
        assert!(engine.presenter().ticks().is_empty());
        assert!(engine.presenter().feedback().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_records_best_score() {
        let (mut engine, mut rx) = build(QuizConfig::default());
        engine.start_category("css").unwrap();

        for _ in 0..2 {
            let right = index_of(&engine, true);
            engine.select_choice(right).unwrap();
            engine.submit().unwrap();
            pump(&mut engine, &mut rx).await;
        }

        let summary = engine.presenter().summary().unwrap().clone();
        assert_eq!(summary.score, 2);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.best_score, 2);
        assert!(matches!(engine.state(), EngineState::Completed(_)));
        assert_eq!(engine.best_score("css"), 2);

        engine.start_category("css").unwrap();
        assert!(matches!(engine.state(), EngineState::InProgress(_)));
    }
}
