//! Boundary between the quiz engine and whatever draws it.

use crate::data::LoadError;
use crate::models::SessionSummary;

/// What the user sees for the question on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub category: String,
    /// 1-based position in the session.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub choices: Vec<String>,
    /// Seconds on the clock before the first tick.
    pub time_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    TimeUp,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Correct => "Correct!",
            Outcome::Incorrect => "Incorrect!",
            Outcome::TimeUp => "Time's up!",
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::Correct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub outcome: Outcome,
    pub message: String,
    /// Running score after this answer.
    pub score: usize,
}

impl Feedback {
    pub fn new(outcome: Outcome, score: usize) -> Self {
        Self {
            outcome,
            message: outcome.message().to_string(),
            score,
        }
    }
}

/// Receives everything the engine wants shown. Implementations must not call
/// back into the engine from these methods.
pub trait Presenter {
    fn on_question_ready(&mut self, question: &QuestionView);

    /// A choice was recorded but not yet submitted.
    fn on_choice_selected(&mut self, _index: usize) {}

    fn on_feedback(&mut self, feedback: &Feedback);

    fn on_timer_tick(&mut self, remaining: u32);

    fn on_session_complete(&mut self, summary: &SessionSummary);

    fn on_load_failed(&mut self, error: &LoadError);
}

/// One presenter notification, as recorded by [`EventLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    QuestionReady(QuestionView),
    ChoiceSelected(usize),
    Feedback(Feedback),
    TimerTick(u32),
    SessionComplete(SessionSummary),
    LoadFailed(String),
}

/// Headless presenter that records every notification in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<PresenterEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_question(&self) -> Option<&QuestionView> {
        self.events.iter().rev().find_map(|event| match event {
            PresenterEvent::QuestionReady(q) => Some(q),
            _ => None,
        })
    }

    pub fn feedback(&self) -> Vec<&Feedback> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Feedback(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn ticks(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::TimerTick(remaining) => Some(*remaining),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.events.iter().rev().find_map(|event| match event {
            PresenterEvent::SessionComplete(s) => Some(s),
            _ => None,
        })
    }
}

impl Presenter for EventLog {
    fn on_question_ready(&mut self, question: &QuestionView) {
        self.events.push(PresenterEvent::QuestionReady(question.clone()));
    }

    fn on_choice_selected(&mut self, index: usize) {
        self.events.push(PresenterEvent::ChoiceSelected(index));
    }

    fn on_feedback(&mut self, feedback: &Feedback) {
        self.events.push(PresenterEvent::Feedback(feedback.clone()));
    }

    fn on_timer_tick(&mut self, remaining: u32) {
        self.events.push(PresenterEvent::TimerTick(remaining));
    }

    fn on_session_complete(&mut self, summary: &SessionSummary) {
        self.events.push(PresenterEvent::SessionComplete(summary.clone()));
    }

    fn on_load_failed(&mut self, error: &LoadError) {
        self.events.push(PresenterEvent::LoadFailed(error.to_string()));
    }
}
