use crate::data::LoadError;
use crate::models::SessionSummary;
use crate::presenter::{Feedback, Presenter, QuestionView};

/// Which screen the terminal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Question,
    Results,
    LoadFailed,
}

/// Terminal view model. Receives the engine's notifications and keeps the
/// purely visual state (cursors, status line).
pub struct App {
    pub screen: Screen,
    categories: Vec<String>,
    category_cursor: usize,
    question: Option<QuestionView>,
    choice_cursor: usize,
    selected: Option<usize>,
    remaining: u32,
    feedback: Option<Feedback>,
    score: usize,
    summary: Option<SessionSummary>,
    load_error: Option<String>,
    status: Option<String>,
}

impl App {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            screen: Screen::Menu,
            categories,
            category_cursor: 0,
            question: None,
            choice_cursor: 0,
            selected: None,
            remaining: 0,
            feedback: None,
            score: 0,
            summary: None,
            load_error: None,
            status: None,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_cursor(&self) -> usize {
        self.category_cursor
    }

    pub fn highlighted_category(&self) -> Option<&str> {
        self.categories.get(self.category_cursor).map(String::as_str)
    }

    pub fn question(&self) -> Option<&QuestionView> {
        self.question.as_ref()
    }

    pub fn choice_cursor(&self) -> usize {
        self.choice_cursor
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn select_next_category(&mut self) {
        if !self.categories.is_empty() {
            self.category_cursor = (self.category_cursor + 1) % self.categories.len();
        }
    }

    pub fn select_previous_category(&mut self) {
        let len = self.categories.len();
        if len > 0 {
            self.category_cursor = (self.category_cursor + len - 1) % len;
        }
    }

    pub fn select_next_choice(&mut self) {
        let len = self.choice_count();
        if len > 0 {
            self.choice_cursor = (self.choice_cursor + 1) % len;
        }
    }

    pub fn select_previous_choice(&mut self) {
        let len = self.choice_count();
        if len > 0 {
            self.choice_cursor = (self.choice_cursor + len - 1) % len;
        }
    }

    /// Whether the question on screen still takes input.
    pub fn is_answering(&self) -> bool {
        self.screen == Screen::Question && self.feedback.is_none()
    }

    pub fn show_menu(&mut self) {
        self.screen = Screen::Menu;
        self.question = None;
        self.feedback = None;
        self.selected = None;
        self.status = None;
    }

    fn choice_count(&self) -> usize {
        self.question.as_ref().map_or(0, |q| q.choices.len())
    }
}

impl Presenter for App {
    fn on_question_ready(&mut self, question: &QuestionView) {
        if question.number == 1 {
            self.score = 0;
        }
        self.screen = Screen::Question;
        self.remaining = question.time_limit;
        self.question = Some(question.clone());
        self.choice_cursor = 0;
        self.selected = None;
        self.feedback = None;
        self.status = None;
    }

    fn on_choice_selected(&mut self, index: usize) {
        self.selected = Some(index);
        self.choice_cursor = index;
    }

    fn on_feedback(&mut self, feedback: &Feedback) {
        self.score = feedback.score;
        self.feedback = Some(feedback.clone());
    }

    fn on_timer_tick(&mut self, remaining: u32) {
        self.remaining = remaining;
    }

    fn on_session_complete(&mut self, summary: &SessionSummary) {
        self.screen = Screen::Results;
        self.question = None;
        self.feedback = None;
        self.summary = Some(summary.clone());
    }

    fn on_load_failed(&mut self, error: &LoadError) {
        self.screen = Screen::LoadFailed;
        self.load_error = Some(error.to_string());
    }
}
