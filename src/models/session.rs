use super::Question;

/// Sub-state of the question currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    /// Waiting for the user to pick (and possibly submit) a choice.
    AwaitingSelection,
    /// Evaluated; feedback is showing until the engine advances.
    Answered,
}

/// One run through a category. Owned by the engine; mutated only through
/// its transitions.
#[derive(Debug, Clone)]
pub struct QuizSession {
    category: String,
    questions: Vec<Question>,
    index: usize,
    score: usize,
    selected: Option<usize>,
    choices: Vec<String>,
    phase: QuestionPhase,
}

impl QuizSession {
    pub(crate) fn new(category: String, questions: Vec<Question>) -> Self {
        Self {
            category,
            questions,
            index: 0,
            score: 0,
            selected: None,
            choices: Vec::new(),
            phase: QuestionPhase::AwaitingSelection,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn phase(&self) -> QuestionPhase {
        self.phase
    }

    /// Options of the current question in display order.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    /// Puts the question at the current index on screen with the given
    /// option order.
    pub(crate) fn present(&mut self, choices: Vec<String>) {
        self.choices = choices;
        self.selected = None;
        self.phase = QuestionPhase::AwaitingSelection;
    }

    pub(crate) fn select(&mut self, index: usize) {
        self.selected = Some(index);
    }

    /// Scores the current question against `selection` and returns whether it
    /// was correct. `None` means no answer and is always incorrect.
    pub(crate) fn evaluate(&mut self, selection: Option<usize>) -> bool {
        let correct = match (selection, self.current_question()) {
            (Some(i), Some(question)) => self
                .choices
                .get(i)
                .is_some_and(|choice| question.is_correct(choice)),
            _ => false,
        };
        if correct {
            self.score += 1;
        }
        self.phase = QuestionPhase::Answered;
        correct
    }

    /// Moves past the current question. Returns `true` while questions remain.
    pub(crate) fn move_next(&mut self) -> bool {
        if self.index < self.questions.len() {
            self.index += 1;
        }
        !self.is_complete()
    }
}

/// Final result of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub category: String,
    pub score: usize,
    pub total: usize,
    pub best_score: usize,
}

impl SessionSummary {
    pub fn message(&self) -> String {
        format!(
            "Your score: {}, Best high score for {}: {}",
            self.score,
            self.category.to_uppercase(),
            self.best_score
        )
    }
}
