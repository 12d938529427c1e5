use serde::{Deserialize, Serialize};

/// A single multiple-choice question as it appears in the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl Question {
    pub fn new(text: impl Into<String>, options: &[&str], answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.into(),
        }
    }

    /// Whether `choice` is the text of the correct option.
    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice
    }
}
