mod bank;
mod loader;

pub use bank::{QuestionBank, shuffle, shuffled_options};
pub use loader::{DEFAULT_QUESTIONS_PATH, LoadError};
