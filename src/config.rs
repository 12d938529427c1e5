use std::path::PathBuf;
use std::time::Duration;

use crate::data::DEFAULT_QUESTIONS_PATH;
use crate::scores::default_data_dir;

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 15;
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1000);

/// Runtime settings for a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    /// Question document to load.
    pub questions_path: PathBuf,
    /// Directory holding the persisted best scores.
    pub data_dir: PathBuf,
    /// Seconds allowed per question.
    pub time_limit_secs: u32,
    /// How long answer feedback stays up before the next question.
    pub feedback_delay: Duration,
    /// When `false`, selecting a choice evaluates it immediately.
    pub require_explicit_submit: bool,
    /// Fixed shuffle seed; random when `None`.
    pub seed: Option<u64>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_PATH),
            data_dir: default_data_dir(),
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            require_explicit_submit: true,
            seed: None,
        }
    }
}

impl QuizConfig {
    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay = delay;
        self
    }

    pub fn with_explicit_submit(mut self, required: bool) -> Self {
        self.require_explicit_submit = required;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
