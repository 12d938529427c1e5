mod question;
mod session;

pub use question::Question;
pub use session::{QuestionPhase, QuizSession, SessionSummary};
