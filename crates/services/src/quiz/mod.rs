mod progress;
mod session;
mod store;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use progress::SessionProgress;
pub use session::{GENERAL_SUBJECT, QuizSession};
pub use store::{QuizPhase, QuizStore};
pub use workflow::QuizLoopService;
