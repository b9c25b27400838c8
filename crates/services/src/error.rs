//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ProfileError, QuestionError, QuizResultError, QuizSettingsError};
use quiz_core::scoring::ScoreError;
use storage::StorageError;

/// Caller-supplied values rejected at the session boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidInput {
    #[error("option {index} is out of range for a question with {options} options")]
    OptionOutOfRange { index: usize, options: usize },

    #[error("elapsed time {elapsed_secs}s exceeds the {limit_secs}s limit")]
    ElapsedExceedsLimit { elapsed_secs: u32, limit_secs: u32 },
}

/// Errors emitted by the quiz session store and its loop service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no active quiz session")]
    NoActiveSession,
    #[error("a quiz session is already in progress")]
    SessionAlreadyActive,
    #[error("no questions available for session")]
    Empty,
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("quiz generation cancelled")]
    Cancelled,
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by question and classification providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("no questions for subject {subject}")]
    Empty { subject: String },
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted while loading a question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,
    #[error("duplicate question id {id} in subject {subject}")]
    DuplicateId { id: u64, subject: String },
    #[error("question {index} is invalid: {source}")]
    Question {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors emitted by the diagnostic flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiagnosticError {
    #[error("unknown user {0}")]
    UnknownUser(u64),
    #[error("diagnostic scoring cancelled")]
    Cancelled,
    #[error(transparent)]
    Session(#[from] QuizError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the classroom integration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassroomError {
    #[error("classroom is not connected")]
    NotConnected,
    #[error("unknown course {0}")]
    UnknownCourse(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Settings(#[from] QuizSettingsError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
