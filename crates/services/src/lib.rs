#![forbid(unsafe_code)]

pub mod app_services;
pub mod bank;
pub mod classroom;
pub mod diagnostic;
pub mod error;
pub mod notifier;
pub mod progress;
pub mod provider;
pub mod quiz;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use bank::QuestionBank;
pub use classroom::{ClassroomProvider, ClassroomService, Course, SimulatedClassroom};
pub use diagnostic::{DiagnosticOutcome, DiagnosticService, DiagnosticSession};
pub use error::{
    AppServicesError, BankError, ClassroomError, DiagnosticError, InvalidInput, ProgressError,
    ProviderError, QuizError,
};
pub use notifier::{CompletionNotifier, LogNotifier};
pub use progress::{ClassFilter, ClassOverview, Dashboard, ProgressService};
pub use provider::{
    ClassificationProvider, QuestionProvider, StaticQuestionProvider, ThresholdClassifier,
};
pub use quiz::{QuizLoopService, QuizPhase, QuizSession, QuizStore, SessionProgress};
