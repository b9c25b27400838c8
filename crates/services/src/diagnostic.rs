//! One-shot diagnostic assessment producing a learning level.
//!
//! Answers are recorded the same way as a quiz, but completion classifies the
//! score and patches the user's profile instead of appending a result.

use std::future::{self, Future};
use std::sync::Arc;

use quiz_core::model::{Classification, ProfilePatch, Question, UserId, UserProfile};
use quiz_core::scoring::Score;
use storage::{StorageError, UserProfileRepository};

use crate::Clock;
use crate::bank;
use crate::error::{BankError, DiagnosticError, QuizError};
use crate::notifier::{CompletionNotifier, LogNotifier};
use crate::provider::ClassificationProvider;
use crate::quiz::{QuizSession, SessionProgress};

/// Subject label of a diagnostic attempt.
pub const DIAGNOSTIC_SUBJECT: &str = "Diagnostic";

/// Subjects enrolled on the profile once the diagnostic is done.
pub const PROFILE_SUBJECTS: [&str; 4] = ["Mathematics", "Science", "English", "History"];

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// An in-progress diagnostic over the fixed question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSession {
    inner: QuizSession,
}

impl DiagnosticSession {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if `questions` is empty.
    pub fn new(
        questions: Vec<Question>,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, QuizError> {
        Ok(Self {
            inner: QuizSession::new(DIAGNOSTIC_SUBJECT, questions, started_at)?,
        })
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        self.inner.current_question()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.inner.current_index()
    }

    #[must_use]
    pub fn answer_at(&self, position: usize) -> Option<usize> {
        self.inner.answer_at(position)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.inner.is_last()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.inner.progress()
    }

    /// # Errors
    ///
    /// Returns `QuizError::InvalidInput` for an option outside the current question.
    pub fn answer_current(&mut self, option: usize) -> Result<(), QuizError> {
        self.inner.answer_current(option)
    }

    /// # Errors
    ///
    /// Returns `QuizError::AtLastQuestion` at the final question.
    pub fn advance(&mut self) -> Result<usize, QuizError> {
        self.inner.advance()
    }

    /// # Errors
    ///
    /// Never fails for a constructed session.
    pub fn score(&self) -> Result<Score, quiz_core::scoring::ScoreError> {
        self.inner.score()
    }
}

/// What completing a diagnostic produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticOutcome {
    pub classification: Classification,
    pub profile: UserProfile,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Starts diagnostics and hands finished classifications to the profile store.
#[derive(Clone)]
pub struct DiagnosticService {
    clock: Clock,
    questions: Vec<Question>,
    classifier: Arc<dyn ClassificationProvider>,
    profiles: Arc<dyn UserProfileRepository>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl DiagnosticService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Vec<Question>,
        classifier: Arc<dyn ClassificationProvider>,
        profiles: Arc<dyn UserProfileRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            classifier,
            profiles,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Service over the built-in five-question bank.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the embedded bank fails to parse.
    pub fn builtin(
        clock: Clock,
        classifier: Arc<dyn ClassificationProvider>,
        profiles: Arc<dyn UserProfileRepository>,
    ) -> Result<Self, BankError> {
        Ok(Self::new(
            clock,
            bank::diagnostic_questions()?,
            classifier,
            profiles,
        ))
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn CompletionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Begin a fresh attempt at position 0.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosticError::Session` if the service has no questions.
    pub fn start(&self) -> Result<DiagnosticSession, DiagnosticError> {
        Ok(DiagnosticSession::new(
            self.questions.clone(),
            self.clock.now(),
        )?)
    }

    /// Classify the attempt and patch the user's profile with the result.
    ///
    /// The attempt is consumed, so it can be completed at most once.
    /// Unanswered questions count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosticError::UnknownUser` if the profile does not exist, or
    /// provider/storage errors.
    pub async fn complete(
        &self,
        session: DiagnosticSession,
        user_id: UserId,
    ) -> Result<DiagnosticOutcome, DiagnosticError> {
        self.complete_until(session, user_id, future::pending()).await
    }

    /// Like [`DiagnosticService::complete`], abandoned when `teardown` resolves
    /// before classification is ready. Nothing is written on teardown and the
    /// attempt is dropped.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosticError::Cancelled` on teardown, otherwise as `complete`.
    pub async fn complete_until<F>(
        &self,
        session: DiagnosticSession,
        user_id: UserId,
        teardown: F,
    ) -> Result<DiagnosticOutcome, DiagnosticError>
    where
        F: Future<Output = ()>,
    {
        let score = session.score()?;

        let classified = tokio::select! {
            classified = self.classifier.classify(score) => Some(classified),
            () = teardown => None,
        };
        let Some(classified) = classified else {
            log::debug!("diagnostic scoring for user {user_id} cancelled");
            return Err(DiagnosticError::Cancelled);
        };
        let classification = classified?;

        let patch = ProfilePatch {
            diagnostic_completed: Some(true),
            learning_level: Some(classification.level()),
            subjects: Some(PROFILE_SUBJECTS.iter().map(|s| (*s).to_owned()).collect()),
        };
        let profile = self
            .profiles
            .update_profile(user_id, patch)
            .await
            .map_err(|err| match err {
                StorageError::NotFound => DiagnosticError::UnknownUser(user_id.value()),
                other => DiagnosticError::Storage(other),
            })?;

        self.notifier.diagnostic_completed(user_id, &classification);
        Ok(DiagnosticOutcome {
            classification,
            profile,
        })
    }
}
