//! Asynchronous seams that stand in for a question-generation / scoring backend.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use quiz_core::model::{Classification, Question};
use quiz_core::scoring::Score;

use crate::bank::QuestionBank;
use crate::error::ProviderError;

/// Subject served when a requested subject has no questions of its own.
pub const FALLBACK_SUBJECT: &str = "Mathematics";

/// Produces the question set for a new quiz.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Generate questions for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if no questions can be produced.
    async fn generate(&self, subject: &str) -> Result<Vec<Question>, ProviderError>;
}

/// Produces a learning-level classification from a diagnostic score.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Classify a finished diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if classification is unavailable.
    async fn classify(&self, score: Score) -> Result<Classification, ProviderError>;
}

/// Serves questions from a static bank after a fixed simulated delay.
#[derive(Debug, Clone)]
pub struct StaticQuestionProvider {
    bank: QuestionBank,
    delay: Duration,
    shuffle: bool,
}

impl StaticQuestionProvider {
    #[must_use]
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank,
            delay: Duration::ZERO,
            shuffle: false,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

#[async_trait]
impl QuestionProvider for StaticQuestionProvider {
    async fn generate(&self, subject: &str) -> Result<Vec<Question>, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let questions = match self.bank.questions_for(subject) {
            Some(found) => found,
            None => {
                log::debug!("no bank for subject {subject:?}, serving {FALLBACK_SUBJECT}");
                self.bank
                    .questions_for(FALLBACK_SUBJECT)
                    .ok_or_else(|| ProviderError::Empty {
                        subject: subject.to_owned(),
                    })?
            }
        };

        let mut questions = questions.to_vec();
        if self.shuffle {
            questions.shuffle(&mut rand::rng());
        }
        Ok(questions)
    }
}

/// Applies the fixed learning-level thresholds after a simulated delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdClassifier {
    delay: Duration,
}

impl ThresholdClassifier {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ClassificationProvider for ThresholdClassifier {
    async fn classify(&self, score: Score) -> Result<Classification, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Classification::from_score(score))
    }
}
