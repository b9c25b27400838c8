use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{Question, ResultId, UserId};
use crate::scoring::{Score, ScoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("subject cannot be empty")]
    EmptySubject,

    #[error("answer sequence has {answers} slots for {questions} questions")]
    AnswerCountMismatch { answers: usize, questions: usize },

    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Inputs for finalizing a quiz attempt.
#[derive(Debug, Clone)]
pub struct FinishedQuiz {
    pub user_id: UserId,
    pub subject: String,
    pub questions: Vec<Question>,
    pub answers: Vec<Option<usize>>,
    pub elapsed_secs: u32,
    pub completed_at: DateTime<Utc>,
}

/// Finalized record of a quiz attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    id: ResultId,
    user_id: UserId,
    subject: String,
    score: u8,
    correct_count: u32,
    total_questions: u32,
    time_spent_secs: u32,
    completed_at: DateTime<Utc>,
    questions: Vec<Question>,
    user_answers: Vec<Option<usize>>,
}

impl QuizResult {
    /// Score the attempt and freeze it into a result with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::EmptySubject` for a blank subject,
    /// `QuizResultError::AnswerCountMismatch` if the answer slots do not line up
    /// with the questions, or `QuizResultError::Score` for an empty question set.
    pub fn finalize(finished: FinishedQuiz) -> Result<Self, QuizResultError> {
        Self::finalize_with_id(ResultId::generate(), finished)
    }

    /// Same as [`QuizResult::finalize`] with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// See [`QuizResult::finalize`].
    pub fn finalize_with_id(id: ResultId, finished: FinishedQuiz) -> Result<Self, QuizResultError> {
        let subject = finished.subject.trim().to_owned();
        if subject.is_empty() {
            return Err(QuizResultError::EmptySubject);
        }
        if finished.answers.len() != finished.questions.len() {
            return Err(QuizResultError::AnswerCountMismatch {
                answers: finished.answers.len(),
                questions: finished.questions.len(),
            });
        }

        let score = Score::tally(&finished.questions, &finished.answers)?;

        Ok(Self {
            id,
            user_id: finished.user_id,
            subject,
            score: score.percentage(),
            correct_count: score.correct(),
            total_questions: score.total(),
            time_spent_secs: finished.elapsed_secs,
            completed_at: finished.completed_at,
            questions: finished.questions,
            user_answers: finished.answers,
        })
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Percentage score, 0..=100.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn user_answers(&self) -> &[Option<usize>] {
        &self.user_answers
    }
}
