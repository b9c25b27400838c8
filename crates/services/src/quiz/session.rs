use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{FinishedQuiz, Question, UserId};
use quiz_core::scoring::{Score, ScoreError};

use super::progress::SessionProgress;
use crate::error::{InvalidInput, QuizError};

/// Subject recorded when the questions carry none.
pub const GENERAL_SUBJECT: &str = "General";

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory attempt over an ordered question set.
///
/// Holds one answer slot per question; a slot stays `None` until that position
/// is answered. The current position is always a valid index.
#[derive(Clone, PartialEq, Eq)]
pub struct QuizSession {
    subject: String,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<Option<usize>>,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Create a session at position 0 with no answers.
    ///
    /// A blank `subject` falls back to the first question's subject, then to
    /// [`GENERAL_SUBJECT`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if `questions` is empty.
    pub fn new(
        subject: &str,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let Some(first) = questions.first() else {
            return Err(QuizError::Empty);
        };

        let subject = [subject, first.subject()]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(GENERAL_SUBJECT)
            .to_owned();
        let answers = vec![None; questions.len()];

        Ok(Self {
            subject,
            questions,
            current: 0,
            answers,
            started_at,
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    /// Recorded answer for `position`, if any.
    #[must_use]
    pub fn answer_at(&self, position: usize) -> Option<usize> {
        self.answers.get(position).copied().flatten()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.iter().filter(|a| a.is_some()).count(),
            position: self.current,
            is_last: self.is_last(),
        }
    }

    /// Record `option` for the current position, replacing any earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput::OptionOutOfRange` if `option` is not one of the
    /// current question's options. The recorded state is left untouched.
    pub fn answer_current(&mut self, option: usize) -> Result<(), QuizError> {
        let question = self.current_question();
        if !question.accepts(option) {
            return Err(InvalidInput::OptionOutOfRange {
                index: option,
                options: question.option_count(),
            }
            .into());
        }
        self.answers[self.current] = Some(option);
        Ok(())
    }

    /// Move to the next position and return it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AtLastQuestion` at the final position; the caller
    /// decides when to finish.
    pub fn advance(&mut self) -> Result<usize, QuizError> {
        if self.is_last() {
            return Err(QuizError::AtLastQuestion);
        }
        self.current += 1;
        Ok(self.current)
    }

    /// Positional score of the answers recorded so far.
    ///
    /// # Errors
    ///
    /// Never fails for a constructed session; the error is the scorer's contract.
    pub fn score(&self) -> Result<Score, ScoreError> {
        Score::tally(&self.questions, &self.answers)
    }

    /// Snapshot the attempt for finalization.
    #[must_use]
    pub fn to_finished(
        &self,
        user_id: UserId,
        elapsed_secs: u32,
        completed_at: DateTime<Utc>,
    ) -> FinishedQuiz {
        FinishedQuiz {
            user_id,
            subject: self.subject.clone(),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            elapsed_secs,
            completed_at,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("subject", &self.subject)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers", &self.answers)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
