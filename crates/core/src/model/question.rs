use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Minimum number of answer options a question must offer.
pub const MIN_OPTIONS: usize = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least {MIN_OPTIONS} options, got {len}")]
    TooFewOptions { len: usize },

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("correct answer {correct} is outside the {len} options")]
    CorrectAnswerOutOfRange { correct: usize, len: usize },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty tag attached to every bank question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in a bank file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: String,
    pub subject: String,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// Prompt and options are trimmed; explanation, topic and subject are kept as given.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is empty, there are fewer than
    /// two options, an option is blank, or the correct answer index is out of range.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.question.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                len: self.options.len(),
            });
        }

        let mut options = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.into_iter().enumerate() {
            let option = option.trim().to_owned();
            if option.is_empty() {
                return Err(QuestionError::BlankOption { index });
            }
            options.push(option);
        }

        if self.correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                correct: self.correct_answer,
                len: options.len(),
            });
        }

        Ok(Question {
            id: self.id,
            prompt,
            options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            difficulty: self.difficulty,
            topic: self.topic,
            subject: self.subject,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "question")]
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    difficulty: Difficulty,
    topic: String,
    subject: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns true if `index` names one of this question's options.
    #[must_use]
    pub fn accepts(&self, index: usize) -> bool {
        index < self.options.len()
    }

    /// Strict positional match; an unanswered slot never matches.
    #[must_use]
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(1),
            question: "  What is the derivative of x²?  ".into(),
            options: vec!["2x".into(), "x²".into(), "2".into(), "x".into()],
            correct_answer: 0,
            explanation: "Power rule.".into(),
            difficulty: Difficulty::Medium,
            topic: "Calculus".into(),
            subject: "Mathematics".into(),
        }
    }

    #[test]
    fn validate_trims_prompt() {
        let question = draft().validate().unwrap();
        assert_eq!(question.prompt(), "What is the derivative of x²?");
        assert_eq!(question.option_count(), 4);
    }

    #[test]
    fn validate_rejects_empty_prompt() {
        let mut d = draft();
        d.question = "   ".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyPrompt);
    }

    #[test]
    fn validate_rejects_single_option() {
        let mut d = draft();
        d.options.truncate(1);
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::TooFewOptions { len: 1 }
        );
    }

    #[test]
    fn validate_rejects_blank_option() {
        let mut d = draft();
        d.options[2] = " ".into();
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::BlankOption { index: 2 }
        );
    }

    #[test]
    fn validate_rejects_out_of_range_correct_answer() {
        let mut d = draft();
        d.correct_answer = 4;
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::CorrectAnswerOutOfRange { correct: 4, len: 4 }
        );
    }

    #[test]
    fn unanswered_slot_is_never_correct() {
        let question = draft().validate().unwrap();
        assert!(question.is_correct(Some(0)));
        assert!(!question.is_correct(Some(1)));
        assert!(!question.is_correct(None));
    }

    #[test]
    fn draft_parses_from_bank_json() {
        let raw = r#"{
            "id": 2,
            "question": "Which of the following is a prime number?",
            "options": ["15", "21", "17", "25"],
            "correctAnswer": 2,
            "difficulty": "easy",
            "subject": "Mathematics"
        }"#;
        let question: Question = serde_json::from_str::<QuestionDraft>(raw)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(question.difficulty(), Difficulty::Easy);
        assert_eq!(question.correct_answer(), 2);
        assert_eq!(question.topic(), "");
    }
}
