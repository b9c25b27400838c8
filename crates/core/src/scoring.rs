//! Positional scoring of recorded answers against a question set.

use thiserror::Error;

use crate::model::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("cannot score an empty question set")]
    NoQuestions,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("too many questions to score: {len}")]
    TooManyQuestions { len: usize },
}

/// Correct count out of a total, with the derived rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    correct: u32,
    total: u32,
}

impl Score {
    /// Build a score from raw counts.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` if `total` is zero and
    /// `ScoreError::CorrectExceedsTotal` if `correct > total`.
    pub fn from_counts(correct: u32, total: u32) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::NoQuestions);
        }
        if correct > total {
            return Err(ScoreError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self { correct, total })
    }

    /// Compare `answers` positionally against each question's correct index.
    ///
    /// Slot `i` of `answers` belongs to question `i`. A missing slot (`None`, or
    /// `answers` shorter than `questions`) counts as incorrect; slots past the
    /// last question are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` for an empty question set.
    pub fn tally(questions: &[Question], answers: &[Option<usize>]) -> Result<Self, ScoreError> {
        let total = u32::try_from(questions.len())
            .map_err(|_| ScoreError::TooManyQuestions { len: questions.len() })?;

        let correct = questions
            .iter()
            .enumerate()
            .filter(|(i, q)| q.is_correct(answers.get(*i).copied().flatten()))
            .count();
        // correct <= questions.len(), which already fit in u32
        let correct = u32::try_from(correct).unwrap_or(total);

        Self::from_counts(correct, total)
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// `round(correct / total * 100)`, halves rounded up.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        round_percentage(self.correct, self.total)
    }
}

/// Integer percentage of `part` in `whole`, rounding halves up. Zero when `whole` is zero.
#[must_use]
pub fn round_percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    let pct = (part * 200 + whole) / (whole * 2);
    u8::try_from(pct).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionDraft, QuestionId};

    fn question(id: u64, correct: usize) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            question: format!("Q{id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct,
            explanation: String::new(),
            difficulty: Difficulty::Easy,
            topic: "t".into(),
            subject: "s".into(),
        }
        .validate()
        .unwrap()
    }

    fn three() -> Vec<Question> {
        vec![question(1, 0), question(2, 2), question(3, 1)]
    }

    #[test]
    fn all_correct_is_exactly_100() {
        let score = Score::tally(&three(), &[Some(0), Some(2), Some(1)]).unwrap();
        assert_eq!(score.correct(), 3);
        assert_eq!(score.percentage(), 100);
    }

    #[test]
    fn none_correct_is_exactly_0() {
        let score = Score::tally(&three(), &[Some(1), Some(0), Some(0)]).unwrap();
        assert_eq!(score.correct(), 0);
        assert_eq!(score.percentage(), 0);
    }

    #[test]
    fn one_of_three_rounds_to_33() {
        let score = Score::tally(&three(), &[Some(1), Some(2), Some(0)]).unwrap();
        assert_eq!(score.correct(), 1);
        assert_eq!(score.percentage(), 33);
    }

    #[test]
    fn missing_slots_count_as_wrong() {
        let score = Score::tally(&three(), &[Some(0)]).unwrap();
        assert_eq!(score.correct(), 1);
        let score = Score::tally(&three(), &[None, Some(2), None]).unwrap();
        assert_eq!(score.correct(), 1);
    }

    #[test]
    fn empty_question_set_is_rejected() {
        assert_eq!(Score::tally(&[], &[]).unwrap_err(), ScoreError::NoQuestions);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_percentage(2, 3), 67);
        assert_eq!(round_percentage(1, 8), 13);
        assert_eq!(round_percentage(1, 2), 50);
        assert_eq!(round_percentage(4, 5), 80);
        assert_eq!(round_percentage(0, 0), 0);
    }

    #[test]
    fn from_counts_rejects_overflowing_correct() {
        assert_eq!(
            Score::from_counts(4, 3).unwrap_err(),
            ScoreError::CorrectExceedsTotal { correct: 4, total: 3 }
        );
    }
}
