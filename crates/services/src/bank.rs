//! Built-in question banks shipped as JSON data.

use std::collections::{BTreeMap, HashSet};

use quiz_core::model::{Question, QuestionDraft};

use crate::error::BankError;

const QUIZ_BANK_JSON: &str = include_str!("../data/quiz_bank.json");
const DIAGNOSTIC_BANK_JSON: &str = include_str!("../data/diagnostic.json");

/// Number of questions in the diagnostic assessment.
pub const DIAGNOSTIC_LEN: usize = 5;

/// Parse and validate a JSON array of question drafts.
///
/// # Errors
///
/// Returns `BankError::Json` for malformed JSON, `BankError::Question` for the
/// first draft that fails validation, and `BankError::Empty` for an empty array.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>, BankError> {
    let drafts: Vec<QuestionDraft> = serde_json::from_str(raw)?;
    if drafts.is_empty() {
        return Err(BankError::Empty);
    }
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .validate()
                .map_err(|source| BankError::Question { index, source })
        })
        .collect()
}

/// The fixed five-question diagnostic assessment.
///
/// # Errors
///
/// Returns `BankError` if the embedded data fails to parse.
pub fn diagnostic_questions() -> Result<Vec<Question>, BankError> {
    parse_questions(DIAGNOSTIC_BANK_JSON)
}

/// Questions grouped by subject. Lookups ignore case.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    subjects: BTreeMap<String, SubjectQuestions>,
}

#[derive(Debug, Clone)]
struct SubjectQuestions {
    name: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Group validated questions by subject.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` for no questions and `BankError::DuplicateId`
    /// if two questions of one subject share an id.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }

        let mut subjects: BTreeMap<String, SubjectQuestions> = BTreeMap::new();
        let mut seen = HashSet::new();
        for question in questions {
            let key = subject_key(question.subject());
            if !seen.insert((key.clone(), question.id())) {
                return Err(BankError::DuplicateId {
                    id: question.id().value(),
                    subject: question.subject().to_owned(),
                });
            }
            subjects
                .entry(key)
                .or_insert_with(|| SubjectQuestions {
                    name: question.subject().trim().to_owned(),
                    questions: Vec::new(),
                })
                .questions
                .push(question);
        }

        Ok(Self { subjects })
    }

    /// Parse a bank from a JSON array of question drafts.
    ///
    /// # Errors
    ///
    /// See [`parse_questions`] and [`QuestionBank::from_questions`].
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        Self::from_questions(parse_questions(raw)?)
    }

    /// The bank embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the embedded data fails to parse.
    pub fn builtin() -> Result<Self, BankError> {
        Self::from_json(QUIZ_BANK_JSON)
    }

    #[must_use]
    pub fn questions_for(&self, subject: &str) -> Option<&[Question]> {
        self.subjects
            .get(&subject_key(subject))
            .map(|s| s.questions.as_slice())
    }

    /// Subject names as written in the bank, alphabetically by key.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.values().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.values().map(|s| s.questions.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Case- and whitespace-insensitive grouping key for subject names.
pub(crate) fn subject_key(subject: &str) -> String {
    subject.trim().to_lowercase()
}
