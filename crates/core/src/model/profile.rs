use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LearningLevel, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("display name cannot be empty")]
    EmptyName,
}

/// Whether the user takes quizzes or reviews class analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Educator,
}

/// Profile kept by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    id: UserId,
    name: String,
    role: Role,
    diagnostic_completed: bool,
    learning_level: Option<LearningLevel>,
    subjects: Vec<String>,
}

impl UserProfile {
    /// Create a fresh profile that has not taken the diagnostic yet.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` for a blank name.
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Result<Self, ProfileError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            role,
            diagnostic_completed: false,
            learning_level: None,
            subjects: Vec::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn diagnostic_completed(&self) -> bool {
        self.diagnostic_completed
    }

    #[must_use]
    pub fn learning_level(&self) -> Option<LearningLevel> {
        self.learning_level
    }

    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Apply a partial update; absent fields are left untouched.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(done) = patch.diagnostic_completed {
            self.diagnostic_completed = done;
        }
        if let Some(level) = patch.learning_level {
            self.learning_level = Some(level);
        }
        if let Some(subjects) = patch.subjects {
            self.subjects = subjects;
        }
    }
}

/// Partial profile update. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub diagnostic_completed: Option<bool>,
    pub learning_level: Option<LearningLevel>,
    pub subjects: Option<Vec<String>>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostic_completed.is_none()
            && self.learning_level.is_none()
            && self.subjects.is_none()
    }
}
