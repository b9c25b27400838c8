use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::scoring::Score;

/// Lowest percentage classified as `Advanced`.
pub const ADVANCED_THRESHOLD: u8 = 80;
/// Lowest percentage classified as `Intermediate`.
pub const INTERMEDIATE_THRESHOLD: u8 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown learning level: {0}")]
pub struct ParseLevelError(String);

/// Ordinal learning level derived from a diagnostic percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl LearningLevel {
    /// Classify a percentage: `>= 80` advanced, `>= 60` intermediate, else beginner.
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= ADVANCED_THRESHOLD {
            Self::Advanced
        } else if percentage >= INTERMEDIATE_THRESHOLD {
            Self::Intermediate
        } else {
            Self::Beginner
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for LearningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(ParseLevelError(other.to_owned())),
        }
    }
}

/// Outcome of a diagnostic: the score plus its learning level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    correct_count: u32,
    total: u32,
    percentage: u8,
    level: LearningLevel,
}

impl Classification {
    #[must_use]
    pub fn from_score(score: Score) -> Self {
        let percentage = score.percentage();
        Self {
            correct_count: score.correct(),
            total: score.total(),
            percentage,
            level: LearningLevel::from_percentage(percentage),
        }
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn level(&self) -> LearningLevel {
        self.level
    }
}
