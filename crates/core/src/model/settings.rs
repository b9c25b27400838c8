use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Default quiz time limit (five minutes).
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;
/// Upper bound accepted for a quiz time limit.
pub const MAX_TIME_LIMIT_SECS: u32 = 3_600;
/// Default simulated question generation delay.
pub const DEFAULT_GENERATION_DELAY_MS: u64 = 1_500;
/// Default simulated diagnostic scoring delay.
pub const DEFAULT_DIAGNOSTIC_DELAY_MS: u64 = 2_000;
/// Default simulated classroom connection delay.
pub const DEFAULT_CLASSROOM_DELAY_MS: u64 = 2_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("time limit must be between 1 and {MAX_TIME_LIMIT_SECS} seconds, got {0}")]
    InvalidTimeLimit(u32),

    #[error("unknown start policy: {0}")]
    UnknownStartPolicy(String),
}

/// What `start` does when a session is already in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPolicy {
    /// Discard the unfinished session and start over.
    #[default]
    Replace,
    /// Refuse to start until the active session is finished or reset.
    Reject,
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPolicy::Replace => f.write_str("replace"),
            StartPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for StartPolicy {
    type Err = QuizSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            other => Err(QuizSettingsError::UnknownStartPolicy(other.to_owned())),
        }
    }
}

/// Validated quiz configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    time_limit_secs: u32,
    generation_delay_ms: u64,
    diagnostic_delay_ms: u64,
    classroom_delay_ms: u64,
    start_policy: StartPolicy,
    shuffle_questions: bool,
}

/// Unvalidated settings; `None` falls back to the default.
#[derive(Clone, Debug, Default)]
pub struct QuizSettingsDraft {
    pub time_limit_secs: Option<u32>,
    pub generation_delay_ms: Option<u64>,
    pub diagnostic_delay_ms: Option<u64>,
    pub classroom_delay_ms: Option<u64>,
    pub start_policy: Option<StartPolicy>,
    pub shuffle_questions: Option<bool>,
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling gaps with defaults.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError::InvalidTimeLimit` if the time limit is zero
    /// or above [`MAX_TIME_LIMIT_SECS`].
    pub fn validate(self) -> Result<QuizSettings, QuizSettingsError> {
        let time_limit_secs = self.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS);
        if time_limit_secs == 0 || time_limit_secs > MAX_TIME_LIMIT_SECS {
            return Err(QuizSettingsError::InvalidTimeLimit(time_limit_secs));
        }

        Ok(QuizSettings {
            time_limit_secs,
            generation_delay_ms: self
                .generation_delay_ms
                .unwrap_or(DEFAULT_GENERATION_DELAY_MS),
            diagnostic_delay_ms: self
                .diagnostic_delay_ms
                .unwrap_or(DEFAULT_DIAGNOSTIC_DELAY_MS),
            classroom_delay_ms: self
                .classroom_delay_ms
                .unwrap_or(DEFAULT_CLASSROOM_DELAY_MS),
            start_policy: self.start_policy.unwrap_or_default(),
            shuffle_questions: self.shuffle_questions.unwrap_or(false),
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn generation_delay_ms(&self) -> u64 {
        self.generation_delay_ms
    }

    #[must_use]
    pub fn diagnostic_delay_ms(&self) -> u64 {
        self.diagnostic_delay_ms
    }

    #[must_use]
    pub fn classroom_delay_ms(&self) -> u64 {
        self.classroom_delay_ms
    }

    #[must_use]
    pub fn start_policy(&self) -> StartPolicy {
        self.start_policy
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    /// Same settings with every simulated delay removed. Handy for tests and scripted runs.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.generation_delay_ms = 0;
        self.diagnostic_delay_ms = 0;
        self.classroom_delay_ms = 0;
        self
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            generation_delay_ms: DEFAULT_GENERATION_DELAY_MS,
            diagnostic_delay_ms: DEFAULT_DIAGNOSTIC_DELAY_MS,
            classroom_delay_ms: DEFAULT_CLASSROOM_DELAY_MS,
            start_policy: StartPolicy::Replace,
            shuffle_questions: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_yields_defaults() {
        let settings = QuizSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, QuizSettings::default());
        assert_eq!(settings.time_limit_secs(), 300);
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let draft = QuizSettingsDraft {
            time_limit_secs: Some(0),
            ..QuizSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            QuizSettingsError::InvalidTimeLimit(0)
        );
    }

    #[test]
    fn start_policy_parses() {
        assert_eq!("Reject".parse::<StartPolicy>().unwrap(), StartPolicy::Reject);
        assert!(matches!(
            "ask".parse::<StartPolicy>(),
            Err(QuizSettingsError::UnknownStartPolicy(_))
        ));
    }

    #[test]
    fn without_delays_keeps_other_fields() {
        let settings = QuizSettingsDraft {
            start_policy: Some(StartPolicy::Reject),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap()
        .without_delays();
        assert_eq!(settings.generation_delay_ms(), 0);
        assert_eq!(settings.diagnostic_delay_ms(), 0);
        assert_eq!(settings.classroom_delay_ms(), 0);
        assert_eq!(settings.start_policy(), StartPolicy::Reject);
    }
}
