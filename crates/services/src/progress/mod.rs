//! Student dashboards and class analytics, derived from the result log.

mod view;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::model::{QuizResult, UserId};
use storage::{QuizResultRepository, UserProfileRepository};

use crate::bank::subject_key;
use crate::error::ProgressError;

pub use view::{
    ClassOverview, Dashboard, DifficultyShare, RecentResult, SubjectPerformance,
    SubjectProgress, TopPerformer,
};

/// Recent results shown on a dashboard by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Top performers listed in a class overview by default.
pub const DEFAULT_TOP_LIMIT: usize = 5;

/// Narrows which results a class overview aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    /// Case-insensitive subject match; `None` keeps every subject.
    pub subject: Option<String>,
    /// Only results completed at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl ClassFilter {
    #[must_use]
    pub fn subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            since: None,
        }
    }

    #[must_use]
    pub fn matches(&self, result: &QuizResult) -> bool {
        let subject_ok = self
            .subject
            .as_deref()
            .is_none_or(|s| subject_key(s) == subject_key(result.subject()));
        let since_ok = self.since.is_none_or(|t| result.completed_at() >= t);
        subject_ok && since_ok
    }
}

#[derive(Clone)]
pub struct ProgressService {
    results: Arc<dyn QuizResultRepository>,
    profiles: Arc<dyn UserProfileRepository>,
    recent_limit: usize,
    top_limit: usize,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        results: Arc<dyn QuizResultRepository>,
        profiles: Arc<dyn UserProfileRepository>,
    ) -> Self {
        Self {
            results,
            profiles,
            recent_limit: DEFAULT_RECENT_LIMIT,
            top_limit: DEFAULT_TOP_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, recent: usize, top: usize) -> Self {
        self.recent_limit = recent;
        self.top_limit = top;
        self
    }

    /// Summarize one user's results.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the result log cannot be read.
    pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard, ProgressError> {
        let results = self
            .results
            .list_results_for_user(user_id, usize::MAX)
            .await?;
        log::debug!("dashboard for user {user_id} over {} results", results.len());
        Ok(Dashboard::from_results(&results, self.recent_limit))
    }

    /// Aggregate every matching result across all students.
    ///
    /// Performer names come from stored profiles; students without a profile
    /// are listed without one.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if results or profiles cannot be read.
    pub async fn class_overview(&self, filter: &ClassFilter) -> Result<ClassOverview, ProgressError> {
        let results: Vec<QuizResult> = self
            .results
            .list_results()
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();

        let mut overview = ClassOverview::from_results(&results, self.top_limit);
        for performer in &mut overview.top_performers {
            performer.name = self
                .profiles
                .get_profile(performer.user_id)
                .await?
                .map(|p| p.name().to_owned());
        }
        Ok(overview)
    }
}
