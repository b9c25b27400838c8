use async_trait::async_trait;
use quiz_core::model::{ProfilePatch, QuizResult, ResultId, UserId, UserProfile};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),
}

/// Append-only log of finalized quiz results.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Append a result to the log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result with the same id was already appended.
    async fn append_result(&self, result: &QuizResult) -> Result<(), StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_result(&self, id: ResultId) -> Result<Option<QuizResult>, StorageError>;

    /// Results for one user, newest first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<QuizResult>, StorageError>;

    /// Every result in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError>;
}

/// Identity provider contract: profile lookup and partial updates.
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Fetch a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError>;

    /// Insert or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;

    /// Apply a partial patch and return the updated profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user is unknown.
    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, StorageError>;
}

/// Simple in-memory repository; the only backend this workspace ships.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    results: Arc<Mutex<Vec<QuizResult>>>,
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            profiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|r| r.id() == result.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(result.clone());
        Ok(())
    }

    async fn get_result(&self, id: ResultId) -> Result<Option<QuizResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|r| r.id() == id).cloned())
    }

    async fn list_results_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<QuizResult> = guard
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        // stable sort keeps append order for equal timestamps; reverse puts newest first
        found.sort_by_key(QuizResult::completed_at);
        found.reverse();
        found.truncate(limit);
        Ok(found)
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryRepository {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
        let guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(profile.id(), profile.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let profile = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        profile.apply(patch);
        Ok(profile.clone())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn QuizResultRepository>,
    pub profiles: Arc<dyn UserProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn UserProfileRepository> = Arc::new(repo);
        Self { results, profiles }
    }
}
