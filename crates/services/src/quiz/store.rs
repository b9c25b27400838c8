use std::sync::Arc;

use quiz_core::model::{Question, QuizResult, QuizSettings, StartPolicy, UserId};
use storage::QuizResultRepository;

use super::progress::SessionProgress;
use super::session::QuizSession;
use crate::Clock;
use crate::error::{InvalidInput, QuizError};
use crate::notifier::{CompletionNotifier, LogNotifier};

/// Observable phase of the store. `Completed` is not a resting phase: finishing
/// emits a result and returns the store to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    InProgress,
}

/// Owned quiz state: at most one active session, the loading flag, and the
/// sinks a finished session is written to.
///
/// All mutations go through `&mut self`, so there is exactly one writer.
pub struct QuizStore {
    session: Option<QuizSession>,
    loading: bool,
    clock: Clock,
    settings: QuizSettings,
    results: Arc<dyn QuizResultRepository>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl QuizStore {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        results: Arc<dyn QuizResultRepository>,
    ) -> Self {
        Self {
            session: None,
            loading: false,
            clock,
            settings,
            results,
            notifier: Arc::new(LogNotifier),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn CompletionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.session.is_some() {
            QuizPhase::InProgress
        } else {
            QuizPhase::Idle
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Swap the time source, e.g. to replay a session deterministically.
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().map(QuizSession::current_question)
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(QuizSession::current_index)
    }

    #[must_use]
    pub fn answer_at(&self, position: usize) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.answer_at(position))
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(QuizSession::progress)
    }

    /// Seconds since the active session started, capped at the time limit.
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<u32> {
        self.session.as_ref().map(|s| {
            self.clock
                .secs_since(s.started_at())
                .min(self.settings.time_limit_secs())
        })
    }

    /// Seconds left before the time limit, `None` while idle.
    #[must_use]
    pub fn time_remaining_secs(&self) -> Option<u32> {
        self.elapsed_secs()
            .map(|elapsed| self.settings.time_limit_secs() - elapsed)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.time_remaining_secs() == Some(0)
    }

    /// Fails if `start` would be refused under the configured policy.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::SessionAlreadyActive` under `StartPolicy::Reject`
    /// while a session is in progress.
    pub fn ensure_can_start(&self) -> Result<(), QuizError> {
        if self.session.is_some() && self.settings.start_policy() == StartPolicy::Reject {
            return Err(QuizError::SessionAlreadyActive);
        }
        Ok(())
    }

    /// Start a session over `questions`, recording the questions' own subject.
    ///
    /// # Errors
    ///
    /// See [`QuizStore::start_with_subject`].
    pub fn start(&mut self, questions: Vec<Question>) -> Result<(), QuizError> {
        self.start_with_subject("", questions)
    }

    /// Start a session at position 0 with no answers.
    ///
    /// Under `StartPolicy::Replace` an unfinished session is discarded.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` for no questions and
    /// `QuizError::SessionAlreadyActive` under `StartPolicy::Reject`.
    pub fn start_with_subject(
        &mut self,
        subject: &str,
        questions: Vec<Question>,
    ) -> Result<(), QuizError> {
        self.ensure_can_start()?;
        let session = QuizSession::new(subject, questions, self.clock.now())?;

        if let Some(previous) = self.session.as_ref() {
            log::warn!(
                "discarding unfinished {} session at question {} of {} ({} answered)",
                previous.subject(),
                previous.current_index() + 1,
                previous.len(),
                previous.progress().answered
            );
        }
        log::info!(
            "quiz started: subject={} questions={}",
            session.subject(),
            session.len()
        );
        self.session = Some(session);
        Ok(())
    }

    /// Record an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` while idle and
    /// `QuizError::InvalidInput` for an option outside the current question.
    pub fn answer_current(&mut self, option: usize) -> Result<(), QuizError> {
        let session = self.session.as_mut().ok_or(QuizError::NoActiveSession)?;
        session.answer_current(option)?;
        log::debug!(
            "answered question {} with option {option}",
            session.current_index() + 1
        );
        Ok(())
    }

    /// Move to the next question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` while idle and
    /// `QuizError::AtLastQuestion` at the end.
    pub fn advance(&mut self) -> Result<usize, QuizError> {
        let session = self.session.as_mut().ok_or(QuizError::NoActiveSession)?;
        session.advance()
    }

    /// Score the active session, append the result to the log and go idle.
    ///
    /// If the append fails the session stays active so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` while idle,
    /// `QuizError::InvalidInput` if `elapsed_secs` exceeds the time limit,
    /// and `QuizError::Storage` if the result log rejects the append.
    pub async fn finish(
        &mut self,
        user_id: UserId,
        elapsed_secs: u32,
    ) -> Result<QuizResult, QuizError> {
        let session = self.session.as_ref().ok_or(QuizError::NoActiveSession)?;

        let limit_secs = self.settings.time_limit_secs();
        if elapsed_secs > limit_secs {
            return Err(InvalidInput::ElapsedExceedsLimit {
                elapsed_secs,
                limit_secs,
            }
            .into());
        }

        let finished = session.to_finished(user_id, elapsed_secs, self.clock.now());
        let result = QuizResult::finalize(finished)?;
        self.results.append_result(&result).await?;

        self.session = None;
        self.notifier.quiz_completed(&result);
        Ok(result)
    }

    /// Discard the active session, if any, without producing a result.
    pub fn reset(&mut self) {
        if self.session.take().is_some() {
            log::debug!("quiz session reset");
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, QuestionDraft, QuestionId, QuizSettingsDraft};
    use quiz_core::model::ResultId;
    use quiz_core::time::fixed_clock;
    use std::sync::atomic::{AtomicBool, Ordering};
    use storage::{InMemoryRepository, StorageError};

    /// Result log that refuses appends while switched offline.
    struct FlakyLog {
        inner: InMemoryRepository,
        offline: AtomicBool,
    }

    #[async_trait::async_trait]
    impl QuizResultRepository for FlakyLog {
        async fn append_result(&self, result: &QuizResult) -> Result<(), StorageError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("result log offline".into()));
            }
            self.inner.append_result(result).await
        }

        async fn get_result(&self, id: ResultId) -> Result<Option<QuizResult>, StorageError> {
            self.inner.get_result(id).await
        }

        async fn list_results_for_user(
            &self,
            user_id: UserId,
            limit: usize,
        ) -> Result<Vec<QuizResult>, StorageError> {
            self.inner.list_results_for_user(user_id, limit).await
        }

        async fn list_results(&self) -> Result<Vec<QuizResult>, StorageError> {
            self.inner.list_results().await
        }
    }

    fn build_question(id: u64, correct: usize) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            question: format!("Q{id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct,
            explanation: String::new(),
            difficulty: Difficulty::Easy,
            topic: "Topic".into(),
            subject: "Mathematics".into(),
        }
        .validate()
        .unwrap()
    }

    fn three_questions() -> Vec<Question> {
        vec![build_question(1, 0), build_question(2, 2), build_question(3, 1)]
    }

    fn build_store(policy: StartPolicy) -> (QuizStore, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let settings = QuizSettingsDraft {
            start_policy: Some(policy),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let store = QuizStore::new(fixed_clock(), settings, Arc::new(repo.clone()));
        (store, repo)
    }

    #[test]
    fn operations_require_an_active_session() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        assert_eq!(store.phase(), QuizPhase::Idle);
        assert!(matches!(store.answer_current(0), Err(QuizError::NoActiveSession)));
        assert!(matches!(store.advance(), Err(QuizError::NoActiveSession)));
    }

    #[tokio::test]
    async fn finish_while_idle_is_an_error() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        let err = store.finish(UserId::new(1), 0).await.unwrap_err();
        assert!(matches!(err, QuizError::NoActiveSession));
    }

    #[test]
    fn start_then_reset_returns_to_idle() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        store.start(three_questions()).unwrap();
        store.answer_current(1).unwrap();
        assert_eq!(store.phase(), QuizPhase::InProgress);

        store.reset();
        assert_eq!(store.phase(), QuizPhase::Idle);
        assert_eq!(store.answer_at(0), None);
        assert!(store.session().is_none());
    }

    #[test]
    fn start_with_no_questions_fails() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        assert!(matches!(store.start(Vec::new()), Err(QuizError::Empty)));
        assert_eq!(store.phase(), QuizPhase::Idle);
    }

    #[test]
    fn replace_policy_discards_unfinished_session() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        store.start(three_questions()).unwrap();
        store.answer_current(0).unwrap();
        store.advance().unwrap();

        store.start(vec![build_question(9, 1)]).unwrap();
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.answer_at(0), None);
        assert_eq!(store.progress().unwrap().total, 1);
    }

    #[test]
    fn reject_policy_keeps_unfinished_session() {
        let (mut store, _) = build_store(StartPolicy::Reject);
        store.start(three_questions()).unwrap();
        store.answer_current(0).unwrap();

        let err = store.start(vec![build_question(9, 1)]).unwrap_err();
        assert!(matches!(err, QuizError::SessionAlreadyActive));
        assert_eq!(store.answer_at(0), Some(0));
        assert_eq!(store.progress().unwrap().total, 3);
    }

    #[test]
    fn loading_flag_is_independent_of_session() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        store.set_loading(true);
        assert!(store.is_loading());
        assert_eq!(store.phase(), QuizPhase::Idle);
        store.start(three_questions()).unwrap();
        assert!(store.is_loading());
        store.set_loading(false);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn finish_appends_result_and_goes_idle() {
        let (mut store, repo) = build_store(StartPolicy::Replace);
        store.start(three_questions()).unwrap();
        for (i, answer) in [0, 2, 1].into_iter().enumerate() {
            if i > 0 {
                store.advance().unwrap();
            }
            store.answer_current(answer).unwrap();
        }

        let result = store.finish(UserId::new(7), 95).await.unwrap();
        assert_eq!(result.score(), 100);
        assert_eq!(result.correct_count(), 3);
        assert_eq!(result.time_spent_secs(), 95);
        assert_eq!(store.phase(), QuizPhase::Idle);

        let logged = repo.list_results().await.unwrap();
        assert_eq!(logged, vec![result]);
    }

    #[tokio::test]
    async fn elapsed_beyond_limit_is_rejected_and_session_kept() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        store.start(three_questions()).unwrap();

        let err = store.finish(UserId::new(7), 301).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidInput(InvalidInput::ElapsedExceedsLimit {
                elapsed_secs: 301,
                limit_secs: 300
            })
        ));
        assert_eq!(store.phase(), QuizPhase::InProgress);
    }

    #[test]
    fn timer_counts_down_from_the_limit() {
        let (mut store, _) = build_store(StartPolicy::Replace);
        assert_eq!(store.time_remaining_secs(), None);
        store.start(three_questions()).unwrap();
        assert_eq!(store.time_remaining_secs(), Some(300));

        store.clock.advance(chrono::Duration::seconds(120));
        assert_eq!(store.elapsed_secs(), Some(120));
        assert_eq!(store.time_remaining_secs(), Some(180));

        store.clock.advance(chrono::Duration::seconds(500));
        assert_eq!(store.elapsed_secs(), Some(300));
        assert!(store.is_expired());
    }

    #[tokio::test]
    async fn failed_append_keeps_session_for_retry() {
        let log = Arc::new(FlakyLog {
            inner: InMemoryRepository::new(),
            offline: AtomicBool::new(true),
        });
        let mut store = QuizStore::new(
            fixed_clock(),
            QuizSettings::default(),
            Arc::clone(&log) as Arc<dyn QuizResultRepository>,
        );
        store.start(three_questions()).unwrap();
        store.answer_current(0).unwrap();
        store.advance().unwrap();
        store.answer_current(2).unwrap();

        let err = store.finish(UserId::new(1), 30).await.unwrap_err();
        assert!(matches!(err, QuizError::Storage(StorageError::Connection(_))));
        assert_eq!(store.phase(), QuizPhase::InProgress);
        assert_eq!(store.current_index(), Some(1));
        assert_eq!(store.answer_at(0), Some(0));
        assert_eq!(store.answer_at(1), Some(2));
        assert!(log.inner.list_results().await.unwrap().is_empty());

        log.offline.store(false, Ordering::SeqCst);
        let result = store.finish(UserId::new(1), 30).await.unwrap();
        assert_eq!(result.correct_count(), 2);
        assert_eq!(store.phase(), QuizPhase::Idle);
        assert_eq!(log.inner.list_results().await.unwrap(), vec![result]);
    }
}
