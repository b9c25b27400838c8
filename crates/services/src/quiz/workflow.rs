use std::future::{self, Future};
use std::sync::Arc;

use quiz_core::model::{QuizResult, UserId};

use super::store::QuizStore;
use crate::error::QuizError;
use crate::provider::QuestionProvider;

/// Orchestrates quiz generation and timed completion around a `QuizStore`.
#[derive(Clone)]
pub struct QuizLoopService {
    questions: Arc<dyn QuestionProvider>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionProvider>) -> Self {
        Self { questions }
    }

    /// Generate questions for `subject` and start a session with them.
    ///
    /// The store's loading flag is raised for the duration of the generation.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::SessionAlreadyActive` before generating if the start
    /// policy would refuse, or provider/start errors afterwards.
    pub async fn load_quiz(&self, store: &mut QuizStore, subject: &str) -> Result<(), QuizError> {
        self.load_quiz_until(store, subject, future::pending()).await
    }

    /// Like [`QuizLoopService::load_quiz`], abandoned when `teardown` resolves first.
    ///
    /// On teardown the pending generation is dropped, the loading flag is
    /// cleared and no session is started.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Cancelled` on teardown, otherwise as `load_quiz`.
    pub async fn load_quiz_until<F>(
        &self,
        store: &mut QuizStore,
        subject: &str,
        teardown: F,
    ) -> Result<(), QuizError>
    where
        F: Future<Output = ()>,
    {
        store.ensure_can_start()?;
        store.set_loading(true);

        let generated = tokio::select! {
            generated = self.questions.generate(subject) => Some(generated),
            () = teardown => None,
        };
        store.set_loading(false);

        let Some(generated) = generated else {
            log::debug!("quiz generation for {subject} cancelled");
            return Err(QuizError::Cancelled);
        };
        store.start_with_subject(subject, generated?)
    }

    /// Finish the active session using the elapsed time on the store's clock.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` while idle, or finish errors.
    pub async fn finish(
        &self,
        store: &mut QuizStore,
        user_id: UserId,
    ) -> Result<QuizResult, QuizError> {
        let elapsed = store.elapsed_secs().ok_or(QuizError::NoActiveSession)?;
        store.finish(user_id, elapsed).await
    }

    /// Finish the active session only once its time limit has run out.
    ///
    /// # Errors
    ///
    /// Returns finish errors; `Ok(None)` while idle or time remains.
    pub async fn finish_if_expired(
        &self,
        store: &mut QuizStore,
        user_id: UserId,
    ) -> Result<Option<QuizResult>, QuizError> {
        if !store.is_expired() {
            return Ok(None);
        }
        log::info!("quiz time limit reached, finishing for user {user_id}");
        self.finish(store, user_id).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use quiz_core::model::{QuizSettings, QuizSettingsDraft, StartPolicy};
    use quiz_core::time::fixed_clock;
    use storage::InMemoryRepository;

    use crate::bank::QuestionBank;
    use crate::provider::StaticQuestionProvider;
    use crate::quiz::QuizPhase;

    fn build(delay_ms: u64, settings: QuizSettings) -> (QuizLoopService, QuizStore) {
        let provider = StaticQuestionProvider::new(QuestionBank::builtin().unwrap())
            .with_delay(Duration::from_millis(delay_ms));
        let store = QuizStore::new(
            fixed_clock(),
            settings,
            Arc::new(InMemoryRepository::new()),
        );
        (QuizLoopService::new(Arc::new(provider)), store)
    }

    #[tokio::test]
    async fn load_quiz_starts_session_for_subject() {
        let (service, mut store) = build(0, QuizSettings::default());
        service.load_quiz(&mut store, "Mathematics").await.unwrap();

        assert_eq!(store.phase(), QuizPhase::InProgress);
        assert!(!store.is_loading());
        assert_eq!(store.session().unwrap().subject(), "Mathematics");
        assert_eq!(store.progress().unwrap().total, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_before_delay_cancels_generation() {
        let (service, mut store) = build(1_500, QuizSettings::default());
        let teardown = tokio::time::sleep(Duration::from_millis(500));

        let err = service
            .load_quiz_until(&mut store, "Mathematics", teardown)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Cancelled));
        assert_eq!(store.phase(), QuizPhase::Idle);
        assert!(!store.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn generation_wins_when_teardown_is_later() {
        let (service, mut store) = build(1_500, QuizSettings::default());
        let teardown = tokio::time::sleep(Duration::from_millis(5_000));

        service
            .load_quiz_until(&mut store, "Science", teardown)
            .await
            .unwrap();
        assert_eq!(store.session().unwrap().subject(), "Science");
    }

    #[tokio::test]
    async fn reject_policy_refuses_before_generating() {
        let settings = QuizSettingsDraft {
            start_policy: Some(StartPolicy::Reject),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap()
        .without_delays();
        let (service, mut store) = build(0, settings);
        service.load_quiz(&mut store, "Mathematics").await.unwrap();

        let err = service.load_quiz(&mut store, "Mathematics").await.unwrap_err();
        assert!(matches!(err, QuizError::SessionAlreadyActive));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn finish_if_expired_waits_for_the_limit() {
        let (service, mut store) = build(0, QuizSettings::default());
        service.load_quiz(&mut store, "Mathematics").await.unwrap();

        let user = UserId::new(1);
        assert!(service.finish_if_expired(&mut store, user).await.unwrap().is_none());
        assert_eq!(store.phase(), QuizPhase::InProgress);
    }

    #[tokio::test]
    async fn finish_if_expired_finishes_at_the_limit() {
        let (service, mut store) = build(0, QuizSettings::default());
        service.load_quiz(&mut store, "Mathematics").await.unwrap();
        store.answer_current(0).unwrap();

        let mut clock = store.clock();
        clock.advance(chrono::Duration::seconds(301));
        store.set_clock(clock);

        let result = service
            .finish_if_expired(&mut store, UserId::new(1))
            .await
            .unwrap()
            .expect("expired session finishes");
        assert_eq!(result.time_spent_secs(), 300);
        assert_eq!(result.correct_count(), 1);
        assert_eq!(store.phase(), QuizPhase::Idle);
    }

    #[tokio::test]
    async fn finish_without_session_fails() {
        let (service, mut store) = build(0, QuizSettings::default());
        let err = service.finish(&mut store, UserId::new(1)).await.unwrap_err();
        assert!(matches!(err, QuizError::NoActiveSession));
    }
}
