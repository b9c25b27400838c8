use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{QuizSettings, QuizSettingsDraft, Role, UserId, UserProfile};
use storage::{Storage, UserProfileRepository};

use crate::Clock;
use crate::bank::QuestionBank;
use crate::classroom::{ClassroomService, SimulatedClassroom};
use crate::diagnostic::DiagnosticService;
use crate::error::AppServicesError;
use crate::notifier::{CompletionNotifier, LogNotifier};
use crate::progress::ProgressService;
use crate::provider::{StaticQuestionProvider, ThresholdClassifier};
use crate::quiz::{QuizLoopService, QuizStore};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: QuizSettings,
    storage: Storage,
    notifier: Arc<dyn CompletionNotifier>,
    quiz_loop: Arc<QuizLoopService>,
    diagnostics: Arc<DiagnosticService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services over `storage` with the built-in question banks.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Bank` if an embedded bank fails to parse.
    pub fn new(
        storage: Storage,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let notifier: Arc<dyn CompletionNotifier> = Arc::new(LogNotifier);

        let provider = StaticQuestionProvider::new(QuestionBank::builtin()?)
            .with_delay(Duration::from_millis(settings.generation_delay_ms()))
            .with_shuffle(settings.shuffle_questions());
        let quiz_loop = Arc::new(QuizLoopService::new(Arc::new(provider)));

        let classifier =
            ThresholdClassifier::new(Duration::from_millis(settings.diagnostic_delay_ms()));
        let diagnostics = Arc::new(
            DiagnosticService::builtin(
                clock,
                Arc::new(classifier),
                Arc::clone(&storage.profiles),
            )?
            .with_notifier(Arc::clone(&notifier)),
        );

        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.results),
            Arc::clone(&storage.profiles),
        ));

        Ok(Self {
            clock,
            settings,
            storage,
            notifier,
            quiz_loop,
            diagnostics,
            progress,
        })
    }

    /// Validate `draft` and build services over fresh in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Settings` for an invalid draft, or
    /// `AppServicesError::Bank` if an embedded bank fails to parse.
    pub fn in_memory(clock: Clock, draft: QuizSettingsDraft) -> Result<Self, AppServicesError> {
        let settings = draft.validate()?;
        Self::new(Storage::in_memory(), clock, settings)
    }

    /// Fetch the profile for `id`, creating it with `name` and `role` if missing.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the name is blank or storage fails.
    pub async fn ensure_user(
        &self,
        id: UserId,
        name: &str,
        role: Role,
    ) -> Result<UserProfile, AppServicesError> {
        let profiles: &dyn UserProfileRepository = self.storage.profiles.as_ref();
        if let Some(existing) = profiles.get_profile(id).await? {
            return Ok(existing);
        }
        let profile = UserProfile::new(id, name, role)?;
        profiles.upsert_profile(&profile).await?;
        log::info!("created {role:?} profile for user {id}");
        Ok(profile)
    }

    /// A new, idle quiz store sharing this app's clock, settings and result log.
    #[must_use]
    pub fn quiz_store(&self) -> QuizStore {
        QuizStore::new(
            self.clock,
            self.settings.clone(),
            Arc::clone(&self.storage.results),
        )
        .with_notifier(Arc::clone(&self.notifier))
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    /// A disconnected classroom session over the demo courses, feeding this
    /// app's quiz loop.
    #[must_use]
    pub fn classroom(&self) -> ClassroomService {
        let classroom = SimulatedClassroom::builtin()
            .with_delay(Duration::from_millis(self.settings.classroom_delay_ms()));
        ClassroomService::new(self.clock, Arc::new(classroom), Arc::clone(&self.quiz_loop))
            .with_notifier(Arc::clone(&self.notifier))
    }

    #[must_use]
    pub fn diagnostics(&self) -> Arc<DiagnosticService> {
        Arc::clone(&self.diagnostics)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
