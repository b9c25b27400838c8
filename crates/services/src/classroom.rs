//! Simulated classroom integration.
//!
//! Connecting takes a fixed delay and yields a fixed course list. Syncing a
//! course generates a quiz for the course's subject.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Clock;
use crate::error::{ClassroomError, ProviderError};
use crate::notifier::{CompletionNotifier, LogNotifier};
use crate::quiz::{QuizLoopService, QuizStore};

/// A course visible through the classroom connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub section: String,
    pub instructor: String,
    pub students: u32,
    /// Quiz subject generated when the course is synced.
    pub subject: String,
    pub active: bool,
    pub last_synced: Option<DateTime<Utc>>,
}

impl Course {
    fn new(
        id: &str,
        name: &str,
        section: &str,
        instructor: &str,
        students: u32,
        subject: &str,
        active: bool,
    ) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            section: section.to_owned(),
            instructor: instructor.to_owned(),
            students,
            subject: subject.to_owned(),
            active,
            last_synced: None,
        }
    }
}

/// The three demo courses served by [`SimulatedClassroom`].
#[must_use]
pub fn builtin_courses() -> Vec<Course> {
    vec![
        Course::new("1", "Advanced Mathematics", "Period 1", "Ms. Johnson", 28, "Mathematics", true),
        Course::new("2", "Physics 101", "Period 3", "Dr. Smith", 24, "Science", true),
        Course::new("3", "English Literature", "Period 5", "Mr. Davis", 32, "English", false),
    ]
}

/// Remote classroom backend.
#[async_trait]
pub trait ClassroomProvider: Send + Sync {
    /// Authorize against the backend.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the backend refuses the connection.
    async fn connect(&self) -> Result<(), ProviderError>;

    /// Courses visible to the connected account.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unavailable` before `connect` succeeded.
    async fn list_courses(&self) -> Result<Vec<Course>, ProviderError>;
}

/// Classroom backend that accepts every connection after a fixed delay.
#[derive(Debug)]
pub struct SimulatedClassroom {
    delay: Duration,
    connected: AtomicBool,
    courses: Vec<Course>,
}

impl SimulatedClassroom {
    #[must_use]
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            delay: Duration::ZERO,
            connected: AtomicBool::new(false),
            courses,
        }
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::new(builtin_courses())
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ClassroomProvider for SimulatedClassroom {
    async fn connect(&self) -> Result<(), ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, ProviderError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("classroom not connected".into()));
        }
        Ok(self.courses.clone())
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Connection state, course selection and course sync for one educator.
pub struct ClassroomService {
    clock: Clock,
    provider: Arc<dyn ClassroomProvider>,
    quiz_loop: Arc<QuizLoopService>,
    notifier: Arc<dyn CompletionNotifier>,
    courses: Vec<Course>,
    selected: BTreeSet<String>,
    connected: bool,
}

impl ClassroomService {
    #[must_use]
    pub fn new(
        clock: Clock,
        provider: Arc<dyn ClassroomProvider>,
        quiz_loop: Arc<QuizLoopService>,
    ) -> Self {
        Self {
            clock,
            provider,
            quiz_loop,
            notifier: Arc::new(LogNotifier),
            courses: Vec::new(),
            selected: BTreeSet::new(),
            connected: false,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn CompletionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    #[must_use]
    pub fn is_selected(&self, course_id: &str) -> bool {
        self.selected.contains(course_id)
    }

    /// Connect and load the course list. Reconnecting refreshes the list.
    ///
    /// # Errors
    ///
    /// Returns `ClassroomError::Provider` if the backend fails.
    pub async fn connect(&mut self) -> Result<&[Course], ClassroomError> {
        self.provider.connect().await?;
        self.courses = self.provider.list_courses().await?;
        self.selected
            .retain(|id| self.courses.iter().any(|c| &c.id == id));
        self.connected = true;
        log::info!("classroom connected with {} courses", self.courses.len());
        Ok(&self.courses)
    }

    /// Flip a course's selection. Returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns `ClassroomError::NotConnected` before `connect` and
    /// `ClassroomError::UnknownCourse` for an id not in the course list.
    pub fn toggle_course(&mut self, course_id: &str) -> Result<bool, ClassroomError> {
        self.course(course_id)?;
        if self.selected.remove(course_id) {
            Ok(false)
        } else {
            self.selected.insert(course_id.to_owned());
            Ok(true)
        }
    }

    /// Generate a quiz for the course's subject into `store` and stamp the sync time.
    ///
    /// # Errors
    ///
    /// Returns `ClassroomError::NotConnected`, `ClassroomError::UnknownCourse`,
    /// or the quiz loop's error if generation fails.
    pub async fn sync_course(
        &mut self,
        store: &mut QuizStore,
        course_id: &str,
    ) -> Result<&Course, ClassroomError> {
        let subject = self.course(course_id)?.subject.clone();
        self.quiz_loop.load_quiz(store, &subject).await?;

        let now = self.clock.now();
        let course = self
            .courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| ClassroomError::UnknownCourse(course_id.to_owned()))?;
        course.last_synced = Some(now);
        self.notifier.course_synced(course);
        Ok(course)
    }

    fn course(&self, course_id: &str) -> Result<&Course, ClassroomError> {
        if !self.connected {
            return Err(ClassroomError::NotConnected);
        }
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| ClassroomError::UnknownCourse(course_id.to_owned()))
    }
}
