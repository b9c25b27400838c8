use quiz_core::model::{Classification, QuizResult, UserId};

use crate::classroom::Course;

/// Fire-and-forget completion feedback (toasts, banners, log lines).
pub trait CompletionNotifier: Send + Sync {
    fn quiz_completed(&self, result: &QuizResult);

    fn diagnostic_completed(&self, user_id: UserId, classification: &Classification);

    fn course_synced(&self, course: &Course);
}

/// Notifier that writes one `info` line per completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl CompletionNotifier for LogNotifier {
    fn quiz_completed(&self, result: &QuizResult) {
        log::info!(
            "quiz completed: user={} subject={} score={}% ({}/{}) in {}s",
            result.user_id(),
            result.subject(),
            result.score(),
            result.correct_count(),
            result.total_questions(),
            result.time_spent_secs()
        );
    }

    fn diagnostic_completed(&self, user_id: UserId, classification: &Classification) {
        log::info!(
            "diagnostic completed: user={user_id} level={} score={}%",
            classification.level(),
            classification.percentage()
        );
    }

    fn course_synced(&self, course: &Course) {
        log::info!(
            "course synced: {} ({}) -> {} quiz",
            course.name,
            course.section,
            course.subject
        );
    }
}
