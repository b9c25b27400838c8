use std::sync::{Arc, Mutex};

use quiz_core::model::{
    Classification, Difficulty, Question, QuestionDraft, QuestionId, QuizResult, QuizSettings,
    QuizSettingsDraft, QuizSettingsError, UserId,
};
use quiz_core::time::fixed_now;
use services::{
    AppServices, AppServicesError, Clock, CompletionNotifier, Course, QuizError, QuizPhase,
    QuizStore,
};
use storage::{QuizResultRepository, Storage};

fn questions(correct: &[usize]) -> Vec<Question> {
    correct
        .iter()
        .enumerate()
        .map(|(i, &answer)| {
            QuestionDraft {
                id: QuestionId::new(i as u64 + 1),
                question: format!("Question {}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: answer,
                explanation: String::new(),
                difficulty: Difficulty::Medium,
                topic: "Algebra".into(),
                subject: "Mathematics".into(),
            }
            .validate()
            .expect("valid question")
        })
        .collect()
}

fn services() -> AppServices {
    AppServices::new(
        Storage::in_memory(),
        Clock::fixed(fixed_now()),
        QuizSettings::default().without_delays(),
    )
    .expect("build services")
}

fn answer_all(store: &mut QuizStore, answers: &[usize]) {
    for (i, &answer) in answers.iter().enumerate() {
        if i > 0 {
            store.advance().expect("advance");
        }
        store.answer_current(answer).expect("answer");
    }
}

#[derive(Default)]
struct RecordingNotifier {
    completed: Mutex<Vec<u8>>,
    synced: Mutex<Vec<String>>,
}

impl CompletionNotifier for RecordingNotifier {
    fn quiz_completed(&self, result: &QuizResult) {
        self.completed.lock().expect("lock").push(result.score());
    }

    fn diagnostic_completed(&self, _user_id: UserId, _classification: &Classification) {}

    fn course_synced(&self, course: &Course) {
        self.synced.lock().expect("lock").push(course.id.clone());
    }
}

#[tokio::test]
async fn all_correct_scores_one_hundred() {
    let services = services();
    let mut store = services.quiz_store();
    store.start(questions(&[0, 2, 1])).expect("start");
    answer_all(&mut store, &[0, 2, 1]);

    let result = store.finish(UserId::new(1), 42).await.expect("finish");
    assert_eq!(result.score(), 100);
    assert_eq!(result.correct_count(), 3);
    assert_eq!(result.time_spent_secs(), 42);
    assert_eq!(result.user_answers(), &[Some(0_usize), Some(2), Some(1)]);
    assert_eq!(store.phase(), QuizPhase::Idle);

    let stored = services
        .storage()
        .results
        .get_result(result.id())
        .await
        .expect("read log")
        .expect("result appended");
    assert_eq!(stored, result);
}

#[tokio::test]
async fn one_of_three_rounds_to_thirty_three() {
    let services = services();
    let mut store = services.quiz_store();
    store.start(questions(&[0, 2, 1])).expect("start");
    answer_all(&mut store, &[1, 2, 0]);

    let result = store.finish(UserId::new(1), 10).await.expect("finish");
    assert_eq!(result.score(), 33);
    assert_eq!(result.correct_count(), 1);
}

#[tokio::test]
async fn unanswered_slot_counts_as_wrong() {
    let services = services();
    let mut store = services.quiz_store();
    store.start(questions(&[0, 1])).expect("start");
    store.answer_current(0).expect("answer");

    let result = store.finish(UserId::new(1), 5).await.expect("finish");
    assert_eq!(result.score(), 50);
    assert_eq!(result.user_answers(), &[Some(0_usize), None]);
}

#[tokio::test]
async fn notifier_hears_about_completion() {
    let services = services();
    let notifier = Arc::new(RecordingNotifier::default());
    let mut store = services
        .quiz_store()
        .with_notifier(Arc::clone(&notifier) as Arc<dyn CompletionNotifier>);
    store.start(questions(&[0])).expect("start");
    store.answer_current(0).expect("answer");
    store.finish(UserId::new(1), 1).await.expect("finish");

    assert_eq!(*notifier.completed.lock().expect("lock"), vec![100]);
}

#[tokio::test]
async fn elapsed_over_limit_is_rejected_and_session_kept() {
    let services = services();
    let mut store = services.quiz_store();
    store.start(questions(&[0])).expect("start");

    let err = store.finish(UserId::new(1), 301).await.unwrap_err();
    assert!(matches!(err, QuizError::InvalidInput(_)));
    assert_eq!(store.phase(), QuizPhase::InProgress);
}

#[tokio::test]
async fn generated_quiz_feeds_the_dashboard() {
    let services = services();
    let quiz_loop = services.quiz_loop();
    let mut store = services.quiz_store();
    let user = UserId::new(7);

    quiz_loop
        .load_quiz(&mut store, "Mathematics")
        .await
        .expect("load quiz");
    let correct: Vec<usize> = store
        .session()
        .expect("active session")
        .questions()
        .iter()
        .map(Question::correct_answer)
        .collect();
    answer_all(&mut store, &correct);
    quiz_loop.finish(&mut store, user).await.expect("finish");

    quiz_loop
        .load_quiz(&mut store, "History")
        .await
        .expect("load quiz");
    quiz_loop.finish(&mut store, user).await.expect("finish");

    let dashboard = services.progress().dashboard(user).await.expect("dashboard");
    assert_eq!(dashboard.quizzes_taken, 2);
    assert_eq!(dashboard.average_score, Some(50));
    assert_eq!(dashboard.subjects.len(), 2);
}

#[tokio::test]
async fn stores_share_one_result_log() {
    let storage = Storage::in_memory();
    let services = AppServices::new(
        storage.clone(),
        Clock::fixed(fixed_now()),
        QuizSettings::default().without_delays(),
    )
    .expect("build services");

    let mut first = services.quiz_store();
    let mut second = services.quiz_store();
    first.start(questions(&[0])).expect("start");
    second.start(questions(&[1])).expect("start");
    first.finish(UserId::new(1), 1).await.expect("finish");
    second.finish(UserId::new(2), 1).await.expect("finish");

    let all = storage.results.list_results().await.expect("list");
    assert_eq!(all.len(), 2);
}

#[test]
fn invalid_settings_draft_is_rejected() {
    let draft = QuizSettingsDraft {
        time_limit_secs: Some(0),
        ..QuizSettingsDraft::default()
    };
    let err = match AppServices::in_memory(Clock::fixed(fixed_now()), draft) {
        Ok(_) => panic!("zero time limit accepted"),
        Err(err) => err,
    };
    assert!(matches!(
        err,
        AppServicesError::Settings(QuizSettingsError::InvalidTimeLimit(0))
    ));
}

#[tokio::test]
async fn in_memory_fills_settings_defaults() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()), QuizSettingsDraft::default())
        .expect("build services");
    assert_eq!(services.settings(), &QuizSettings::default());
}

#[tokio::test]
async fn synced_course_quiz_lands_on_dashboard() {
    let services = services();
    let user = UserId::new(5);
    let mut classroom = services.classroom();
    assert!(!classroom.is_connected());
    assert_eq!(classroom.connect().await.expect("connect").len(), 3);

    let mut store = services.quiz_store();
    let course = classroom
        .sync_course(&mut store, "1")
        .await
        .expect("sync course");
    assert_eq!(course.subject, "Mathematics");
    assert_eq!(course.last_synced, Some(fixed_now()));

    let result = services
        .quiz_loop()
        .finish(&mut store, user)
        .await
        .expect("finish");
    assert_eq!(result.subject(), "Mathematics");

    let dashboard = services.progress().dashboard(user).await.expect("dashboard");
    assert_eq!(dashboard.quizzes_taken, 1);
    assert_eq!(dashboard.subjects[0].subject, "Mathematics");
}
