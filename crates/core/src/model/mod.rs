mod ids;
mod level;
mod profile;
mod question;
mod result;
mod settings;

pub use ids::{ParseIdError, QuestionId, ResultId, UserId};

pub use level::{
    ADVANCED_THRESHOLD, Classification, INTERMEDIATE_THRESHOLD, LearningLevel, ParseLevelError,
};
pub use profile::{ProfileError, ProfilePatch, Role, UserProfile};
pub use question::{Difficulty, MIN_OPTIONS, Question, QuestionDraft, QuestionError};
pub use result::{FinishedQuiz, QuizResult, QuizResultError};
pub use settings::{
    DEFAULT_CLASSROOM_DELAY_MS, DEFAULT_DIAGNOSTIC_DELAY_MS, DEFAULT_GENERATION_DELAY_MS, DEFAULT_TIME_LIMIT_SECS,
    MAX_TIME_LIMIT_SECS, QuizSettings, QuizSettingsDraft, QuizSettingsError, StartPolicy,
};
