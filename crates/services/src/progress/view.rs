use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use quiz_core::model::{Difficulty, QuizResult, ResultId, UserId};
use quiz_core::scoring::round_percentage;

use crate::bank::subject_key;

/// Presentation-agnostic result row. The UI formats dates itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentResult {
    pub id: ResultId,
    pub subject: String,
    pub score: u8,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

impl RecentResult {
    #[must_use]
    pub fn from_result(result: &QuizResult) -> Self {
        Self {
            id: result.id(),
            subject: result.subject().to_owned(),
            score: result.score(),
            total_questions: result.total_questions(),
            completed_at: result.completed_at(),
        }
    }
}

/// One student's standing in a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectProgress {
    pub subject: String,
    pub attempts: u32,
    pub average_score: u8,
    pub best_score: u8,
}

/// A student's dashboard, derived from their result log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub quizzes_taken: u32,
    pub average_score: Option<u8>,
    /// Latest score minus first score; `None` with fewer than two results.
    pub improvement: Option<i16>,
    pub time_spent_secs: u64,
    pub subjects: Vec<SubjectProgress>,
    pub recent: Vec<RecentResult>,
}

impl Dashboard {
    /// Build a dashboard from one user's results, in any order.
    #[must_use]
    pub fn from_results(results: &[QuizResult], recent_limit: usize) -> Self {
        let mut ordered: Vec<&QuizResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.completed_at());

        let scores: Vec<u8> = ordered.iter().map(|r| r.score()).collect();
        let improvement = match (scores.first(), scores.last()) {
            (Some(first), Some(last)) if scores.len() > 1 => {
                Some(i16::from(*last) - i16::from(*first))
            }
            _ => None,
        };

        // keyed like the bank's subject map; the earliest spelling is shown
        let mut by_subject: BTreeMap<String, (&str, Vec<u8>)> = BTreeMap::new();
        for result in &ordered {
            by_subject
                .entry(subject_key(result.subject()))
                .or_insert_with(|| (result.subject(), Vec::new()))
                .1
                .push(result.score());
        }
        let subjects = by_subject
            .into_values()
            .map(|(subject, scores)| SubjectProgress {
                subject: subject.to_owned(),
                attempts: count_u32(scores.len()),
                average_score: mean_score(&scores).unwrap_or(0),
                best_score: scores.iter().copied().max().unwrap_or(0),
            })
            .collect();

        let recent = ordered
            .iter()
            .rev()
            .take(recent_limit)
            .map(|r| RecentResult::from_result(r))
            .collect();

        Self {
            quizzes_taken: count_u32(results.len()),
            average_score: mean_score(&scores),
            improvement,
            time_spent_secs: results.iter().map(|r| u64::from(r.time_spent_secs())).sum(),
            subjects,
            recent,
        }
    }
}

/// Class-wide performance for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPerformance {
    pub subject: String,
    pub average: u8,
    pub students: u32,
    pub attempts: u32,
}

/// Share of answered questions at one difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyShare {
    pub difficulty: Difficulty,
    pub answered: u32,
    pub percentage: u8,
}

/// A student's best result, ranked against the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopPerformer {
    pub user_id: UserId,
    pub name: Option<String>,
    pub subject: String,
    pub best_score: u8,
    /// Latest minus first score in the best result's subject.
    pub improvement: Option<i16>,
}

/// Educator-facing aggregate over many students' results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOverview {
    pub total_students: u32,
    pub results: u32,
    pub average_performance: Option<u8>,
    pub subjects: Vec<SubjectPerformance>,
    pub difficulty: Vec<DifficultyShare>,
    pub top_performers: Vec<TopPerformer>,
}

impl ClassOverview {
    /// Aggregate results (already filtered) into class analytics.
    ///
    /// Performer names are left empty; the service fills them in.
    #[must_use]
    pub fn from_results(results: &[QuizResult], top_limit: usize) -> Self {
        let students: HashSet<UserId> = results.iter().map(QuizResult::user_id).collect();
        let scores: Vec<u8> = results.iter().map(QuizResult::score).collect();

        let mut by_subject: BTreeMap<String, (&str, Vec<u8>, HashSet<UserId>)> = BTreeMap::new();
        for result in results {
            let entry = by_subject
                .entry(subject_key(result.subject()))
                .or_insert_with(|| (result.subject(), Vec::new(), HashSet::new()));
            entry.1.push(result.score());
            entry.2.insert(result.user_id());
        }
        let subjects = by_subject
            .into_values()
            .map(|(subject, scores, users)| SubjectPerformance {
                subject: subject.to_owned(),
                average: mean_score(&scores).unwrap_or(0),
                students: count_u32(users.len()),
                attempts: count_u32(scores.len()),
            })
            .collect();

        Self {
            total_students: count_u32(students.len()),
            results: count_u32(results.len()),
            average_performance: mean_score(&scores),
            subjects,
            difficulty: difficulty_shares(results),
            top_performers: top_performers(results, top_limit),
        }
    }
}

fn difficulty_shares(results: &[QuizResult]) -> Vec<DifficultyShare> {
    let mut counts: HashMap<Difficulty, u32> = HashMap::new();
    for result in results {
        for (question, answer) in result.questions().iter().zip(result.user_answers()) {
            if answer.is_some() {
                *counts.entry(question.difficulty()).or_default() += 1;
            }
        }
    }
    let answered_total: u32 = counts.values().sum();

    Difficulty::ALL
        .iter()
        .map(|&difficulty| {
            let answered = counts.get(&difficulty).copied().unwrap_or(0);
            DifficultyShare {
                difficulty,
                answered,
                percentage: round_percentage(answered, answered_total),
            }
        })
        .collect()
}

fn top_performers(results: &[QuizResult], limit: usize) -> Vec<TopPerformer> {
    let mut ordered: Vec<&QuizResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.completed_at());

    // earliest result wins ties on best score
    let mut best: HashMap<UserId, &QuizResult> = HashMap::new();
    for &result in &ordered {
        best.entry(result.user_id())
            .and_modify(|current| {
                if result.score() > current.score() {
                    *current = result;
                }
            })
            .or_insert(result);
    }

    let mut performers: Vec<TopPerformer> = best
        .into_values()
        .map(|top| {
            let key = subject_key(top.subject());
            let subject_scores: Vec<u8> = ordered
                .iter()
                .filter(|r| r.user_id() == top.user_id() && subject_key(r.subject()) == key)
                .map(|r| r.score())
                .collect();
            let improvement = match subject_scores.as_slice() {
                [first, .., last] => Some(i16::from(*last) - i16::from(*first)),
                _ => None,
            };
            TopPerformer {
                user_id: top.user_id(),
                name: None,
                subject: top.subject().to_owned(),
                best_score: top.score(),
                improvement,
            }
        })
        .collect();

    performers.sort_by(|a, b| {
        b.best_score
            .cmp(&a.best_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    performers.truncate(limit);
    performers
}

/// Rounded mean of percentage scores; `None` when empty.
fn mean_score(scores: &[u8]) -> Option<u8> {
    if scores.is_empty() {
        return None;
    }
    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    let n = count_u32(scores.len());
    // mean of percentages = sum% of (n * 100)
    Some(round_percentage(sum, n.saturating_mul(100)))
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
