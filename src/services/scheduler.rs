//! Spaced-repetition scheduling: decides which words a learner should be
//! quizzed on right now.
//!
//! Previously-quizzed words are ranked by `timePriority * errorWeight`,
//! where `timePriority` compares elapsed time against an escalating ideal
//! interval (Ebbinghaus-style) and `errorWeight` pushes error-prone words
//! forward. Never-quizzed words bypass the formula and enter through a
//! separate capped new-word pool.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::operations::quiz_log::QuizLogEntry;
use crate::db::operations::words::WordWithMeanings;
use crate::services::mastery::Stage;

/// Ideal review spacing in days, indexed by distinct quiz days so far.
pub const IDEAL_INTERVALS: [f64; 6] = [1.0, 2.0, 4.0, 7.0, 15.0, 30.0];
/// At most this many never-quizzed words per session.
pub const NEW_WORD_CAP: usize = 5;
/// At most this many review words per session.
pub const REVIEW_CAP: usize = 15;

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    /// The day's mandatory session. Empty once today's quiz is done.
    Standard,
    /// Voluntary extra round: ignores the done-check, but does not
    /// reintroduce a word as "new" twice in one day.
    Extra,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerPolicy {
    /// Whether mastered words are exempt from review scoring.
    pub exclude_mastered: bool,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            exclude_mastered: false,
        }
    }
}

/// Due-ness score for one previously-quizzed word. Empty history scores 0
/// (such words belong to the new pool, not here).
pub fn review_priority<Tz: TimeZone>(history: &[&QuizLogEntry], now: &DateTime<Tz>) -> f64 {
    let Some(last_quiz_at) = history.iter().map(|e| e.created_at).max() else {
        return 0.0;
    };

    let elapsed_ms = (now.clone().with_timezone(&Utc) - last_quiz_at).num_milliseconds();
    let days_since = (elapsed_ms as f64 / MS_PER_DAY).max(0.0);

    let tz = now.timezone();
    let distinct_days: HashSet<_> = history
        .iter()
        .map(|e| e.created_at.with_timezone(&tz).date_naive())
        .collect();
    let interval_index = distinct_days
        .len()
        .saturating_sub(1)
        .min(IDEAL_INTERVALS.len() - 1);
    let time_priority = days_since / IDEAL_INTERVALS[interval_index];

    let wrong = history.iter().filter(|e| !e.is_correct).count() as f64;
    let error_rate = wrong / history.len() as f64;
    let error_weight = 1.0 + 2.0 * error_rate;

    time_priority * error_weight
}

/// True once any quiz-log entry exists at or after local midnight today.
pub fn today_quiz_done<Tz: TimeZone>(log: &[QuizLogEntry], now: &DateTime<Tz>) -> bool {
    let day_start = start_of_day(now);
    log.iter().any(|e| e.created_at >= day_start)
}

/// Selects today's quiz words: up to [`NEW_WORD_CAP`] randomly drawn
/// never-quizzed words followed by up to [`REVIEW_CAP`] review words in
/// descending priority order. The composer re-shuffles downstream, so
/// the concatenation order is not load-bearing.
pub fn select_quiz_words<R, Tz>(
    words: &[WordWithMeanings],
    log: &[QuizLogEntry],
    now: &DateTime<Tz>,
    mode: QuizMode,
    policy: SchedulerPolicy,
    rng: &mut R,
) -> Vec<WordWithMeanings>
where
    R: Rng + ?Sized,
    Tz: TimeZone,
{
    if words.is_empty() {
        return Vec::new();
    }
    if mode == QuizMode::Standard && today_quiz_done(log, now) {
        return Vec::new();
    }

    let mut history: HashMap<&str, Vec<&QuizLogEntry>> = HashMap::new();
    for entry in log {
        history.entry(entry.word_id.as_str()).or_default().push(entry);
    }

    let day_start = start_of_day(now);
    let quizzed_today: HashSet<&str> = log
        .iter()
        .filter(|e| e.created_at >= day_start)
        .map(|e| e.word_id.as_str())
        .collect();

    let mut new_pool: Vec<&WordWithMeanings> = Vec::new();
    let mut review_pool: Vec<(f64, &WordWithMeanings)> = Vec::new();

    for entry in words {
        match history.get(entry.word.id.as_str()) {
            Some(word_history) => {
                if policy.exclude_mastered && stage_of(entry) == Some(Stage::Mastered) {
                    continue;
                }
                review_pool.push((review_priority(word_history, now), entry));
            }
            None => {
                if mode == QuizMode::Extra && quizzed_today.contains(entry.word.id.as_str()) {
                    continue;
                }
                new_pool.push(entry);
            }
        }
    }

    new_pool.shuffle(rng);
    new_pool.truncate(NEW_WORD_CAP);

    review_pool.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    review_pool.truncate(REVIEW_CAP);

    new_pool
        .into_iter()
        .cloned()
        .chain(review_pool.into_iter().map(|(_, entry)| entry.clone()))
        .collect()
}

fn stage_of(entry: &WordWithMeanings) -> Option<Stage> {
    entry.progress.as_ref().map(|p| p.stage)
}

fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.clone().with_timezone(&Utc))
}
