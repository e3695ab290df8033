//! Property tests for the review scheduler:
//! - priority grows with elapsed time, history held fixed
//! - priority grows with error rate, timing held fixed
//! - selection never exceeds the pool caps and never repeats a word

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use wordpop_backend::db::operations::quiz_log::QuizLogEntry;
use wordpop_backend::db::operations::words::{Word, WordWithMeanings};
use wordpop_backend::services::scheduler::{
    review_priority, select_quiz_words, QuizMode, SchedulerPolicy, NEW_WORD_CAP, REVIEW_CAP,
};

fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-08-23T12:00:00Z")
        .expect("fixed timestamp")
        .with_timezone(&Utc)
}

fn word(id: &str) -> WordWithMeanings {
    WordWithMeanings {
        word: Word {
            id: id.to_string(),
            family_id: "fam".to_string(),
            word: format!("word-{id}"),
            uk_phonetic: String::new(),
            us_phonetic: String::new(),
            image_url: String::new(),
            created_at: fixed_now() - Duration::days(60),
        },
        meanings: Vec::new(),
        progress: None,
    }
}

fn log_entry(word_id: &str, created_at: DateTime<Utc>, is_correct: bool) -> QuizLogEntry {
    QuizLogEntry {
        id: format!("log-{word_id}-{created_at}"),
        family_id: "fam".to_string(),
        word_id: word_id.to_string(),
        meaning_id: "m1".to_string(),
        quiz_type: "en2cn".to_string(),
        is_correct,
        created_at,
    }
}

/// History of `total` answers, `wrong` of them incorrect, all sharing one
/// timestamp `age_hours` before the fixed now. A single timestamp keeps
/// the distinct-day count at one, so only the dimension under test moves.
fn history(total: usize, wrong: usize, age_hours: i64) -> Vec<QuizLogEntry> {
    let at = fixed_now() - Duration::hours(age_hours);
    (0..total).map(|i| log_entry("w", at, i >= wrong)).collect()
}

proptest! {
    #[test]
    fn priority_grows_with_elapsed_time(
        age_a in 1i64..2000,
        gap in 1i64..2000,
        total in 1usize..20,
        wrong_ratio in 0usize..=10,
    ) {
        let wrong = total * wrong_ratio / 10;
        let now = fixed_now();

        let younger = history(total, wrong, age_a);
        let older = history(total, wrong, age_a + gap);
        let younger_refs: Vec<&QuizLogEntry> = younger.iter().collect();
        let older_refs: Vec<&QuizLogEntry> = older.iter().collect();

        let p_younger = review_priority(&younger_refs, &now);
        let p_older = review_priority(&older_refs, &now);
        prop_assert!(p_older > p_younger, "older {p_older} vs younger {p_younger}");
    }

    #[test]
    fn priority_grows_with_error_rate(
        age in 1i64..2000,
        total in 2usize..20,
        wrong in 1usize..10,
    ) {
        prop_assume!(wrong <= total);
        let now = fixed_now();

        let cleaner = history(total, wrong - 1, age);
        let wronger = history(total, wrong, age);
        let cleaner_refs: Vec<&QuizLogEntry> = cleaner.iter().collect();
        let wronger_refs: Vec<&QuizLogEntry> = wronger.iter().collect();

        let p_cleaner = review_priority(&cleaner_refs, &now);
        let p_wronger = review_priority(&wronger_refs, &now);
        prop_assert!(p_wronger > p_cleaner, "wronger {p_wronger} vs cleaner {p_cleaner}");
    }

    #[test]
    fn priority_is_never_negative(
        age in 0i64..5000,
        total in 1usize..30,
        wrong_ratio in 0usize..=10,
    ) {
        let wrong = total * wrong_ratio / 10;
        let entries = history(total, wrong, age);
        let refs: Vec<&QuizLogEntry> = entries.iter().collect();
        prop_assert!(review_priority(&refs, &fixed_now()) >= 0.0);
    }

    #[test]
    fn selection_respects_caps_and_uniqueness(
        new_count in 0usize..30,
        reviewed_count in 0usize..40,
        seed in 0u64..1000,
    ) {
        let now = fixed_now();
        let mut words = Vec::new();
        let mut log = Vec::new();

        for i in 0..new_count {
            words.push(word(&format!("new{i}")));
        }
        for i in 0..reviewed_count {
            let id = format!("old{i}");
            words.push(word(&id));
            log.push(log_entry(&id, now - Duration::days(1 + i as i64 % 9), i % 3 != 0));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let selected = select_quiz_words(
            &words,
            &log,
            &now,
            QuizMode::Standard,
            SchedulerPolicy::default(),
            &mut rng,
        );

        let new_selected = selected
            .iter()
            .filter(|w| w.word.id.starts_with("new"))
            .count();
        let review_selected = selected.len() - new_selected;
        prop_assert!(new_selected <= NEW_WORD_CAP.min(new_count));
        prop_assert!(review_selected <= REVIEW_CAP.min(reviewed_count));

        let ids: HashSet<&str> = selected.iter().map(|w| w.word.id.as_str()).collect();
        prop_assert_eq!(ids.len(), selected.len(), "duplicate word in selection");
    }
}
