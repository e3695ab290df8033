use serde::{Deserialize, Serialize};

use crate::db::operations::progress::Progress;

/// Cumulative correct answers required before a word counts as mastered.
pub const MASTERY_THRESHOLD: i64 = 5;

/// Learning stage of a word. The two-state model: due-ness is derived
/// from quiz-log history, so there are no intermediate pipeline stages
/// to transition through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Stage {
    Testing,
    Mastered,
}

pub fn is_mastered(progress: &Progress) -> bool {
    progress.correct_count >= MASTERY_THRESHOLD
}

/// Word ids that have reached the mastery threshold but are not yet
/// marked mastered. Called after a quiz session for the attempted words.
pub fn promotion_candidates(progress_rows: &[Progress]) -> Vec<String> {
    progress_rows
        .iter()
        .filter(|p| p.stage != Stage::Mastered && is_mastered(p))
        .map(|p| p.word_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(word_id: &str, stage: Stage, correct: i64) -> Progress {
        Progress {
            id: format!("p-{word_id}"),
            word_id: word_id.to_string(),
            family_id: "fam".to_string(),
            stage,
            next_review_at: None,
            last_quiz_at: None,
            correct_count: correct,
            wrong_count: 0,
        }
    }

    #[test]
    fn promotes_at_threshold() {
        let rows = vec![
            progress("a", Stage::Testing, 4),
            progress("b", Stage::Testing, 5),
            progress("c", Stage::Testing, 9),
        ];
        let promoted = promotion_candidates(&rows);
        assert_eq!(promoted, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn already_mastered_words_are_skipped() {
        let rows = vec![progress("a", Stage::Mastered, 8)];
        assert!(promotion_candidates(&rows).is_empty());
    }
}
