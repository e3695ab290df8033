use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use crate::db::operations::StoreError;
use crate::db::Database;
use crate::services::mastery::{Stage, MASTERY_THRESHOLD};

/// One-to-one with a word. Counts only ever grow until the word is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: String,
    pub word_id: String,
    pub family_id: String,
    pub stage: Stage,
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_quiz_at: Option<DateTime<Utc>>,
    pub correct_count: i64,
    pub wrong_count: i64,
}

pub async fn get_progress(db: &Database, word_id: &str) -> Result<Option<Progress>, StoreError> {
    let row = sqlx::query_as::<_, Progress>(r#"SELECT * FROM "progress" WHERE "word_id" = ?"#)
        .bind(word_id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row)
}

/// Applies one quiz outcome to the cumulative counters.
pub async fn bump_counts(
    db: &Database,
    family_id: &str,
    word_id: &str,
    is_correct: bool,
) -> Result<(), StoreError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE "progress"
        SET "correct_count" = "correct_count" + ?,
            "wrong_count" = "wrong_count" + ?,
            "last_quiz_at" = ?
        WHERE "word_id" = ? AND "family_id" = ?
        "#,
    )
    .bind(if is_correct { 1 } else { 0 })
    .bind(if is_correct { 0 } else { 1 })
    .bind(now)
    .bind(word_id)
    .bind(family_id)
    .execute(db.pool())
    .await?;
    Ok(())
}

/// Marks every listed word whose cumulative correct count has reached
/// the mastery threshold as mastered. Mastered words keep their progress
/// row and stay eligible for review scheduling.
pub async fn promote_mastered(
    db: &Database,
    family_id: &str,
    word_ids: &[String],
) -> Result<u64, StoreError> {
    if word_ids.is_empty() {
        return Ok(0);
    }

    let next_review = Utc::now() + Duration::days(14);
    let mut builder = QueryBuilder::new(
        r#"UPDATE "progress" SET "stage" = "#,
    );
    builder.push_bind(Stage::Mastered);
    builder.push(r#", "next_review_at" = "#);
    builder.push_bind(next_review);
    builder.push(r#" WHERE "family_id" = "#);
    builder.push_bind(family_id);
    builder.push(r#" AND "correct_count" >= "#);
    builder.push_bind(MASTERY_THRESHOLD);
    builder.push(r#" AND "stage" != "#);
    builder.push_bind(Stage::Mastered);
    builder.push(r#" AND "word_id" IN ("#);
    let mut separated = builder.separated(", ");
    for word_id in word_ids {
        separated.push_bind(word_id);
    }
    separated.push_unseparated(")");

    let result = builder.build().execute(db.pool()).await?;
    Ok(result.rows_affected())
}
