use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::operations::StoreError;
use crate::db::Database;

/// Append-only quiz fact; never updated or deleted. The scheduler
/// derives all due-ness state from these rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizLogEntry {
    pub id: String,
    pub family_id: String,
    pub word_id: String,
    pub meaning_id: String,
    pub quiz_type: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizLogDraft {
    pub word_id: String,
    pub meaning_id: String,
    pub quiz_type: String,
    pub is_correct: bool,
}

pub async fn append_quiz_log(
    db: &Database,
    family_id: &str,
    draft: &QuizLogDraft,
) -> Result<QuizLogEntry, StoreError> {
    let entry = QuizLogEntry {
        id: Uuid::new_v4().to_string(),
        family_id: family_id.to_string(),
        word_id: draft.word_id.clone(),
        meaning_id: draft.meaning_id.clone(),
        quiz_type: draft.quiz_type.clone(),
        is_correct: draft.is_correct,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO "quiz_log"
            ("id", "family_id", "word_id", "meaning_id", "quiz_type", "is_correct", "created_at")
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.family_id)
    .bind(&entry.word_id)
    .bind(&entry.meaning_id)
    .bind(&entry.quiz_type)
    .bind(entry.is_correct)
    .bind(entry.created_at)
    .execute(db.pool())
    .await?;

    Ok(entry)
}

pub async fn get_quiz_log(db: &Database, family_id: &str) -> Result<Vec<QuizLogEntry>, StoreError> {
    let rows = sqlx::query_as::<_, QuizLogEntry>(
        r#"SELECT * FROM "quiz_log" WHERE "family_id" = ? ORDER BY "created_at" ASC"#,
    )
    .bind(family_id)
    .fetch_all(db.pool())
    .await?;
    Ok(rows)
}
