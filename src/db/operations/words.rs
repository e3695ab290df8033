use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::operations::progress::Progress;
use crate::db::operations::StoreError;
use crate::db::Database;
use crate::services::mastery::Stage;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub family_id: String,
    pub word: String,
    pub uk_phonetic: String,
    pub us_phonetic: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub id: String,
    pub word_id: String,
    pub pos: String,
    pub meaning_cn: String,
    pub meaning_en: String,
    pub example_en: String,
    pub example_cn: String,
}

/// A word joined with its owned meanings and progress row, the unit the
/// scheduler and quiz composer operate on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordWithMeanings {
    #[serde(flatten)]
    pub word: Word,
    pub meanings: Vec<Meaning>,
    pub progress: Option<Progress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeaning {
    #[serde(default)]
    pub pos: String,
    pub meaning_cn: String,
    #[serde(default)]
    pub meaning_en: String,
    #[serde(default)]
    pub example_en: String,
    #[serde(default)]
    pub example_cn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    pub word: String,
    #[serde(default)]
    pub uk_phonetic: String,
    #[serde(default)]
    pub us_phonetic: String,
    #[serde(default)]
    pub image_url: String,
    pub meanings: Vec<NewMeaning>,
}

/// Saves a word for a family. Re-saving an existing headword updates it
/// in place and replaces all meanings wholesale; the progress row is
/// created on first save only, so accumulated counts survive re-saves.
pub async fn save_word(
    db: &Database,
    family_id: &str,
    input: &NewWord,
) -> Result<Word, StoreError> {
    let now = Utc::now();
    let mut tx = db.pool().begin().await?;

    let existing_id: Option<String> =
        sqlx::query_scalar(r#"SELECT "id" FROM "words" WHERE "word" = ? AND "family_id" = ?"#)
            .bind(&input.word)
            .bind(family_id)
            .fetch_optional(&mut *tx)
            .await?;

    let word_id = match existing_id {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE "words"
                SET "uk_phonetic" = ?, "us_phonetic" = ?, "image_url" = ?
                WHERE "id" = ?
                "#,
            )
            .bind(&input.uk_phonetic)
            .bind(&input.us_phonetic)
            .bind(&input.image_url)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
            id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO "words"
                    ("id", "family_id", "word", "uk_phonetic", "us_phonetic", "image_url", "created_at")
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(family_id)
            .bind(&input.word)
            .bind(&input.uk_phonetic)
            .bind(&input.us_phonetic)
            .bind(&input.image_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            id
        }
    };

    sqlx::query(r#"DELETE FROM "meanings" WHERE "word_id" = ?"#)
        .bind(&word_id)
        .execute(&mut *tx)
        .await?;

    for meaning in &input.meanings {
        sqlx::query(
            r#"
            INSERT INTO "meanings"
                ("id", "word_id", "pos", "meaning_cn", "meaning_en", "example_en", "example_cn")
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&word_id)
        .bind(&meaning.pos)
        .bind(&meaning.meaning_cn)
        .bind(&meaning.meaning_en)
        .bind(&meaning.example_en)
        .bind(&meaning.example_cn)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO "progress" ("id", "word_id", "family_id", "stage", "next_review_at")
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT ("word_id") DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&word_id)
    .bind(family_id)
    .bind(Stage::Testing)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let word = sqlx::query_as::<_, Word>(r#"SELECT * FROM "words" WHERE "id" = ?"#)
        .bind(&word_id)
        .fetch_one(db.pool())
        .await?;
    Ok(word)
}

/// Full collection for a family, newest first, meanings and progress
/// attached.
pub async fn get_words(db: &Database, family_id: &str) -> Result<Vec<WordWithMeanings>, StoreError> {
    let words = sqlx::query_as::<_, Word>(
        r#"SELECT * FROM "words" WHERE "family_id" = ? ORDER BY "created_at" DESC"#,
    )
    .bind(family_id)
    .fetch_all(db.pool())
    .await?;

    let meanings = sqlx::query_as::<_, Meaning>(
        r#"
        SELECT "m".* FROM "meanings" "m"
        JOIN "words" "w" ON "w"."id" = "m"."word_id"
        WHERE "w"."family_id" = ?
        "#,
    )
    .bind(family_id)
    .fetch_all(db.pool())
    .await?;

    let progress_rows = sqlx::query_as::<_, Progress>(
        r#"SELECT * FROM "progress" WHERE "family_id" = ?"#,
    )
    .bind(family_id)
    .fetch_all(db.pool())
    .await?;

    let mut meanings_by_word: HashMap<String, Vec<Meaning>> = HashMap::new();
    for meaning in meanings {
        meanings_by_word
            .entry(meaning.word_id.clone())
            .or_default()
            .push(meaning);
    }
    let mut progress_by_word: HashMap<String, Progress> = progress_rows
        .into_iter()
        .map(|p| (p.word_id.clone(), p))
        .collect();

    Ok(words
        .into_iter()
        .map(|word| {
            let meanings = meanings_by_word.remove(&word.id).unwrap_or_default();
            let progress = progress_by_word.remove(&word.id);
            WordWithMeanings {
                word,
                meanings,
                progress,
            }
        })
        .collect())
}

/// Deletes a word (meanings and progress cascade). Quiz-log rows are
/// append-only ground truth and are kept.
pub async fn delete_word(db: &Database, family_id: &str, word_id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(r#"DELETE FROM "words" WHERE "id" = ? AND "family_id" = ?"#)
        .bind(word_id)
        .bind(family_id)
        .execute(db.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
