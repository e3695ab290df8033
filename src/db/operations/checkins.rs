use chrono::{NaiveDate, Utc};

use crate::db::operations::StoreError;
use crate::db::Database;

/// Idempotent daily checkin mark, keyed on (family, calendar day).
pub async fn upsert_checkin(
    db: &Database,
    family_id: &str,
    check_date: NaiveDate,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO "checkins" ("family_id", "check_date", "created_at")
        VALUES (?, ?, ?)
        ON CONFLICT ("family_id", "check_date") DO NOTHING
        "#,
    )
    .bind(family_id)
    .bind(check_date)
    .bind(Utc::now())
    .execute(db.pool())
    .await?;
    Ok(())
}

/// Checkin dates on or after the cutoff, newest first.
pub async fn get_checkins(
    db: &Database,
    family_id: &str,
    since: NaiveDate,
) -> Result<Vec<NaiveDate>, StoreError> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT "check_date" FROM "checkins"
        WHERE "family_id" = ? AND "check_date" >= ?
        ORDER BY "check_date" DESC
        "#,
    )
    .bind(family_id)
    .bind(since)
    .fetch_all(db.pool())
    .await?;
    Ok(dates)
}
