use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::operations::StoreError;
use crate::db::Database;

/// A family account. The PIN is the shared login secret; the invite
/// token lets a new family self-register.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub pin: String,
    pub invite_token: String,
    pub created_at: DateTime<Utc>,
}

pub async fn get_family_by_pin(db: &Database, pin: &str) -> Result<Option<Family>, StoreError> {
    let row = sqlx::query_as::<_, Family>(r#"SELECT * FROM "families" WHERE "pin" = ? LIMIT 1"#)
        .bind(pin)
        .fetch_optional(db.pool())
        .await?;
    Ok(row)
}

pub async fn get_family_by_id(db: &Database, id: &str) -> Result<Option<Family>, StoreError> {
    let row = sqlx::query_as::<_, Family>(r#"SELECT * FROM "families" WHERE "id" = ? LIMIT 1"#)
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row)
}

pub async fn get_family_by_invite_token(
    db: &Database,
    token: &str,
) -> Result<Option<Family>, StoreError> {
    let row =
        sqlx::query_as::<_, Family>(r#"SELECT * FROM "families" WHERE "invite_token" = ? LIMIT 1"#)
            .bind(token)
            .fetch_optional(db.pool())
            .await?;
    Ok(row)
}

pub async fn pin_available(db: &Database, pin: &str) -> Result<bool, StoreError> {
    Ok(get_family_by_pin(db, pin).await?.is_none())
}

/// Creates a new family with a fresh invite token. Fails with
/// [`StoreError::Conflict`] when the PIN is already taken.
pub async fn create_family(db: &Database, pin: &str) -> Result<Family, StoreError> {
    if !pin_available(db, pin).await? {
        return Err(StoreError::Conflict("该口令已被使用".to_string()));
    }

    let family = Family {
        id: Uuid::new_v4().to_string(),
        pin: pin.to_string(),
        invite_token: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO "families" ("id", "pin", "invite_token", "created_at")
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&family.id)
    .bind(&family.pin)
    .bind(&family.invite_token)
    .bind(family.created_at)
    .execute(db.pool())
    .await?;

    Ok(family)
}
