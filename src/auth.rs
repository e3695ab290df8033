//! Family resolution. There is no real authentication: a family logs in
//! with its shared PIN, and subsequent requests carry the family id in
//! the `X-Family-Id` header. Family scoping of every store query is the
//! sole isolation mechanism.

use axum::http::HeaderMap;

use crate::db::operations::families::{self, Family};
use crate::db::Database;
use crate::response::AppError;

pub const FAMILY_HEADER: &str = "x-family-id";

pub fn extract_family_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FAMILY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves and verifies the requesting family, or produces the error
/// response the handler should return.
pub async fn require_family(db: &Database, headers: &HeaderMap) -> Result<Family, AppError> {
    let Some(family_id) = extract_family_id(headers) else {
        return Err(AppError::unauthorized("未提供家庭标识"));
    };

    match families::get_family_by_id(db, &family_id).await {
        Ok(Some(family)) => Ok(family),
        Ok(None) => Err(AppError::unauthorized("家庭不存在，请重新登录")),
        Err(err) => {
            tracing::warn!(error = %err, "family lookup failed");
            Err(AppError::internal("服务器内部错误"))
        }
    }
}
