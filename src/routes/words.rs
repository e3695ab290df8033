use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::require_family;
use crate::db::operations::words as word_ops;
use crate::db::operations::StoreError;
use crate::response::{ok, AppError};
use crate::services::lookup::LookupError;
use crate::state::AppState;

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupQuery {
    word: Option<String>,
}

pub async fn list_words(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    match word_ops::get_words(state.db(), &family.id).await {
        Ok(words) => ok(words),
        Err(err) => {
            tracing::warn!(error = %err, "words list query failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}

pub async fn save_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut body): Json<word_ops::NewWord>,
) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    body.word = body.word.trim().to_lowercase();
    if body.word.is_empty() {
        return AppError::bad_request("请输入英文单词").into_response();
    }

    match word_ops::save_word(state.db(), &family.id, &body).await {
        Ok(word) => ok(word),
        Err(err) => {
            tracing::warn!(error = %err, word = %body.word, "word save failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}

pub async fn delete_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(word_id): Path<String>,
) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    match word_ops::delete_word(state.db(), &family.id, &word_id).await {
        Ok(()) => Json(MessageResponse {
            success: true,
            message: "已删除",
        })
        .into_response(),
        Err(StoreError::NotFound) => AppError::not_found("单词不存在").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "word delete failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}

/// Dictionary/translation/image lookup producing a save-ready preview.
pub async fn lookup_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LookupQuery>,
) -> Response {
    if let Err(err) = require_family(state.db(), &headers).await {
        return err.into_response();
    }

    let Some(word) = query.word.as_deref().map(str::trim).filter(|w| !w.is_empty()) else {
        return AppError::bad_request("缺少 word 参数").into_response();
    };

    match state.lookup().lookup(word).await {
        Ok(preview) => ok(preview),
        Err(LookupError::NotFound) => AppError::not_found("词典未找到该单词").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, word = %word, "dictionary lookup failed");
            AppError::bad_request("查询失败，请检查单词拼写").into_response()
        }
    }
}
