use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::require_family;
use crate::db::operations::families;
use crate::db::operations::StoreError;
use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pin: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    token: String,
    pin: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FamilyResponse {
    family_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InviteResponse {
    invite_token: String,
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let pin = body.pin.trim();
    if pin.is_empty() {
        return AppError::bad_request("请输入口令").into_response();
    }

    match families::get_family_by_pin(state.db(), pin).await {
        Ok(Some(family)) => ok(FamilyResponse { family_id: family.id }),
        Ok(None) => AppError::unauthorized("口令不对哦，再试试").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "family login query failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}

/// Self-registration through an existing family's invite token.
pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> Response {
    let pin = body.pin.trim();
    if pin.is_empty() {
        return AppError::bad_request("请输入口令").into_response();
    }

    let inviter = match families::get_family_by_invite_token(state.db(), body.token.trim()).await {
        Ok(inviter) => inviter,
        Err(err) => {
            tracing::warn!(error = %err, "invite token query failed");
            return AppError::internal("服务器内部错误").into_response();
        }
    };
    if inviter.is_none() {
        return AppError::bad_request("邀请链接无效").into_response();
    }

    match families::create_family(state.db(), pin).await {
        Ok(family) => ok(FamilyResponse { family_id: family.id }),
        Err(StoreError::Conflict(_)) => {
            AppError::conflict("该口令已被使用，请换一个").into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "family create failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}

pub async fn invite(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    ok(InviteResponse {
        invite_token: family.invite_token,
    })
}
