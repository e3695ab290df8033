use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::auth::require_family;
use crate::db::operations::{checkins, quiz_log};
use crate::response::{ok, AppError};
use crate::services::scheduler::today_quiz_done;
use crate::state::AppState;

const DEFAULT_HISTORY_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub(crate) struct CheckinsQuery {
    days: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckinResponse {
    check_date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckinListResponse {
    dates: Vec<NaiveDate>,
}

/// Marks today as checked in. Requires a finished quiz first; repeating
/// the call on the same day is a no-op.
pub async fn checkin_today(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    let log = match quiz_log::get_quiz_log(state.db(), &family.id).await {
        Ok(log) => log,
        Err(err) => {
            tracing::warn!(error = %err, "quiz log query failed");
            return AppError::internal("服务器内部错误").into_response();
        }
    };

    let now = Local::now();
    if !today_quiz_done(&log, &now) {
        return AppError::bad_request("今日任务尚未完成").into_response();
    }

    let today = now.date_naive();
    match checkins::upsert_checkin(state.db(), &family.id, today).await {
        Ok(()) => ok(CheckinResponse { check_date: today }),
        Err(err) => {
            tracing::warn!(error = %err, "checkin upsert failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}

pub async fn list_checkins(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CheckinsQuery>,
) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS).clamp(1, 366);
    let since = Local::now().date_naive() - Duration::days(days - 1);

    match checkins::get_checkins(state.db(), &family.id, since).await {
        Ok(dates) => ok(CheckinListResponse { dates }),
        Err(err) => {
            tracing::warn!(error = %err, "checkin list query failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}
