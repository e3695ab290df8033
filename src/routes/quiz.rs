use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::auth::require_family;
use crate::db::operations::quiz_log::{self, QuizLogDraft};
use crate::db::operations::words as word_ops;
use crate::db::operations::progress as progress_ops;
use crate::response::{ok, AppError};
use crate::services::quiz::{build_questions, Question};
use crate::services::scheduler::{
    select_quiz_words, today_quiz_done, QuizMode, SchedulerPolicy,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct QuizWordsQuery {
    #[serde(default)]
    extra: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizWordsResponse {
    words: Vec<word_ops::WordWithMeanings>,
    questions: Vec<Question>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayStatus {
    today_done: bool,
    new_count: usize,
    review_count: usize,
    total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordRequest {
    word_id: String,
    meaning_id: String,
    quiz_type: String,
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MasteryRequest {
    word_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MasteryResponse {
    promoted: u64,
}

/// Today's selection plus a composed question sequence. `?extra=1`
/// requests a voluntary extra round after the mandatory session.
pub async fn quiz_words(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QuizWordsQuery>,
) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    let mode = match query.extra.as_deref() {
        Some("1") | Some("true") => QuizMode::Extra,
        _ => QuizMode::Standard,
    };

    // Words and log history are independent reads.
    let (words, log) = match tokio::join!(
        word_ops::get_words(state.db(), &family.id),
        quiz_log::get_quiz_log(state.db(), &family.id),
    ) {
        (Ok(words), Ok(log)) => (words, log),
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(error = %err, "quiz selection reads failed");
            return AppError::internal("服务器内部错误").into_response();
        }
    };

    let now = Local::now();
    let mut rng = rand::rng();
    let selection = select_quiz_words(
        &words,
        &log,
        &now,
        mode,
        SchedulerPolicy::default(),
        &mut rng,
    );
    let questions = build_questions(&selection, &mut rng);

    ok(QuizWordsResponse {
        words: selection,
        questions,
    })
}

pub async fn today_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    let (words, log) = match tokio::join!(
        word_ops::get_words(state.db(), &family.id),
        quiz_log::get_quiz_log(state.db(), &family.id),
    ) {
        (Ok(words), Ok(log)) => (words, log),
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(error = %err, "today status reads failed");
            return AppError::internal("服务器内部错误").into_response();
        }
    };

    let quizzed: std::collections::HashSet<&str> =
        log.iter().map(|e| e.word_id.as_str()).collect();
    let review_count = words
        .iter()
        .filter(|w| quizzed.contains(w.word.id.as_str()))
        .count();

    ok(TodayStatus {
        today_done: today_quiz_done(&log, &Local::now()),
        new_count: words.len() - review_count,
        review_count,
        total: words.len(),
    })
}

/// Appends one quiz outcome to the log and bumps the cumulative counts.
pub async fn record_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RecordRequest>,
) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    if body.word_id.trim().is_empty() {
        return AppError::bad_request("缺少 wordId 参数").into_response();
    }

    let draft = QuizLogDraft {
        word_id: body.word_id.clone(),
        meaning_id: body.meaning_id.clone(),
        quiz_type: body.quiz_type.clone(),
        is_correct: body.is_correct,
    };

    let entry = match quiz_log::append_quiz_log(state.db(), &family.id, &draft).await {
        Ok(entry) => entry,
        Err(err) => {
            tracing::warn!(error = %err, "quiz log append failed");
            return AppError::internal("服务器内部错误").into_response();
        }
    };

    if let Err(err) =
        progress_ops::bump_counts(state.db(), &family.id, &body.word_id, body.is_correct).await
    {
        tracing::warn!(error = %err, "progress count update failed");
        return AppError::internal("服务器内部错误").into_response();
    }

    ok(entry)
}

/// Mastery promotion after a finished session: every attempted word at
/// the correct-count threshold flips to mastered.
pub async fn update_mastery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MasteryRequest>,
) -> Response {
    let family = match require_family(state.db(), &headers).await {
        Ok(family) => family,
        Err(err) => return err.into_response(),
    };

    match progress_ops::promote_mastered(state.db(), &family.id, &body.word_ids).await {
        Ok(promoted) => ok(MasteryResponse { promoted }),
        Err(err) => {
            tracing::warn!(error = %err, "mastery promotion failed");
            AppError::internal("服务器内部错误").into_response()
        }
    }
}
