mod checkins;
mod family;
mod health;
mod quiz;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/family/login", post(family::login))
        .route("/api/family/register", post(family::register))
        .route("/api/family/invite", get(family::invite))
        .route("/api/words", get(words::list_words).post(words::save_word))
        .route("/api/words/:id", axum::routing::delete(words::delete_word))
        .route("/api/words/lookup", get(words::lookup_word))
        .route("/api/quiz/words", get(quiz::quiz_words))
        .route("/api/quiz/status", get(quiz::today_status))
        .route("/api/quiz/record", post(quiz::record_quiz))
        .route("/api/quiz/mastery", post(quiz::update_mastery))
        .route(
            "/api/checkins",
            get(checkins::list_checkins).post(checkins::checkin_today),
        )
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "接口不存在").into_response()
}
