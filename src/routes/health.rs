use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::response::ok;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatus {
    status: &'static str,
    uptime_seconds: u64,
}

pub async fn health(State(state): State<AppState>) -> Response {
    ok(HealthStatus {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
    })
}
