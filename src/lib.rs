pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::{Database, DbInitError};
use crate::state::AppState;

pub async fn create_app() -> Result<axum::Router, DbInitError> {
    let db = Database::from_env().await?;
    let state = AppState::new(db);

    Ok(routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
