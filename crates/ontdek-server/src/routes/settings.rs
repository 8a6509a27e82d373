use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use ontdek_core::settings::{self, SiteSettings};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/settings
pub async fn get_settings(State(app): State<AppState>) -> Result<Json<SiteSettings>, AppError> {
    let db = app.db.clone();
    let current = tokio::task::spawn_blocking(move || settings::load(&db))
        .await
        .map_err(AppError::join)??;
    Ok(Json(current))
}

/// PUT /api/settings: replace the whole settings record.
pub async fn put_settings(
    State(app): State<AppState>,
    body: Result<Json<SiteSettings>, JsonRejection>,
) -> Result<Json<SiteSettings>, AppError> {
    let Json(body) = body?;
    let db = app.db.clone();
    let saved = tokio::task::spawn_blocking(move || settings::save(&db, body))
        .await
        .map_err(AppError::join)??;
    Ok(Json(saved))
}
