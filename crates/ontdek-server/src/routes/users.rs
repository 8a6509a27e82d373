use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use ontdek_core::user::{self, NewUser, User, UserPatch};

use super::content::ListQuery;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(app): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let db = app.db.clone();
    let users = tokio::task::spawn_blocking(move || user::list(&db, query.include_deleted))
        .await
        .map_err(AppError::join)??;
    Ok(Json(users))
}

/// POST /api/users
pub async fn create_user(
    State(app): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(body) = body?;
    let db = app.db.clone();
    let created = tokio::task::spawn_blocking(move || user::create(&db, body))
        .await
        .map_err(AppError::join)??;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let db = app.db.clone();
    let found = tokio::task::spawn_blocking(move || user::get(&db, id))
        .await
        .map_err(AppError::join)??;
    Ok(Json(found))
}

/// PATCH /api/users/:id
pub async fn update_user(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    patch: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(patch) = patch?;
    let db = app.db.clone();
    let updated = tokio::task::spawn_blocking(move || user::update(&db, id, patch))
        .await
        .map_err(AppError::join)??;
    Ok(Json(updated))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(app): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let db = app.db.clone();
    let deleted = tokio::task::spawn_blocking(move || user::soft_delete(&db, id))
        .await
        .map_err(AppError::join)??;
    Ok(Json(deleted))
}
