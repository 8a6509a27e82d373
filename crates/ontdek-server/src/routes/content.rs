use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ontdek_core::content::{self, ContentEntry, EntryPatch, NewEntry};
use ontdek_core::error::CmsError;
use ontdek_core::types::Collection;

use crate::auth::Access;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

/// GET /api/:collection: entries in ranking order. Public callers only see
/// published, active entries.
pub async fn list_entries(
    State(app): State<AppState>,
    Extension(access): Extension<Access>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContentEntry>>, AppError> {
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let entries = tokio::task::spawn_blocking(move || match access {
        Access::Editor => content::list(&db, collection, query.include_deleted),
        Access::Public => content::list_published(&db, collection),
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(entries))
}

/// POST /api/:collection: create an entry. A `ranking` in the body inserts
/// it at that position; otherwise it is appended.
pub async fn create_entry(
    State(app): State<AppState>,
    Path(collection): Path<String>,
    body: Result<Json<NewEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<ContentEntry>), AppError> {
    let Json(body) = body?;
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let entry = tokio::task::spawn_blocking(move || content::create(&db, collection, body))
        .await
        .map_err(AppError::join)??;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/:collection/:id: deleted entries and drafts are editor-only.
pub async fn get_entry(
    State(app): State<AppState>,
    Extension(access): Extension<Access>,
    Path((collection, id)): Path<(String, i64)>,
) -> Result<Json<ContentEntry>, AppError> {
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let entry = tokio::task::spawn_blocking(move || content::get(&db, collection, id))
        .await
        .map_err(AppError::join)??;

    if !access.is_editor() && !entry.is_public() {
        return Err(CmsError::NotFound {
            collection: collection.to_string(),
            id,
        }
        .into());
    }
    Ok(Json(entry))
}

/// GET /api/:collection/by-slug/:slug: active entry by slug. Drafts are
/// editor-only.
pub async fn get_entry_by_slug(
    State(app): State<AppState>,
    Extension(access): Extension<Access>,
    Path((collection, slug)): Path<(String, String)>,
) -> Result<Json<ContentEntry>, AppError> {
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let lookup = slug.clone();
    let entry = tokio::task::spawn_blocking(move || content::get_by_slug(&db, collection, &lookup))
        .await
        .map_err(AppError::join)??;

    if !access.is_editor() && !entry.is_public() {
        return Err(CmsError::SlugNotFound {
            collection: collection.to_string(),
            slug,
        }
        .into());
    }
    Ok(Json(entry))
}

/// PATCH /api/:collection/:id: update fields. A `ranking` in the body moves
/// the entry, shifting its siblings in the same transaction.
pub async fn update_entry(
    State(app): State<AppState>,
    Path((collection, id)): Path<(String, i64)>,
    patch: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<ContentEntry>, AppError> {
    let Json(patch) = patch?;
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let (entry, _moved) =
        tokio::task::spawn_blocking(move || content::update(&db, collection, id, patch))
            .await
            .map_err(AppError::join)??;

    Ok(Json(entry))
}

/// DELETE /api/:collection/:id: soft delete; the siblings above close the gap.
pub async fn delete_entry(
    State(app): State<AppState>,
    Path((collection, id)): Path<(String, i64)>,
) -> Result<Json<ContentEntry>, AppError> {
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let entry = tokio::task::spawn_blocking(move || content::soft_delete(&db, collection, id))
        .await
        .map_err(AppError::join)??;

    Ok(Json(entry))
}

/// POST /api/:collection/:id/restore: undo a soft delete.
pub async fn restore_entry(
    State(app): State<AppState>,
    Path((collection, id)): Path<(String, i64)>,
) -> Result<Json<ContentEntry>, AppError> {
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let entry = tokio::task::spawn_blocking(move || content::restore(&db, collection, id))
        .await
        .map_err(AppError::join)??;

    Ok(Json(entry))
}

/// POST /api/:collection/normalize: rewrite rankings to 0..N-1.
pub async fn normalize_collection(
    State(app): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let collection: Collection = collection.parse()?;
    let db = app.db.clone();
    let changed = tokio::task::spawn_blocking(move || content::normalize(&db, collection))
        .await
        .map_err(AppError::join)??;

    Ok(Json(serde_json::json!({
        "collection": collection,
        "changed": changed,
    })))
}
