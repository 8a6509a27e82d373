use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{CmsError, Result};
use crate::paths;
use crate::ranking::{self, MoveOutcome, SqliteRankStore};
use crate::types::Collection;

const COLUMNS: &str = "id, slug, title, summary, body, image_url, destination_id, \
                       published, ranking, is_deleted, created_at, updated_at";

// ---------------------------------------------------------------------------
// ContentEntry
// ---------------------------------------------------------------------------

/// One row of a ranked content collection (destination, guide, page or
/// highlight).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentEntry {
    pub id: i64,
    pub collection: Collection,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub destination_id: Option<i64>,
    pub published: bool,
    pub ranking: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentEntry {
    /// Visible to anonymous readers.
    pub fn is_public(&self) -> bool {
        self.published && !self.is_deleted
    }

    fn from_row(collection: Collection, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            collection,
            slug: row.get(1)?,
            title: row.get(2)?,
            summary: row.get(3)?,
            body: row.get(4)?,
            image_url: row.get(5)?,
            destination_id: row.get(6)?,
            published: row.get(7)?,
            ranking: row.get(8)?,
            is_deleted: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

/// Fields for a new entry. Without `ranking` the entry goes to the end of
/// the order; with it, the entry is inserted at that position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEntry {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub destination_id: Option<i64>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub ranking: Option<i64>,
}

impl NewEntry {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update. Empty strings clear the optional text fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub destination_id: Option<i64>,
    #[serde(default)]
    pub unlink_destination: bool,
    #[serde(default)]
    pub published: Option<bool>,
    /// New position; handed to the ranking manager.
    #[serde(default)]
    pub ranking: Option<i64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CmsError::InvalidField("title must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

fn find(conn: &Connection, collection: Collection, id: i64) -> Result<Option<ContentEntry>> {
    let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = ?1", collection.table());
    Ok(conn
        .query_row(&sql, params![id], |row| ContentEntry::from_row(collection, row))
        .optional()?)
}

fn fetch(conn: &Connection, collection: Collection, id: i64) -> Result<ContentEntry> {
    find(conn, collection, id)?.ok_or_else(|| CmsError::NotFound {
        collection: collection.to_string(),
        id,
    })
}

fn fetch_active(conn: &Connection, collection: Collection, id: i64) -> Result<ContentEntry> {
    match find(conn, collection, id)? {
        Some(entry) if !entry.is_deleted => Ok(entry),
        _ => Err(CmsError::NotFound {
            collection: collection.to_string(),
            id,
        }),
    }
}

fn ensure_slug_free(
    conn: &Connection,
    collection: Collection,
    slug: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE slug = ?1 AND id != ?2",
        collection.table()
    );
    let taken = conn
        .query_row(&sql, params![slug, except_id.unwrap_or(-1)], |_| Ok(()))
        .optional()?
        .is_some();
    if taken {
        return Err(CmsError::SlugExists {
            collection: collection.to_string(),
            slug: slug.to_string(),
        });
    }
    Ok(())
}

fn check_destination_link(
    conn: &Connection,
    collection: Collection,
    destination_id: i64,
) -> Result<()> {
    if !collection.links_destination() {
        return Err(CmsError::InvalidField(format!(
            "{collection} cannot link to a destination"
        )));
    }
    fetch_active(conn, Collection::Destinations, destination_id).map(|_| ())
}

fn touch(conn: &Connection, collection: Collection, id: i64) -> Result<()> {
    let sql = format!("UPDATE {} SET updated_at = ?1 WHERE id = ?2", collection.table());
    conn.execute(&sql, params![Utc::now(), id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Entries in display order. Deleted entries, when included, come last.
pub fn list(db: &Database, collection: Collection, include_deleted: bool) -> Result<Vec<ContentEntry>> {
    let filter = if include_deleted {
        ""
    } else {
        "WHERE is_deleted = 0"
    };
    let sql = format!(
        "SELECT {COLUMNS} FROM {} {filter}
         ORDER BY is_deleted, ranking, created_at, id",
        collection.table()
    );
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| ContentEntry::from_row(collection, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Published, active entries in display order; what anonymous readers see.
pub fn list_published(db: &Database, collection: Collection) -> Result<Vec<ContentEntry>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM {} WHERE is_deleted = 0 AND published = 1
         ORDER BY ranking, created_at, id",
        collection.table()
    );
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| ContentEntry::from_row(collection, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Entry by id, deleted or not.
pub fn get(db: &Database, collection: Collection, id: i64) -> Result<ContentEntry> {
    db.with_conn(|conn| fetch(conn, collection, id))
}

/// Active entry by slug.
pub fn get_by_slug(db: &Database, collection: Collection, slug: &str) -> Result<ContentEntry> {
    let sql = format!(
        "SELECT {COLUMNS} FROM {} WHERE slug = ?1 AND is_deleted = 0",
        collection.table()
    );
    db.with_conn(|conn| {
        conn.query_row(&sql, params![slug], |row| ContentEntry::from_row(collection, row))
            .optional()?
            .ok_or_else(|| CmsError::SlugNotFound {
                collection: collection.to_string(),
                slug: slug.to_string(),
            })
    })
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub fn create(db: &Database, collection: Collection, new: NewEntry) -> Result<ContentEntry> {
    let title = validate_title(&new.title)?;
    let slug = match non_empty(new.slug) {
        Some(s) => s,
        None => paths::slugify(&title),
    };
    paths::validate_slug(&slug)?;

    let entry = db.transaction(|tx| {
        ensure_slug_free(tx, collection, &slug, None)?;
        if let Some(dest) = new.destination_id {
            check_destination_link(tx, collection, dest)?;
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} (slug, title, summary, body, image_url, destination_id,
                             published, ranking, is_deleted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, ?8, ?8)",
            collection.table()
        );
        tx.execute(
            &sql,
            params![
                slug,
                title,
                non_empty(new.summary),
                non_empty(new.body),
                non_empty(new.image_url),
                new.destination_id,
                new.published,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let mut store = SqliteRankStore::new(tx, collection);
        match new.ranking {
            Some(position) => ranking::insert_at(&mut store, id, position)?,
            None => ranking::append(&mut store, id)?,
        };
        fetch(tx, collection, id)
    })?;

    tracing::info!(%collection, id = entry.id, slug = %entry.slug, ranking = entry.ranking, "created entry");
    Ok(entry)
}

/// Apply `patch` to an active entry. A `ranking` in the patch is applied
/// through [`ranking::move_to`] in the same transaction as the field changes.
pub fn update(
    db: &Database,
    collection: Collection,
    id: i64,
    patch: EntryPatch,
) -> Result<(ContentEntry, Option<MoveOutcome>)> {
    let title = patch.title.as_deref().map(validate_title).transpose()?;
    let slug = non_empty(patch.slug);
    if let Some(s) = &slug {
        paths::validate_slug(s)?;
    }

    let (entry, moved) = db.transaction(|tx| {
        let current = fetch_active(tx, collection, id)?;

        if let Some(s) = &slug {
            ensure_slug_free(tx, collection, s, Some(id))?;
        }
        let destination_id = if patch.unlink_destination {
            None
        } else if let Some(dest) = patch.destination_id {
            check_destination_link(tx, collection, dest)?;
            Some(dest)
        } else {
            current.destination_id
        };

        // Empty string clears; absent keeps.
        let text = |new: Option<String>, old: Option<String>| match new {
            Some(v) => non_empty(Some(v)),
            None => old,
        };

        let sql = format!(
            "UPDATE {} SET slug = ?1, title = ?2, summary = ?3, body = ?4, image_url = ?5,
                           destination_id = ?6, published = ?7, updated_at = ?8
             WHERE id = ?9",
            collection.table()
        );
        tx.execute(
            &sql,
            params![
                slug.clone().unwrap_or(current.slug),
                title.clone().unwrap_or(current.title),
                text(patch.summary.clone(), current.summary),
                text(patch.body.clone(), current.body),
                text(patch.image_url.clone(), current.image_url),
                destination_id,
                patch.published.unwrap_or(current.published),
                Utc::now(),
                id,
            ],
        )?;

        let moved = match patch.ranking {
            Some(position) => {
                let mut store = SqliteRankStore::new(tx, collection);
                Some(ranking::move_to(&mut store, id, position)?)
            }
            None => None,
        };
        Ok((fetch(tx, collection, id)?, moved))
    })?;

    if let Some(m) = &moved {
        tracing::info!(%collection, id, from = m.from, to = m.to, shifted = m.shifted, "moved entry");
    }
    Ok((entry, moved))
}

/// Move an entry without touching its other fields.
pub fn move_to(db: &Database, collection: Collection, id: i64, position: i64) -> Result<MoveOutcome> {
    let outcome = db.transaction(|tx| {
        let mut store = SqliteRankStore::new(tx, collection);
        let outcome = ranking::move_to(&mut store, id, position)?;
        if !outcome.is_noop() {
            touch(tx, collection, id)?;
        }
        Ok(outcome)
    })?;
    tracing::info!(%collection, id, from = outcome.from, to = outcome.to, "moved entry");
    Ok(outcome)
}

/// Soft delete: flag the entry and close the gap it leaves in the order.
pub fn soft_delete(db: &Database, collection: Collection, id: i64) -> Result<ContentEntry> {
    let entry = db.transaction(|tx| {
        let mut store = SqliteRankStore::new(tx, collection);
        ranking::remove_from_order(&mut store, id)?;
        touch(tx, collection, id)?;
        fetch(tx, collection, id)
    })?;
    tracing::info!(%collection, id, frozen_ranking = entry.ranking, "soft-deleted entry");
    Ok(entry)
}

/// Undo a soft delete. The entry returns near its old position.
pub fn restore(db: &Database, collection: Collection, id: i64) -> Result<ContentEntry> {
    let entry = db.transaction(|tx| {
        let was_deleted = fetch(tx, collection, id)?.is_deleted;
        let mut store = SqliteRankStore::new(tx, collection);
        ranking::restore(&mut store, id)?;
        if was_deleted {
            touch(tx, collection, id)?;
        }
        fetch(tx, collection, id)
    })?;
    tracing::info!(%collection, id, ranking = entry.ranking, "restored entry");
    Ok(entry)
}

/// Repair a collection whose rankings have gaps or duplicates.
pub fn normalize(db: &Database, collection: Collection) -> Result<usize> {
    db.transaction(|tx| {
        let mut store = SqliteRankStore::new(tx, collection);
        ranking::normalize(&mut store)
    })
}

/// Whether the active rankings of `collection` are exactly `0..N`.
pub fn is_dense(db: &Database, collection: Collection) -> Result<bool> {
    db.with_conn(|conn| {
        let store = SqliteRankStore::new(conn, collection);
        Ok(ranking::is_dense(&ranking::RankStore::active_items(&store)?))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
