//! Ordered collection maintenance.
//!
//! Every content collection keeps a dense, zero-based `ranking` over its
//! active rows: with `N` active rows the rankings are exactly `0..N`. The
//! functions here are the only code that writes `ranking`. They compute the
//! compensating shifts for a change and delegate the writes to a
//! [`RankStore`] bound to one collection. Callers run them inside a single
//! storage transaction so the shifts and the target update commit together.
//!
//! Deleting an item compacts the rows above it, so count-based appends never
//! collide with a surviving rank.

mod sqlite;

pub use sqlite::SqliteRankStore;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CmsError, Result};
use crate::types::Collection;

// ---------------------------------------------------------------------------
// RankedItem / RankStore
// ---------------------------------------------------------------------------

/// The ranking-relevant view of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub id: i64,
    pub ranking: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Storage operations the ranking functions need, scoped to one collection.
///
/// Implementations must run all calls made during one ranking operation in
/// one atomic transaction.
pub trait RankStore {
    fn scope(&self) -> Collection;

    fn get_item(&self, id: i64) -> Result<Option<RankedItem>>;

    fn active_count(&self) -> Result<i64>;

    /// Active rows ordered by `(ranking, created_at, id)`.
    fn active_items(&self) -> Result<Vec<RankedItem>>;

    fn update_ranking(&mut self, id: i64, ranking: i64) -> Result<()>;

    fn set_deleted(&mut self, id: i64, deleted: bool) -> Result<()>;

    /// Add `delta` to the ranking of every active row with
    /// `low <= ranking <= high`, skipping `exclude_id`. Returns the number of
    /// rows changed.
    fn shift_rankings_in_range(
        &mut self,
        low: i64,
        high: i64,
        delta: i64,
        exclude_id: i64,
    ) -> Result<usize>;
}

/// Result of [`move_to`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub id: i64,
    pub from: i64,
    pub to: i64,
    /// Number of sibling rows whose ranking changed.
    pub shifted: usize,
}

impl MoveOutcome {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn load_active<S: RankStore + ?Sized>(store: &S, id: i64) -> Result<RankedItem> {
    match store.get_item(id)? {
        Some(item) if !item.is_deleted => Ok(item),
        _ => Err(not_found(store.scope(), id)),
    }
}

fn not_found(scope: Collection, id: i64) -> CmsError {
    CmsError::NotFound {
        collection: scope.to_string(),
        id,
    }
}

/// Move an active item to `new_ranking`, shifting the siblings between the
/// old and new position by one.
///
/// `new_ranking` must lie in `0..=N-1`; anything else is rejected with
/// [`CmsError::InvalidRank`]. Moving to the current position is a no-op.
pub fn move_to<S: RankStore + ?Sized>(
    store: &mut S,
    id: i64,
    new_ranking: i64,
) -> Result<MoveOutcome> {
    let item = load_active(store, id)?;
    let count = store.active_count()?;
    let max = count - 1;
    if new_ranking < 0 || new_ranking > max {
        tracing::warn!(
            collection = %store.scope(),
            id,
            requested = new_ranking,
            max,
            "rejected out-of-range ranking"
        );
        return Err(CmsError::InvalidRank {
            requested: new_ranking,
            max,
        });
    }

    let old_ranking = item.ranking;
    if old_ranking == new_ranking {
        return Ok(MoveOutcome {
            id,
            from: old_ranking,
            to: new_ranking,
            shifted: 0,
        });
    }

    let shifted = if new_ranking < old_ranking {
        store.shift_rankings_in_range(new_ranking, old_ranking - 1, 1, id)?
    } else {
        store.shift_rankings_in_range(old_ranking + 1, new_ranking, -1, id)?
    };
    store.update_ranking(id, new_ranking)?;

    tracing::debug!(
        collection = %store.scope(),
        id,
        from = old_ranking,
        to = new_ranking,
        shifted,
        "moved item"
    );
    Ok(MoveOutcome {
        id,
        from: old_ranking,
        to: new_ranking,
        shifted,
    })
}

/// Give a freshly inserted active item the last position. Returns the
/// assigned ranking.
pub fn append<S: RankStore + ?Sized>(store: &mut S, id: i64) -> Result<i64> {
    load_active(store, id)?;
    let position = store.active_count()? - 1;
    store.update_ranking(id, position)?;
    Ok(position)
}

/// Place a freshly inserted active item at `position`, pushing the rows at
/// and after it back by one. `position` may equal the sibling count, which
/// is the same as [`append`].
pub fn insert_at<S: RankStore + ?Sized>(store: &mut S, id: i64, position: i64) -> Result<i64> {
    load_active(store, id)?;
    let siblings = store.active_count()? - 1;
    if position < 0 || position > siblings {
        return Err(CmsError::InvalidRank {
            requested: position,
            max: siblings,
        });
    }
    let shifted = store.shift_rankings_in_range(position, i64::MAX, 1, id)?;
    store.update_ranking(id, position)?;
    tracing::debug!(collection = %store.scope(), id, position, shifted, "inserted item");
    Ok(position)
}

/// Take an active item out of the order (soft delete). Its ranking is
/// frozen as-is; the rows after it move up one place.
pub fn remove_from_order<S: RankStore + ?Sized>(store: &mut S, id: i64) -> Result<RankedItem> {
    let item = load_active(store, id)?;
    store.set_deleted(id, true)?;
    let shifted = store.shift_rankings_in_range(item.ranking + 1, i64::MAX, -1, id)?;
    tracing::debug!(
        collection = %store.scope(),
        id,
        frozen = item.ranking,
        shifted,
        "removed item from order"
    );
    Ok(RankedItem {
        is_deleted: true,
        ..item
    })
}

/// Bring a soft-deleted item back. It re-enters at its frozen ranking,
/// clamped to the end of the current order, and the rows from that position
/// on move back one place. Restoring an active item changes nothing.
pub fn restore<S: RankStore + ?Sized>(store: &mut S, id: i64) -> Result<i64> {
    let item = store
        .get_item(id)?
        .ok_or_else(|| not_found(store.scope(), id))?;
    if !item.is_deleted {
        return Ok(item.ranking);
    }

    let position = item.ranking.clamp(0, store.active_count()?);
    let shifted = store.shift_rankings_in_range(position, i64::MAX, 1, id)?;
    store.update_ranking(id, position)?;
    store.set_deleted(id, false)?;
    tracing::debug!(
        collection = %store.scope(),
        id,
        frozen = item.ranking,
        position,
        shifted,
        "restored item"
    );
    Ok(position)
}

/// Rewrite the active rankings to `0..N` keeping the current order, with
/// ties broken by creation time and then id. Returns the number of rows
/// whose ranking changed.
pub fn normalize<S: RankStore + ?Sized>(store: &mut S) -> Result<usize> {
    let items = store.active_items()?;
    let mut changed = 0;
    for (position, item) in (0_i64..).zip(items.iter()) {
        if item.ranking != position {
            store.update_ranking(item.id, position)?;
            changed += 1;
        }
    }
    if changed > 0 {
        tracing::info!(collection = %store.scope(), changed, "normalized rankings");
    }
    Ok(changed)
}

/// True when `items` (active rows in display order) carry exactly the
/// rankings `0..items.len()`.
pub fn is_dense(items: &[RankedItem]) -> bool {
    (0_i64..).zip(items).all(|(i, item)| item.ranking == i)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
