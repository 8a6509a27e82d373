use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{RankStore, RankedItem};
use crate::error::Result;
use crate::types::Collection;

/// [`RankStore`] over one collection table. Construct it from the
/// transaction the caller opened so every statement shares it.
pub struct SqliteRankStore<'a> {
    conn: &'a Connection,
    collection: Collection,
}

impl<'a> SqliteRankStore<'a> {
    pub fn new(conn: &'a Connection, collection: Collection) -> Self {
        Self { conn, collection }
    }

    fn table(&self) -> &'static str {
        self.collection.table()
    }
}

fn ranked_item(row: &Row<'_>) -> rusqlite::Result<RankedItem> {
    Ok(RankedItem {
        id: row.get(0)?,
        ranking: row.get(1)?,
        is_deleted: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl RankStore for SqliteRankStore<'_> {
    fn scope(&self) -> Collection {
        self.collection
    }

    fn get_item(&self, id: i64) -> Result<Option<RankedItem>> {
        let sql = format!(
            "SELECT id, ranking, is_deleted, created_at FROM {} WHERE id = ?1",
            self.table()
        );
        Ok(self
            .conn
            .query_row(&sql, params![id], ranked_item)
            .optional()?)
    }

    fn active_count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE is_deleted = 0", self.table());
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    fn active_items(&self) -> Result<Vec<RankedItem>> {
        let sql = format!(
            "SELECT id, ranking, is_deleted, created_at FROM {}
             WHERE is_deleted = 0
             ORDER BY ranking, created_at, id",
            self.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map([], ranked_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn update_ranking(&mut self, id: i64, ranking: i64) -> Result<()> {
        let sql = format!("UPDATE {} SET ranking = ?1 WHERE id = ?2", self.table());
        self.conn.execute(&sql, params![ranking, id])?;
        Ok(())
    }

    fn set_deleted(&mut self, id: i64, deleted: bool) -> Result<()> {
        let sql = format!("UPDATE {} SET is_deleted = ?1 WHERE id = ?2", self.table());
        self.conn.execute(&sql, params![deleted, id])?;
        Ok(())
    }

    fn shift_rankings_in_range(
        &mut self,
        low: i64,
        high: i64,
        delta: i64,
        exclude_id: i64,
    ) -> Result<usize> {
        let sql = format!(
            "UPDATE {} SET ranking = ranking + ?1
             WHERE is_deleted = 0 AND id != ?2 AND ranking BETWEEN ?3 AND ?4",
            self.table()
        );
        Ok(self
            .conn
            .execute(&sql, params![delta, exclude_id, low, high])?)
    }
}
