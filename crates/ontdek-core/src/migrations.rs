use crate::error::Result;
use crate::types::Collection;
use rusqlite::Connection;

/// Ordered schema migrations. Index `i` upgrades from `user_version == i`
/// to `i + 1`.
const MIGRATIONS: &[fn(&Connection) -> Result<()>] = &[v1_initial_schema];

/// Current schema version after all migrations have run.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Run any pending schema migrations, each in its own transaction.
///
/// The applied version is tracked in `PRAGMA user_version`.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let mut version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    while (version as usize) < MIGRATIONS.len() {
        let tx = conn.transaction()?;
        MIGRATIONS[version as usize](&tx)?;
        tx.pragma_update(None, "user_version", version + 1)?;
        tx.commit()?;
        version += 1;
        tracing::info!(version, "applied schema migration");
    }
    Ok(version)
}

fn v1_initial_schema(conn: &Connection) -> Result<()> {
    for collection in Collection::ALL {
        let table = collection.table();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                slug           TEXT NOT NULL UNIQUE,
                title          TEXT NOT NULL,
                summary        TEXT,
                body           TEXT,
                image_url      TEXT,
                destination_id INTEGER,
                published      INTEGER NOT NULL DEFAULT 0,
                ranking        INTEGER NOT NULL DEFAULT 0,
                is_deleted     INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_active_ranking
                ON {table} (is_deleted, ranking);"
        ))?;
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            email        TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            role         TEXT NOT NULL,
            is_deleted   INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS site_settings (
            id         INTEGER PRIMARY KEY CHECK (id = 1),
            data       TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )?;
    Ok(())
}
