use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{CmsError, Result};
use crate::types::Role;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let role: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            display_name: row.get(2)?,
            role: role.parse::<Role>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            is_deleted: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Editor
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

const COLUMNS: &str = "id, email, display_name, role, is_deleted, created_at, updated_at";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Minimal shape check: one `@` with something on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(CmsError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

fn fetch(conn: &Connection, id: i64) -> Result<User> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        User::from_row,
    )
    .optional()?
    .ok_or(CmsError::UserNotFound(id))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn list(db: &Database, include_deleted: bool) -> Result<Vec<User>> {
    let filter = if include_deleted {
        ""
    } else {
        "WHERE is_deleted = 0"
    };
    let sql = format!("SELECT {COLUMNS} FROM users {filter} ORDER BY email");
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map([], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    })
}

pub fn get(db: &Database, id: i64) -> Result<User> {
    db.with_conn(|conn| fetch(conn, id))
}

pub fn create(db: &Database, new: NewUser) -> Result<User> {
    let email = new.email.trim().to_lowercase();
    validate_email(&email)?;
    let display_name = new.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(CmsError::InvalidField("display_name must not be empty".into()));
    }

    let user = db.transaction(|tx| {
        let exists = tx
            .query_row("SELECT 1 FROM users WHERE email = ?1", params![email], |_| Ok(()))
            .optional()?
            .is_some();
        if exists {
            return Err(CmsError::UserExists(email.clone()));
        }
        let now = Utc::now();
        tx.execute(
            "INSERT INTO users (email, display_name, role, is_deleted, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![email, display_name, new.role.as_str(), now],
        )?;
        fetch(tx, tx.last_insert_rowid())
    })?;
    tracing::info!(id = user.id, email = %user.email, role = %user.role, "created user");
    Ok(user)
}

pub fn update(db: &Database, id: i64, patch: UserPatch) -> Result<User> {
    let display_name = match patch.display_name {
        Some(name) if name.trim().is_empty() => {
            return Err(CmsError::InvalidField("display_name must not be empty".into()))
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };
    db.transaction(|tx| {
        let current = fetch(tx, id)?;
        if current.is_deleted {
            return Err(CmsError::UserNotFound(id));
        }
        tx.execute(
            "UPDATE users SET display_name = ?1, role = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                display_name.unwrap_or(current.display_name),
                patch.role.unwrap_or(current.role).as_str(),
                Utc::now(),
                id,
            ],
        )?;
        fetch(tx, id)
    })
}

pub fn soft_delete(db: &Database, id: i64) -> Result<User> {
    let user = db.transaction(|tx| {
        let current = fetch(tx, id)?;
        if current.is_deleted {
            return Err(CmsError::UserNotFound(id));
        }
        tx.execute(
            "UPDATE users SET is_deleted = 1, updated_at = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )?;
        fetch(tx, id)
    })?;
    tracing::info!(id, email = %user.email, "deleted user");
    Ok(user)
}
