use crate::error::{CmsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A ranked content collection. Each one lives in its own table and keeps
/// its own independent ranking sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Destinations,
    Guides,
    Pages,
    Highlights,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Destinations,
        Collection::Guides,
        Collection::Pages,
        Collection::Highlights,
    ];

    /// Table name. Also the path segment used by the HTTP API.
    pub fn table(self) -> &'static str {
        match self {
            Collection::Destinations => "destinations",
            Collection::Guides => "guides",
            Collection::Pages => "pages",
            Collection::Highlights => "highlights",
        }
    }

    /// Whether rows of this collection may link to a destination.
    pub fn links_destination(self) -> bool {
        matches!(self, Collection::Guides | Collection::Highlights)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Collection {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self> {
        Collection::ALL
            .into_iter()
            .find(|c| c.table() == s)
            .ok_or_else(|| CmsError::UnknownCollection(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(CmsError::InvalidRole(other.to_string())),
        }
    }
}
