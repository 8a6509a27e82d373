use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("not initialized: run 'ontdek init'")]
    NotInitialized,

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("{collection} item not found: {id}")]
    NotFound { collection: String, id: i64 },

    #[error("{collection} item not found for slug: {slug}")]
    SlugNotFound { collection: String, slug: String },

    #[error("invalid ranking {requested}: must be between 0 and {max}")]
    InvalidRank { requested: i64, max: i64 },

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("slug already exists in {collection}: {slug}")]
    SlugExists { collection: String, slug: String },

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("user not found: {0}")]
    UserNotFound(i64),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("invalid email: {0}")]
    InvalidEmail(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CmsError>;
