use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ontdek_core::config::{Config, WarnLevel};
use ontdek_core::db::Database;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub db: Database,
}

impl AppState {
    pub fn new(root: PathBuf, config: Config, db: Database) -> Self {
        Self {
            root,
            config: Arc::new(config),
            db,
        }
    }

    /// Load `ontdek.yaml` under `root` and open the configured database.
    pub fn open(root: &Path) -> ontdek_core::Result<Self> {
        let config = Config::load(root)?;
        for w in config.validate() {
            match w.level {
                WarnLevel::Error => tracing::error!("config: {}", w.message),
                WarnLevel::Warning => tracing::warn!("config: {}", w.message),
            }
        }
        let db_path = config.database_path(root);
        let db = Database::open(
            &db_path,
            Duration::from_millis(config.database.busy_timeout_ms),
        )?;
        tracing::info!(path = %db_path.display(), "database ready");
        Ok(Self::new(root.to_path_buf(), config, db))
    }

    pub fn editor_token(&self) -> Option<&str> {
        self.config.auth.editor_token.as_deref()
    }
}
