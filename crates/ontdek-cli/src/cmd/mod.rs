pub mod content;
pub mod init;
pub mod serve;
pub mod settings;
pub mod user;

use anyhow::Context;
use ontdek_core::{config::Config, db::Database};
use std::path::Path;
use std::time::Duration;

/// Open the database of an initialized site.
pub fn open_database(root: &Path) -> anyhow::Result<Database> {
    let config = Config::load(root)?;
    open_configured(root, &config)
}

pub fn open_configured(root: &Path, config: &Config) -> anyhow::Result<Database> {
    let path = config.database_path(root);
    Database::open(
        &path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )
    .with_context(|| format!("failed to open database {}", path.display()))
}
