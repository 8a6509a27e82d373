use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{CmsError, Result};

pub const DEFAULT_SITE_NAME: &str = "Ontdek Polen";

/// Site-wide settings. Stored as a single JSON row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub site_name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub footer_text: Option<String>,
    #[serde(default, skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            tagline: None,
            contact_email: None,
            hero_image_url: None,
            footer_text: None,
            updated_at: None,
        }
    }
}

impl SiteSettings {
    fn validate(&self) -> Result<()> {
        if self.site_name.trim().is_empty() {
            return Err(CmsError::InvalidField("site_name must not be empty".into()));
        }
        if let Some(email) = &self.contact_email {
            crate::user::validate_email(email)?;
        }
        Ok(())
    }
}

/// Current settings, or the defaults if none were ever saved.
pub fn load(db: &Database) -> Result<SiteSettings> {
    db.with_conn(|conn| {
        let row: Option<(String, DateTime<Utc>)> = conn
            .query_row(
                "SELECT data, updated_at FROM site_settings WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((data, updated_at)) => {
                let mut settings: SiteSettings = serde_json::from_str(&data)?;
                settings.updated_at = Some(updated_at);
                Ok(settings)
            }
            None => Ok(SiteSettings::default()),
        }
    })
}

/// Replace the settings record.
pub fn save(db: &Database, settings: SiteSettings) -> Result<SiteSettings> {
    settings.validate()?;
    let now = Utc::now();
    let stored = SiteSettings {
        updated_at: None,
        ..settings
    };
    let data = serde_json::to_string(&stored)?;
    db.transaction(|tx| {
        tx.execute(
            "INSERT INTO site_settings (id, data, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![data, now],
        )?;
        Ok(())
    })?;
    tracing::info!(site_name = %stored.site_name, "saved site settings");
    Ok(SiteSettings {
        updated_at: Some(now),
        ..stored
    })
}
