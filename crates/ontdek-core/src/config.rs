use crate::error::{CmsError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `auth.editor_token`.
pub const EDITOR_TOKEN_ENV: &str = "ONTDEK_EDITOR_TOKEN";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DB_FILE)
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared token required on mutating API requests. `None` disables the gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            site: SiteConfig {
                name: site_name.into(),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load `ontdek.yaml` from `root` and apply environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CmsError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let mut cfg: Config = serde_yaml::from_str(&data)?;
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(EDITOR_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.auth.editor_token = Some(token);
            }
        }
    }

    /// Absolute path of the SQLite database for a site rooted at `root`.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        paths::database_path(root, &self.database.path)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.site.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "site.name must not be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0: the OS will pick a free port".to_string(),
            });
        }

        if let Some(token) = &self.auth.editor_token {
            if token.len() < 16 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "auth.editor_token is only {} characters; use at least 16",
                        token.len()
                    ),
                });
            }
        }

        if self.database.busy_timeout_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "database.busy_timeout_ms is 0: concurrent writers fail immediately"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("Ontdek Polen");
        cfg.server.port = 8080;
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.site.name, "Ontdek Polen");
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.database.path, PathBuf::from("data/ontdek.db"));
    }

    #[test]
    fn load_without_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, CmsError::NotInitialized));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ontdek.yaml"),
            "version: 1\nsite:\n  name: Test\n",
        )
        .unwrap();
        let cfg: Config =
            serde_yaml::from_str(&std::fs::read_to_string(dir.path().join("ontdek.yaml")).unwrap())
                .unwrap();
        assert_eq!(cfg.server.port, 3141);
        assert_eq!(cfg.database.busy_timeout_ms, 5000);
        assert!(cfg.auth.editor_token.is_none());
    }

    #[test]
    fn database_path_is_resolved_against_root() {
        let cfg = Config::new("Test");
        assert_eq!(
            cfg.database_path(Path::new("/srv/site")),
            PathBuf::from("/srv/site/data/ontdek.db")
        );
    }

    #[test]
    fn validate_default_config_no_warnings() {
        let cfg = Config::new("Ontdek Polen");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_flags_empty_site_name_as_error() {
        let cfg = Config::new("  ");
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("site.name")));
    }

    #[test]
    fn validate_flags_short_token() {
        let mut cfg = Config::new("Ontdek Polen");
        cfg.auth.editor_token = Some("abc".into());
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("editor_token")));
    }

    #[test]
    fn token_is_not_serialized_when_absent() {
        let cfg = Config::new("Ontdek Polen");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("editor_token"));
    }
}
