use crate::output::print_json;
use anyhow::Context;
use ontdek_core::{
    config::{Config, WarnLevel},
    io, paths,
    settings::{self, SiteSettings, DEFAULT_SITE_NAME},
};
use std::path::Path;

pub fn run(root: &Path, site_name: Option<&str>, json: bool) -> anyhow::Result<()> {
    io::ensure_dir(root).with_context(|| format!("failed to create {}", root.display()))?;

    // 1. ontdek.yaml
    let config_path = paths::config_path(root);
    let config_created = !config_path.exists();
    let config = if config_created {
        let cfg = Config::new(site_name.unwrap_or(DEFAULT_SITE_NAME));
        cfg.save(root).context("failed to write ontdek.yaml")?;
        cfg
    } else {
        Config::load(root).context("failed to read ontdek.yaml")?
    };

    // 2. Database file and schema
    let db = super::open_configured(root, &config)?;
    let schema_version = db.schema_version()?;

    // 3. Site settings, seeded once from the configured site name
    let current = settings::load(&db)?;
    let settings_created = current.updated_at.is_none();
    if settings_created {
        settings::save(
            &db,
            SiteSettings {
                site_name: config.site.name.clone(),
                ..SiteSettings::default()
            },
        )?;
    }

    let warnings = config.validate();
    let db_path = config.database_path(root);

    if json {
        return print_json(&serde_json::json!({
            "root": root,
            "config_created": config_created,
            "database": db_path,
            "schema_version": schema_version,
            "settings_created": settings_created,
            "warnings": warnings,
        }));
    }

    println!("Initializing Ontdek site in: {}", root.display());
    let status = |created: bool| if created { "created:" } else { "exists: " };
    println!("  {} {}", status(config_created), paths::CONFIG_FILE);
    println!(
        "  database: {} (schema v{schema_version})",
        db_path.display()
    );
    println!("  {} site settings", status(settings_created));
    for w in &warnings {
        let label = match w.level {
            WarnLevel::Error => "error",
            WarnLevel::Warning => "warning",
        };
        println!("  {label}: {}", w.message);
    }
    Ok(())
}
