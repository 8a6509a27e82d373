use crate::output::{or_dash, print_json};
use clap::Subcommand;
use ontdek_core::settings::{self, SiteSettings};
use std::path::Path;

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Print the current site settings
    Show,
    /// Change one or more settings; an empty value clears an optional field
    Set {
        #[arg(long)]
        site_name: Option<String>,
        #[arg(long)]
        tagline: Option<String>,
        #[arg(long)]
        contact_email: Option<String>,
        #[arg(long)]
        hero_image_url: Option<String>,
        #[arg(long)]
        footer_text: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: SettingsSubcommand, json: bool) -> anyhow::Result<()> {
    let db = super::open_database(root)?;
    match subcmd {
        SettingsSubcommand::Show => {
            let current = settings::load(&db)?;
            print_settings(&current, json)
        }
        SettingsSubcommand::Set {
            site_name,
            tagline,
            contact_email,
            hero_image_url,
            footer_text,
        } => {
            let current = settings::load(&db)?;
            let merge = |new: Option<String>, old: Option<String>| match new {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v),
                None => old,
            };
            let updated = SiteSettings {
                site_name: site_name.unwrap_or(current.site_name),
                tagline: merge(tagline, current.tagline),
                contact_email: merge(contact_email, current.contact_email),
                hero_image_url: merge(hero_image_url, current.hero_image_url),
                footer_text: merge(footer_text, current.footer_text),
                updated_at: None,
            };
            let saved = settings::save(&db, updated)?;
            print_settings(&saved, json)
        }
    }
}

fn print_settings(s: &SiteSettings, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(s);
    }
    println!("site_name:      {}", s.site_name);
    println!("tagline:        {}", or_dash(s.tagline.as_deref()));
    println!("contact_email:  {}", or_dash(s.contact_email.as_deref()));
    println!("hero_image_url: {}", or_dash(s.hero_image_url.as_deref()));
    println!("footer_text:    {}", or_dash(s.footer_text.as_deref()));
    if let Some(at) = s.updated_at {
        println!("updated:        {}", at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}
