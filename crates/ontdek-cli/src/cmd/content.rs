use crate::output::{or_dash, print_json, print_table};
use clap::Subcommand;
use ontdek_core::{
    content::{self, ContentEntry, NewEntry},
    types::Collection,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum ContentSubcommand {
    /// List entries in ranking order
    List {
        /// destinations | guides | pages | highlights
        collection: String,
        /// Include soft-deleted entries (listed last)
        #[arg(long)]
        include_deleted: bool,
    },
    /// Show one entry by id or slug
    Show { collection: String, entry: String },
    /// Create an entry
    Add {
        collection: String,
        #[arg(long)]
        title: String,
        /// Defaults to a slug derived from the title
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        /// Destination id (guides and highlights only)
        #[arg(long)]
        destination: Option<i64>,
        #[arg(long)]
        published: bool,
        /// Insert at position N (0-based); appends if omitted
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        at: Option<i64>,
    },
    /// Move an entry to a new 0-based position
    Move {
        collection: String,
        id: i64,
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },
    /// Soft-delete an entry
    Delete { collection: String, id: i64 },
    /// Restore a soft-deleted entry
    Restore { collection: String, id: i64 },
    /// Rewrite rankings to 0..N-1, keeping the current order
    Normalize { collection: String },
}

pub fn run(root: &Path, subcmd: ContentSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContentSubcommand::List {
            collection,
            include_deleted,
        } => list(root, &collection, include_deleted, json),
        ContentSubcommand::Show { collection, entry } => show(root, &collection, &entry, json),
        ContentSubcommand::Add {
            collection,
            title,
            slug,
            summary,
            destination,
            published,
            at,
        } => {
            let new = NewEntry {
                slug,
                summary,
                destination_id: destination,
                published,
                ranking: at,
                ..NewEntry::titled(title)
            };
            add(root, &collection, new, json)
        }
        ContentSubcommand::Move {
            collection,
            id,
            position,
        } => move_entry(root, &collection, id, position, json),
        ContentSubcommand::Delete { collection, id } => delete(root, &collection, id, json),
        ContentSubcommand::Restore { collection, id } => restore(root, &collection, id, json),
        ContentSubcommand::Normalize { collection } => normalize(root, &collection, json),
    }
}

fn list(root: &Path, collection: &str, include_deleted: bool, json: bool) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let entries = content::list(&db, collection, include_deleted)?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No {collection}.");
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|e| {
            vec![
                if e.is_deleted {
                    format!("({})", e.ranking)
                } else {
                    e.ranking.to_string()
                },
                e.id.to_string(),
                e.slug.clone(),
                e.title.clone(),
                if e.published { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["RANK", "ID", "SLUG", "TITLE", "PUBLISHED"], rows);
    Ok(())
}

fn show(root: &Path, collection: &str, entry: &str, json: bool) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let entry = match entry.parse::<i64>() {
        Ok(id) => content::get(&db, collection, id)?,
        Err(_) => content::get_by_slug(&db, collection, entry)?,
    };

    if json {
        return print_json(&entry);
    }
    print_entry(&entry);
    Ok(())
}

fn add(root: &Path, collection: &str, new: NewEntry, json: bool) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let entry = content::create(&db, collection, new)?;

    if json {
        return print_json(&entry);
    }
    println!(
        "Created {collection} #{} '{}' at position {}",
        entry.id, entry.slug, entry.ranking
    );
    Ok(())
}

fn move_entry(
    root: &Path,
    collection: &str,
    id: i64,
    position: i64,
    json: bool,
) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let outcome = content::move_to(&db, collection, id, position)?;

    if json {
        return print_json(&outcome);
    }
    if outcome.is_noop() {
        println!("{collection} #{id} is already at position {}", outcome.to);
    } else {
        println!(
            "Moved {collection} #{id}: {} -> {} ({} shifted)",
            outcome.from, outcome.to, outcome.shifted
        );
    }
    Ok(())
}

fn delete(root: &Path, collection: &str, id: i64, json: bool) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let entry = content::soft_delete(&db, collection, id)?;

    if json {
        return print_json(&entry);
    }
    println!("Deleted {collection} #{id} '{}'", entry.slug);
    Ok(())
}

fn restore(root: &Path, collection: &str, id: i64, json: bool) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let entry = content::restore(&db, collection, id)?;

    if json {
        return print_json(&entry);
    }
    println!(
        "Restored {collection} #{id} '{}' at position {}",
        entry.slug, entry.ranking
    );
    Ok(())
}

fn normalize(root: &Path, collection: &str, json: bool) -> anyhow::Result<()> {
    let collection: Collection = collection.parse()?;
    let db = super::open_database(root)?;
    let changed = content::normalize(&db, collection)?;

    if json {
        return print_json(&serde_json::json!({
            "collection": collection,
            "changed": changed,
        }));
    }
    if changed == 0 {
        println!("{collection}: rankings already dense");
    } else {
        println!("{collection}: rewrote {changed} ranking(s)");
    }
    Ok(())
}

fn print_entry(e: &ContentEntry) {
    println!("{} #{}", e.collection, e.id);
    println!("  slug:        {}", e.slug);
    println!("  title:       {}", e.title);
    println!("  ranking:     {}", e.ranking);
    println!("  published:   {}", e.published);
    println!("  deleted:     {}", e.is_deleted);
    println!("  summary:     {}", or_dash(e.summary.as_deref()));
    println!("  image:       {}", or_dash(e.image_url.as_deref()));
    if let Some(dest) = e.destination_id {
        println!("  destination: {dest}");
    }
    println!("  updated:     {}", e.updated_at.format("%Y-%m-%d %H:%M"));
}
