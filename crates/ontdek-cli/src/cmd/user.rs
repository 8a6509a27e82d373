use crate::output::{print_json, print_table};
use clap::Subcommand;
use ontdek_core::{
    types::Role,
    user::{self, NewUser},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// List users
    List {
        #[arg(long)]
        include_deleted: bool,
    },
    /// Add a user
    Add {
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// admin | editor | viewer
        #[arg(long, default_value = "editor")]
        role: String,
    },
    /// Soft-delete a user
    Remove { id: i64 },
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    let db = super::open_database(root)?;
    match subcmd {
        UserSubcommand::List { include_deleted } => {
            let users = user::list(&db, include_deleted)?;
            if json {
                return print_json(&users);
            }
            if users.is_empty() {
                println!("No users.");
                return Ok(());
            }
            let rows = users
                .iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.email.clone(),
                        u.display_name.clone(),
                        u.role.to_string(),
                        if u.is_deleted { "deleted" } else { "" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "EMAIL", "NAME", "ROLE", ""], rows);
            Ok(())
        }
        UserSubcommand::Add { email, name, role } => {
            let role: Role = role.parse()?;
            let created = user::create(
                &db,
                NewUser {
                    email,
                    display_name: name,
                    role,
                },
            )?;
            if json {
                return print_json(&created);
            }
            println!("Added {} #{} ({})", created.email, created.id, created.role);
            Ok(())
        }
        UserSubcommand::Remove { id } => {
            let removed = user::soft_delete(&db, id)?;
            if json {
                return print_json(&removed);
            }
            println!("Removed {} #{id}", removed.email);
            Ok(())
        }
    }
}
