mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{content::ContentSubcommand, settings::SettingsSubcommand, user::UserSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ontdek",
    about = "Ontdek Polen content backend: ranked destinations, guides, pages and highlights",
    version,
    propagate_version = true
)]
struct Cli {
    /// Site root (default: nearest directory with ontdek.yaml)
    #[arg(long, global = true, env = "ONTDEK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ontdek.yaml and the database in the site root
    Init {
        /// Site name written to ontdek.yaml and the site settings
        #[arg(long)]
        site_name: Option<String>,
    },

    /// Run the JSON API server
    Serve {
        /// Port to listen on (default: server.port from ontdek.yaml)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage ranked content entries
    Content {
        #[command(subcommand)]
        subcommand: ContentSubcommand,
    },

    /// Show or change site settings
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommand,
    },

    /// Manage editor accounts
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { site_name } => cmd::init::run(&root, site_name.as_deref(), cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Content { subcommand } => cmd::content::run(&root, subcommand, cli.json),
        Commands::Settings { subcommand } => cmd::settings::run(&root, subcommand, cli.json),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
