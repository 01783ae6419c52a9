//! Command-line surface.
//!
//! Each subcommand maps to exactly one handler in `main.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "sneakersecure.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "sneaker", version, about = "SneakerSecure local store tool")]
pub struct Cli {
    /// Store database file (overrides `db_path` from the config file).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// JSON config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Absolute directory for rolling logs.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Run as administrator (may edit the catalog).
    #[arg(long, global = true)]
    pub admin: bool,
    /// Session user name.
    #[arg(long, global = true, default_value = "local")]
    pub user: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a decoded scan payload (JSON object with at least `id`).
    Scan { payload: String },
    /// Catalog administration.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// The local user's collection.
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
    /// Check an id against the trusted registry.
    Verify { id: String },
    /// Show the result of the startup legacy import.
    Migrate,
    /// Store and runtime summary.
    Status,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    List,
    Show {
        id: String,
    },
    /// Insert items from a JSON array file; ids are generated when missing.
    Seed {
        file: PathBuf,
    },
    /// Overwrite an item with the given full JSON record.
    Edit {
        item_json: String,
    },
    /// Append an ownership record.
    History {
        id: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        date: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    List,
    Show { id: String },
    /// Claim a catalog item.
    Add { id: String },
    Remove { id: String },
}
