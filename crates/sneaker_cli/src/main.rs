//! SneakerSecure host binary.
//!
//! # Responsibility
//! - Open the store, run the one-shot legacy import, then dispatch one
//!   command against the core use cases.
//! - Print results as pretty JSON on stdout and failures on stderr.

mod cli;
mod startup;

use clap::Parser;
use cli::{CatalogCommands, Cli, Commands, CollectionCommands, DEFAULT_DB_FILE_NAME};
use log::error;
use serde_json::{json, Value};
use sneaker_core::db::open_db;
use sneaker_core::{
    core_version, init_logging, logging_status, CoreConfig, Item, MigrationReport,
    OwnershipRecord, PartialItem, RepoError, Session, SneakerService, SqliteKvStore,
};
use startup::run_startup_migration;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Everything a command handler may touch.
struct Context<'conn> {
    service: SneakerService<SqliteKvStore<'conn>>,
    session: Session,
    config: CoreConfig,
    startup_migration: Result<MigrationReport, String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    config.validate()?;
    init_logging(&config)?;

    let db_path = config
        .db_path
        .clone()
        .unwrap_or_else(|| DEFAULT_DB_FILE_NAME.into());
    let conn = open_db(&db_path)?;

    let session = if cli.admin {
        Session::admin(cli.user.clone())
    } else {
        Session::user(cli.user.clone())
    };
    let output = serve(SqliteKvStore::new(&conn), config, session, cli.command)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Startup order: import once, then serve one command.
fn serve(
    store: SqliteKvStore<'_>,
    config: CoreConfig,
    session: Session,
    command: Commands,
) -> CliResult<Value> {
    let startup_migration = run_startup_migration(&store, &config.legacy_sources());
    let ctx = Context {
        service: SneakerService::new(store, config.verification_registry()),
        session,
        config,
        startup_migration,
    };
    dispatch(&ctx, command)
}

fn dispatch(ctx: &Context<'_>, command: Commands) -> CliResult<Value> {
    match command {
        Commands::Scan { payload } => Ok(serde_json::to_value(ctx.service.scan(&payload)?)?),
        Commands::Catalog { command } => catalog_command(ctx, command),
        Commands::Collection { command } => collection_command(ctx, command),
        Commands::Verify { id } => Ok(json!({
            "id": id,
            "verified": ctx.service.is_verified(&id),
        })),
        Commands::Migrate => migrate_command(ctx),
        Commands::Status => status_command(ctx),
    }
}

fn catalog_command(ctx: &Context<'_>, command: CatalogCommands) -> CliResult<Value> {
    let catalog = ctx.service.catalog();
    match command {
        CatalogCommands::List => Ok(serde_json::to_value(catalog.list_all()?)?),
        CatalogCommands::Show { id } => {
            let item = catalog.get(&id)?.ok_or(RepoError::NotFound(id))?;
            Ok(serde_json::to_value(item)?)
        }
        CatalogCommands::Seed { file } => {
            let text = std::fs::read_to_string(&file)?;
            let records: Vec<PartialItem> = serde_json::from_str(&text)?;
            let mut inserted = Vec::new();
            let mut existing = Vec::new();
            for record in records {
                let item = if record.usable_id().is_some() {
                    record.into_item()?
                } else {
                    PartialItem {
                        id: Some(Item::generate_id()),
                        ..record
                    }
                    .into_item()?
                };
                match catalog.insert(&item) {
                    Ok(id) => inserted.push(id),
                    Err(RepoError::AlreadyExists(id)) => existing.push(id),
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(json!({ "inserted": inserted, "existing": existing }))
        }
        CatalogCommands::Edit { item_json } => {
            let item: Item = serde_json::from_str(&item_json)?;
            ctx.service.edit_item(&ctx.session, &item)?;
            Ok(serde_json::to_value(catalog.get(&item.id)?)?)
        }
        CatalogCommands::History { id, owner, date } => {
            let item = ctx.service.record_ownership(
                &ctx.session,
                &id,
                OwnershipRecord::new(owner, date),
            )?;
            Ok(serde_json::to_value(item.history)?)
        }
    }
}

fn collection_command(ctx: &Context<'_>, command: CollectionCommands) -> CliResult<Value> {
    match command {
        CollectionCommands::List => Ok(serde_json::to_value(ctx.service.my_collection()?)?),
        CollectionCommands::Show { id } => {
            let entry = ctx
                .service
                .collection()
                .get(&id)?
                .ok_or(RepoError::NotFound(id))?;
            Ok(serde_json::to_value(entry)?)
        }
        CollectionCommands::Add { id } => Ok(json!({ "id": ctx.service.claim(&id)? })),
        CollectionCommands::Remove { id } => {
            let removed = ctx.service.release(&id)?;
            Ok(json!({ "id": id, "removed": removed }))
        }
    }
}

fn migrate_command(ctx: &Context<'_>) -> CliResult<Value> {
    match &ctx.startup_migration {
        Ok(report) => Ok(json!({
            "outcome": format!("{:?}", report.outcome),
            "migrated": report.migrated,
            "skipped": report.skipped,
        })),
        Err(message) => Err(message.clone().into()),
    }
}

fn status_command(ctx: &Context<'_>) -> CliResult<Value> {
    let logging = logging_status().map(|(level, dir)| {
        json!({ "level": level, "log_dir": dir.display().to_string() })
    });
    Ok(json!({
        "version": core_version(),
        "catalog_items": ctx.service.catalog().list_all()?.len(),
        "collection_entries": ctx.service.my_collection()?.len(),
        "verified_ids": ctx.config.verification_registry().len(),
        "legacy_collection_keys": ctx.config.legacy_collection_keys,
        "legacy_item_prefix": ctx.config.legacy_item_prefix,
        "migration_completed": ctx.startup_migration.is_ok(),
        "migration_error": ctx.startup_migration.as_ref().err(),
        "session": {
            "user": ctx.session.username(),
            "admin": ctx.session.has(sneaker_core::Capability::EditCatalog),
        },
        "logging": logging,
    }))
}
