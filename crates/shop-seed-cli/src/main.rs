use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use shop_seed_core::{Collection, SeedConfig, StaticDataset};
use shop_seed_pipeline::{HttpDownloader, Seeder, StoreExecutor};
use shop_seed_store_sqlite::SqliteStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";
const COLLECTIONS: [Collection; 2] = [Collection::Orders, Collection::Reviews];

#[derive(Debug, Parser)]
#[command(name = "shop-seed")]
#[command(about = "Seed the demo shop database")]
struct Cli {
    #[arg(long, default_value = "./shop_seed.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Populate the database from a configuration and a static dataset.
    Run(RunArgs),
    /// Load and check a configuration and dataset without touching the database.
    Validate(InputArgs),
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    #[arg(long, default_value = "config/default.yml")]
    config: PathBuf,
    #[arg(long, default_value = "data/static")]
    data: PathBuf,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Seed for random prices, quantities, fake users and payment ids.
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    SchemaVersion,
    Migrate(DbMigrateArgs),
    IntegrityCheck,
    Counts,
    Documents(DbDocumentsArgs),
}

#[derive(Debug, Args)]
struct DbMigrateArgs {
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct DbDocumentsArgs {
    #[arg(long, value_parser = parse_collection)]
    collection: Collection,
}

fn parse_collection(value: &str) -> Result<Collection, String> {
    Collection::parse(value).ok_or_else(|| format!("unknown collection `{value}`"))
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_seed(&cli.db, &args).await,
        Command::Validate(args) => run_validate(&args),
        Command::Db { command } => {
            let mut store = SqliteStore::open(&cli.db)?;
            run_db(command, &mut store)
        }
    }
}

fn load_inputs(args: &InputArgs) -> Result<(SeedConfig, StaticDataset)> {
    let config = SeedConfig::load(&args.config)?;
    let dataset = StaticDataset::load(&args.data)?;
    Ok((config, dataset))
}

async fn run_seed(db: &Path, args: &RunArgs) -> Result<()> {
    let (config, dataset) = load_inputs(&args.input)?;

    let mut store = SqliteStore::open(db)?;
    store.migrate()?;
    let executor = Arc::new(StoreExecutor::new(store));
    let downloader = Arc::new(HttpDownloader::new().context("failed to build download client")?);

    let mut seeder = Seeder::new(executor.clone(), downloader);
    if let Some(seed) = args.rng_seed {
        seeder = seeder.with_rng_seed(seed);
    }
    let report = seeder.run(&config, &dataset).await?;

    let counts = executor.run(|store| store.counts()).await?;
    let mut documents = serde_json::Map::new();
    for collection in COLLECTIONS {
        let count = executor.run(move |store| store.document_count(collection)).await?;
        documents.insert(collection.as_str().to_string(), Value::from(count));
    }

    emit_json(serde_json::json!({
        "report": report,
        "counts": counts,
        "documents": documents
    }))
}

fn run_validate(args: &InputArgs) -> Result<()> {
    let (config, dataset) = load_inputs(args)?;
    emit_json(serde_json::json!({
        "application": config.application.name,
        "products": config.products.len(),
        "memories": config.memories.len(),
        "security_questions": dataset.security_questions.len(),
        "users": dataset.users.len(),
        "challenges": dataset.challenges.len(),
        "deliveries": dataset.deliveries.len()
    }))
}

fn run_db(command: DbCommand, store: &mut SqliteStore) -> Result<()> {
    match command {
        DbCommand::SchemaVersion => run_db_schema_version(store),
        DbCommand::Migrate(args) => run_db_migrate(&args, store),
        DbCommand::IntegrityCheck => run_db_integrity_check(store),
        DbCommand::Counts => run_db_counts(store),
        DbCommand::Documents(args) => run_db_documents(&args, store),
    }
}

fn run_db_schema_version(store: &SqliteStore) -> Result<()> {
    let status = store.schema_status()?;
    emit_json(serde_json::json!({
        "current_version": status.current_version,
        "target_version": status.target_version,
        "pending_versions": status.pending_versions,
        "up_to_date": status.pending_versions.is_empty()
    }))
}

fn run_db_migrate(args: &DbMigrateArgs, store: &mut SqliteStore) -> Result<()> {
    let before = store.schema_status()?;
    if args.dry_run {
        return emit_json(serde_json::json!({
            "dry_run": true,
            "current_version": before.current_version,
            "target_version": before.target_version,
            "would_apply_versions": before.pending_versions
        }));
    }

    store.migrate()?;
    let after = store.schema_status()?;
    emit_json(serde_json::json!({
        "dry_run": false,
        "before_version": before.current_version,
        "applied_versions": before.pending_versions,
        "after_version": after.current_version,
        "target_version": after.target_version,
        "up_to_date": after.pending_versions.is_empty()
    }))
}

fn run_db_integrity_check(store: &SqliteStore) -> Result<()> {
    let report = store.integrity_check()?;
    let healthy = report.quick_check_ok && report.foreign_key_violations.is_empty();
    emit_json(serde_json::to_value(&report).context("failed to serialize integrity report")?)?;
    if healthy {
        Ok(())
    } else {
        Err(anyhow!("integrity check failed"))
    }
}

fn run_db_counts(store: &SqliteStore) -> Result<()> {
    let counts = store.counts()?;
    emit_json(serde_json::json!({ "counts": counts }))
}

fn run_db_documents(args: &DbDocumentsArgs, store: &SqliteStore) -> Result<()> {
    let documents = store.documents(args.collection)?;
    emit_json(serde_json::json!({
        "collection": args.collection.as_str(),
        "documents": documents
    }))
}
