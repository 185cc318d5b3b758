//! folio: command-line access to the Folio catalog core.
//!
//! Opens the catalog database, wires the core components together and runs
//! one operation per invocation, printing the result as JSON on stdout.
//! Logs go to stderr.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use folio_catalog::{
    BookLabelAssociation, HomeFeedAggregator, LabelStore, SqliteCatalog, WorkspaceMembershipIndex,
};
use folio_db::Db;

use crate::commands::Command;
use crate::config::FolioConfig;

/// Command-line arguments for folio
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Catalog, home feed and label management for Folio")]
#[command(version)]
struct Args {
    /// Config file; defaults to $FOLIO_DATA_DIR/config.toml
    #[arg(short, long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Database file; defaults to <data_dir>/folio.db
    #[arg(long, env = "FOLIO_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// The wired catalog components.
pub struct Services {
    pub config: FolioConfig,
    pub catalog: Arc<SqliteCatalog>,
    pub memberships: WorkspaceMembershipIndex,
    pub feed: HomeFeedAggregator,
    pub labels: LabelStore,
    pub book_labels: BookLabelAssociation,
}

impl Services {
    fn new(db: Db, config: FolioConfig) -> Self {
        let catalog = Arc::new(SqliteCatalog::new(db.clone()));
        let memberships = WorkspaceMembershipIndex::new(db.clone());
        let feed = HomeFeedAggregator::new(
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
            memberships.clone(),
            config.feed.options,
        );
        let labels = LabelStore::new(db.clone(), config.labels);
        let book_labels = BookLabelAssociation::new(db, labels.clone(), catalog.clone(), catalog.clone());
        Self {
            config,
            catalog,
            memberships,
            feed,
            labels,
            book_labels,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Load config
    let config = FolioConfig::load(args.config.as_deref())?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("folio={}", config.logging.log_level).parse()?),
        )
        .init();

    // 3. Open database
    let db_path = match args.db {
        Some(path) => path,
        None => {
            let data_dir = config.data_dir();
            std::fs::create_dir_all(&data_dir)?;
            data_dir.join("folio.db")
        }
    };
    info!("Opening catalog database {:?}", db_path);
    let db = Db::open(&db_path)?;

    // 4. Run the command
    let services = Services::new(db, config);
    let output = commands::run(&services, args.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
