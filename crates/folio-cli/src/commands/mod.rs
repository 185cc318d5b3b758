//! Subcommand definitions and dispatch.

pub mod books;
pub mod feed;
pub mod labels;

use clap::Subcommand;
use serde_json::Value;

use crate::Services;

type Result = anyhow::Result<Value>;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database (if needed) and report the schema version.
    Init,
    /// Build a home feed page.
    Feed(feed::FeedArgs),
    /// Reading history.
    #[command(subcommand)]
    History(books::HistoryCommand),
    /// Catalog books.
    #[command(subcommand)]
    Book(books::BookCommand),
    /// Workspaces (itemsets).
    #[command(subcommand)]
    Workspace(books::WorkspaceCommand),
    /// Label entities.
    #[command(subcommand)]
    Labels(labels::LabelsCommand),
    /// Labels attached to one book.
    #[command(subcommand)]
    BookLabels(labels::BookLabelsCommand),
    /// Books carrying a label, filtered by what the member may see.
    LabelBooks(labels::LabelBooksArgs),
}

/// Run a command against the wired services.
pub fn run(services: &Services, command: Command) -> Result {
    match command {
        Command::Init => Ok(serde_json::json!({
            "schema_version": folio_db::SCHEMA_VERSION,
        })),
        Command::Feed(args) => feed::run(services, args),
        Command::History(cmd) => books::run_history(services, cmd),
        Command::Book(cmd) => books::run_book(services, cmd),
        Command::Workspace(cmd) => books::run_workspace(services, cmd),
        Command::Labels(cmd) => labels::run_labels(services, cmd),
        Command::BookLabels(cmd) => labels::run_book_labels(services, cmd),
        Command::LabelBooks(args) => labels::run_label_books(services, args),
    }
}

/// Current Unix time in seconds.
pub(crate) fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
