//! Book, history and workspace commands.

use clap::Subcommand;
use serde_json::{json, Value};

use folio_db::queries::books::NewBook;

use super::now;
use crate::Services;

#[derive(Subcommand, Debug)]
pub enum BookCommand {
    /// Add a book to the catalog.
    Add {
        #[arg(long)]
        title: String,
        /// URL identifier; derived from the title when omitted.
        #[arg(long)]
        identify: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        private: bool,
        #[arg(long, default_value_t = 0)]
        order: i64,
        /// Founding member, granted role 0 on the book.
        #[arg(long)]
        owner: Option<i64>,
    },
    /// Look books up by id.
    Get {
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
    },
    /// Drop a deleted book's labels and workspace edges.
    Forget {
        #[arg(long)]
        book: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Record that a member opened a book.
    Record {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        book: i64,
    },
    /// Show one history row.
    Show {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        book: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// Create a workspace.
    Create {
        #[arg(long)]
        name: String,
    },
    /// List workspaces.
    List,
    /// Replace a book's workspace set.
    Assign {
        #[arg(long)]
        book: i64,
        /// Comma separated workspace ids; empty clears.
        #[arg(long, value_delimiter = ',', default_value = "")]
        workspaces: Vec<String>,
    },
    /// Workspaces of a book, or books of a workspace.
    Show {
        #[arg(long, conflicts_with = "workspace")]
        book: Option<i64>,
        #[arg(long)]
        workspace: Option<i64>,
    },
}

pub fn run_book(services: &Services, cmd: BookCommand) -> anyhow::Result<Value> {
    match cmd {
        BookCommand::Add {
            title,
            identify,
            description,
            private,
            order,
            owner,
        } => {
            let identify = identify.unwrap_or_else(|| slug(&title));
            let book_id = services.catalog.add_book(&NewBook {
                title: &title,
                identify: &identify,
                description: description.as_deref(),
                private,
                order_index: order,
                created_at: now(),
            })?;
            if let Some(owner) = owner {
                services.catalog.grant_book_role(book_id, owner, 0)?;
            }
            Ok(json!({ "book_id": book_id }))
        }
        BookCommand::Get { ids } => {
            use folio_catalog::BookCatalogStore;
            Ok(serde_json::to_value(services.catalog.books_by_ids(&ids)?)?)
        }
        BookCommand::Forget { book } => {
            let labels = services.book_labels.delete_by_book_id(book)?;
            let workspaces = services.memberships.delete_by_book_id(book)?;
            Ok(json!({ "labels_removed": labels, "workspaces_removed": workspaces }))
        }
    }
}

pub fn run_history(services: &Services, cmd: HistoryCommand) -> anyhow::Result<Value> {
    let entry = match cmd {
        HistoryCommand::Record { member, book } => services.catalog.record_read(member, book, now())?,
        HistoryCommand::Show { member, book } => services.catalog.history_entry(member, book)?,
    };
    Ok(serde_json::to_value(entry)?)
}

pub fn run_workspace(services: &Services, cmd: WorkspaceCommand) -> anyhow::Result<Value> {
    match cmd {
        WorkspaceCommand::Create { name } => {
            let workspace_id = services.memberships.create_workspace(&name, now())?;
            Ok(json!({ "workspace_id": workspace_id }))
        }
        WorkspaceCommand::List => Ok(serde_json::to_value(services.memberships.workspaces()?)?),
        WorkspaceCommand::Assign { book, workspaces } => {
            let ids = parse_ids(&workspaces)?;
            services.memberships.assign(book, &ids, now())?;
            Ok(json!({ "book_id": book, "workspaces": ids }))
        }
        WorkspaceCommand::Show { book, workspace } => match (book, workspace) {
            (Some(book), _) => Ok(json!({
                "book_id": book,
                "workspaces": services.memberships.workspace_ids_for_book(book)?,
            })),
            (None, Some(workspace)) => Ok(json!({
                "workspace_id": workspace,
                "books": services.memberships.book_ids_for_workspace(workspace)?,
            })),
            (None, None) => anyhow::bail!("either --book or --workspace is required"),
        },
    }
}

/// Parse ids from comma separated tokens, skipping blanks.
pub(crate) fn parse_ids(tokens: &[String]) -> anyhow::Result<Vec<i64>> {
    tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<i64>()
                .map_err(|e| anyhow::anyhow!("invalid id '{t}': {e}"))
        })
        .collect()
}

fn slug(title: &str) -> String {
    let slug: String = title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    slug.split('-').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("-")
}
