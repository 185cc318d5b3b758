//! Label commands.

use clap::{Args, Subcommand};
use serde_json::{json, Value};

use super::books::parse_ids;
use crate::Services;

#[derive(Subcommand, Debug)]
pub enum LabelsCommand {
    /// List labels by usage, refreshing counts.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
    },
    /// Case-insensitive substring search.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Create labels from a comma separated list, or refresh existing ones.
    Attach { names: String },
    /// Show one label by exact name.
    Show { name: String },
    /// Delete a label and its book edges.
    Delete {
        #[arg(long)]
        label: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookLabelsCommand {
    /// Labels of a book.
    Get {
        #[arg(long)]
        book: i64,
    },
    /// Replace a book's labels by name (created as needed).
    SetNames {
        #[arg(long)]
        book: i64,
        /// Comma separated names; empty clears.
        #[arg(long, default_value = "")]
        names: String,
    },
    /// Replace a book's labels by id, atomically.
    SetIds {
        #[arg(long)]
        book: i64,
        #[arg(long, value_delimiter = ',', default_value = "")]
        ids: Vec<String>,
    },
    /// Remove all labels from a book.
    Clear {
        #[arg(long)]
        book: i64,
    },
}

#[derive(Args, Debug)]
pub struct LabelBooksArgs {
    #[arg(long)]
    pub label: i64,
    /// Member id; 0 for an anonymous visitor.
    #[arg(long, default_value_t = 0)]
    pub member: i64,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 18)]
    pub page_size: u32,
}

pub fn run_labels(services: &Services, cmd: LabelsCommand) -> anyhow::Result<Value> {
    match cmd {
        LabelsCommand::List { page, page_size } => {
            Ok(serde_json::to_value(services.labels.list_page(page, page_size)?)?)
        }
        LabelsCommand::Search { query, limit } => {
            Ok(serde_json::to_value(services.labels.search(&query, limit)?)?)
        }
        LabelsCommand::Attach { names } => {
            Ok(serde_json::to_value(services.labels.insert_or_attach_multi(&names)?)?)
        }
        LabelsCommand::Show { name } => Ok(serde_json::to_value(services.labels.find_exact(&name)?)?),
        LabelsCommand::Delete { label } => {
            services.labels.delete(label)?;
            Ok(json!({ "deleted": label }))
        }
    }
}

pub fn run_book_labels(services: &Services, cmd: BookLabelsCommand) -> anyhow::Result<Value> {
    match cmd {
        BookLabelsCommand::Get { book } => Ok(json!({
            "book_id": book,
            "labels": services.book_labels.labels_for_book(book)?,
            "names": services.book_labels.label_names_for_book(book)?,
        })),
        BookLabelsCommand::SetNames { book, names } => {
            let labels = services.book_labels.replace_labels_by_names(book, &names)?;
            Ok(json!({ "book_id": book, "labels": labels }))
        }
        BookLabelsCommand::SetIds { book, ids } => {
            let outcome = services
                .book_labels
                .replace_labels_by_ids(book, &parse_ids(&ids)?)?;
            Ok(json!({ "book_id": book, "outcome": outcome }))
        }
        BookLabelsCommand::Clear { book } => {
            let removed = services.book_labels.delete_by_book_id(book)?;
            Ok(json!({ "book_id": book, "removed": removed }))
        }
    }
}

pub fn run_label_books(services: &Services, args: LabelBooksArgs) -> anyhow::Result<Value> {
    let page = services
        .book_labels
        .list_books_for_label(args.label, args.page, args.page_size, args.member)?;
    Ok(serde_json::to_value(page)?)
}
