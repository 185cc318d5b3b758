//! # folio-catalog
//!
//! The catalog core: which books a visitor sees on the home feed, how books
//! are grouped into workspaces, and how labels are attached to books.
//!
//! ## Modules
//!
//! - [`collaborators`]: contracts for the book catalog, reading history and
//!   role resolution that the core consumes.
//! - [`sqlite`]: SQLite-backed implementation of those contracts.
//! - [`membership`]: batched book -> workspace resolution.
//! - [`feed`]: the home feed aggregator (grouped and ranked-merge modes).
//! - [`labels`]: label entities and their derived book counts.
//! - [`book_labels`]: book <-> label edges, batch replace, reverse listing.

pub mod book_labels;
pub mod collaborators;
pub mod feed;
pub mod labels;
pub mod membership;
pub mod sqlite;

pub use book_labels::BookLabelAssociation;
pub use collaborators::{BookCatalogStore, ReadHistoryStore, RoleResolver};
pub use feed::{FeedOptions, HomeFeedAggregator};
pub use labels::{LabelOptions, LabelStore};
pub use membership::WorkspaceMembershipIndex;
pub use sqlite::SqliteCatalog;

use folio_db::DbError;
use folio_types::{BookId, PageRequest, PageRequestError};

/// Error types for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Rejected before any store access.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single-entity lookup had no match.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store could not serve a read.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] DbError),

    /// A non-transactional write failed.
    #[error("write failed: {0}")]
    Write(#[source] DbError),

    /// The atomic label replace failed and was rolled back.
    #[error("transaction failed for book {book_id}: {source}")]
    Transaction {
        book_id: BookId,
        #[source]
        source: DbError,
    },
}

impl CatalogError {
    /// Classify a write-path store error.
    pub(crate) fn write(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => CatalogError::NotFound(what),
            other => CatalogError::Write(other),
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => CatalogError::NotFound(what),
            other => CatalogError::Retrieval(other),
        }
    }
}

impl From<PageRequestError> for CatalogError {
    fn from(err: PageRequestError) -> Self {
        CatalogError::InvalidParameter(err.to_string())
    }
}

/// Convenience result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

pub(crate) fn page_request(page_index: u32, page_size: u32) -> Result<PageRequest> {
    Ok(PageRequest::new(page_index, page_size)?)
}

pub(crate) fn require_book_id(book_id: BookId) -> Result<()> {
    if book_id <= 0 {
        return Err(CatalogError::InvalidParameter(format!(
            "book id must be positive, got {book_id}"
        )));
    }
    Ok(())
}
