//! Book <-> label edges.
//!
//! Two replace paths exist. [`BookLabelAssociation::replace_labels_by_names`]
//! is best effort: labels are created on demand, duplicate edges are ignored
//! and a failure part way may leave a partial set. The id-based
//! [`BookLabelAssociation::replace_labels_by_ids`] runs the delete and every
//! insert in one transaction, so readers see the old set or the new set.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use folio_db::queries::book_labels::{self, EdgeInsert};
use folio_db::Db;
use folio_types::label::{join_label_names, split_label_names};
use folio_types::{Book, BookId, Label, LabelId, MemberId, Page};

pub use folio_db::queries::book_labels::ReplaceOutcome;

use crate::collaborators::{BookCatalogStore, RoleResolver};
use crate::labels::{attach_in, refresh_counts_in, LabelStore};
use crate::{page_request, require_book_id, CatalogError, Result};

/// Owns the book <-> label edge set.
#[derive(Clone)]
pub struct BookLabelAssociation {
    db: Db,
    labels: LabelStore,
    catalog: Arc<dyn BookCatalogStore>,
    roles: Arc<dyn RoleResolver>,
}

impl BookLabelAssociation {
    pub fn new(
        db: Db,
        labels: LabelStore,
        catalog: Arc<dyn BookCatalogStore>,
        roles: Arc<dyn RoleResolver>,
    ) -> Self {
        Self {
            db,
            labels,
            catalog,
            roles,
        }
    }

    /// Labels of a book ordered by name.
    pub fn labels_for_book(&self, book_id: BookId) -> Result<Vec<Label>> {
        Ok(self
            .db
            .with_conn(|conn| book_labels::labels_for_book(conn, book_id))?)
    }

    /// Label ids of a book.
    pub fn label_ids_for_book(&self, book_id: BookId) -> Result<Vec<LabelId>> {
        Ok(self
            .db
            .with_conn(|conn| book_labels::label_ids_for_book(conn, book_id))?)
    }

    /// Label names of a book joined with commas, in name order.
    pub fn label_names_for_book(&self, book_id: BookId) -> Result<String> {
        Ok(join_label_names(&self.labels_for_book(book_id)?))
    }

    /// Replace a book's labels with the comma separated `names`, creating
    /// labels as needed.
    ///
    /// Not atomic: every name is attempted and the first failure is
    /// returned afterwards, so a failed call may leave a partial set.
    /// Callers retry with the full intended set.
    pub fn replace_labels_by_names(&self, book_id: BookId, names: &str) -> Result<Vec<Label>> {
        require_book_id(book_id)?;
        tracing::info!(book_id, names, "replacing book labels by name");

        let (attached, first_error) = self.db.with_conn(|conn| -> Result<_> {
            let conn: &rusqlite::Connection = conn;
            let previous = book_labels::label_ids_for_book(conn, book_id)?;
            book_labels::delete_by_book(conn, book_id).map_err(CatalogError::write)?;

            let mut attached: Vec<Label> = Vec::new();
            let mut first_error: Option<CatalogError> = None;
            for name in split_label_names(names) {
                let result = self
                    .labels
                    .validate_name(name)
                    .and_then(|name| attach_in(conn, name))
                    .and_then(|label| {
                        match book_labels::insert_edge(conn, book_id, label.label_id) {
                            Ok(EdgeInsert::Inserted) => Ok(Some(label)),
                            Ok(EdgeInsert::DuplicateIgnored) => {
                                tracing::debug!(book_id, label_id = label.label_id, "duplicate label edge ignored");
                                Ok(None)
                            }
                            Err(e) => Err(CatalogError::write(e)),
                        }
                    });
                match result {
                    Ok(Some(label)) => attached.push(label),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(book_id, name, error = %e, "attaching label failed");
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            let touched: BTreeSet<LabelId> = previous
                .into_iter()
                .chain(attached.iter().map(|l| l.label_id))
                .collect();
            refresh_counts_in(conn, touched);
            Ok((attached, first_error))
        })?;

        if let Some(e) = first_error {
            return Err(e);
        }
        self.with_fresh_counts(attached)
    }

    /// Replace a book's labels with `label_ids` atomically.
    ///
    /// Ids that are not positive or name no label are discarded and logged.
    /// The delete of the previous edges and every insert commit together or
    /// not at all.
    pub fn replace_labels_by_ids(&self, book_id: BookId, label_ids: &[LabelId]) -> Result<ReplaceOutcome> {
        if let Err(e) = require_book_id(book_id) {
            tracing::error!(book_id, "invalid book id for label replace");
            return Err(e);
        }
        tracing::info!(book_id, requested = label_ids.len(), "replacing book labels by id");

        let outcome = self.db.with_conn(|conn| -> Result<_> {
            let outcome = book_labels::replace_by_ids(conn, book_id, label_ids).map_err(|source| {
                tracing::error!(book_id, error = %source, "label replace rolled back");
                CatalogError::Transaction { book_id, source }
            })?;
            let touched: BTreeSet<LabelId> = outcome
                .previous
                .iter()
                .chain(&outcome.inserted)
                .copied()
                .collect();
            refresh_counts_in(conn, touched);
            Ok(outcome)
        })?;

        for label_id in &outcome.discarded {
            tracing::warn!(book_id, label_id, "ignored invalid label id");
        }
        tracing::info!(
            book_id,
            removed = outcome.previous.len(),
            inserted = outcome.inserted.len(),
            "book labels replaced"
        );
        Ok(outcome)
    }

    /// Remove every label from a book, e.g. when the book is deleted.
    pub fn delete_by_book_id(&self, book_id: BookId) -> Result<usize> {
        require_book_id(book_id)?;
        self.db.with_conn(|conn| -> Result<_> {
            let previous = book_labels::label_ids_for_book(conn, book_id)?;
            let removed = book_labels::delete_by_book(conn, book_id).map_err(CatalogError::write)?;
            refresh_counts_in(conn, previous);
            tracing::info!(book_id, removed, "book labels cleared");
            Ok(removed)
        })
    }

    /// Books carrying a label that `member_id` may see: public books always,
    /// private books only with a direct or team role. Ordered by descending
    /// order index, then descending book id.
    ///
    /// Anonymous callers are paged in SQL. For members every edge row of the
    /// label is loaded and filtered through the role resolver before paging,
    /// so the cost grows with the label's book count.
    pub fn list_books_for_label(
        &self,
        label_id: LabelId,
        page_index: u32,
        page_size: u32,
        member_id: MemberId,
    ) -> Result<Page<Book>> {
        let page = page_request(page_index, page_size)?;
        if !folio_types::is_member(member_id) {
            let (ids, total_count) = self.db.with_conn(|conn| {
                book_labels::public_labeled_book_ids(conn, label_id, page.offset(), page.page_size)
            })?;
            return Ok(Page {
                items: self.books_in_order(&ids)?,
                total_count,
            });
        }

        let rows = self
            .db
            .with_conn(|conn| book_labels::labeled_books(conn, label_id))?;

        let private: Vec<BookId> = rows
            .iter()
            .filter(|row| row.visibility.is_private())
            .map(|row| row.book_id)
            .collect();
        let viewable = if private.is_empty() {
            Default::default()
        } else {
            self.roles.viewable_books(member_id, &private)?
        };

        let visible: Vec<BookId> = rows
            .iter()
            .filter(|row| !row.visibility.is_private() || viewable.contains(&row.book_id))
            .map(|row| row.book_id)
            .collect();
        let window = &visible[page.window(visible.len())];

        Ok(Page {
            items: self.books_in_order(window)?,
            total_count: visible.len() as u64,
        })
    }

    /// Book details for `ids`, in the order given.
    fn books_in_order(&self, ids: &[BookId]) -> Result<Vec<Book>> {
        let mut by_id: HashMap<BookId, Book> = self
            .catalog
            .books_by_ids(ids)?
            .into_iter()
            .map(|book| (book.book_id, book))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Re-read attached labels so their counts include the new edges.
    fn with_fresh_counts(&self, attached: Vec<Label>) -> Result<Vec<Label>> {
        attached
            .into_iter()
            .map(|label| self.labels.get(label.label_id))
            .collect()
    }
}
