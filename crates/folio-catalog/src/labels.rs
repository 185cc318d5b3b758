//! Label entities and their cached book counts.
//!
//! `book_count` is treated as a materialized view of the edge table: it is
//! recomputed whenever a label is attached or listed, never incremented.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use folio_db::queries::labels;
use folio_db::{Db, DbError};
use folio_types::label::split_label_names;
use folio_types::{Label, LabelId, Page, DEFAULT_LABEL_SEARCH_LIMIT, MAX_LABEL_NAME_LEN};

use crate::{page_request, CatalogError, Result};

/// Label settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOptions {
    /// Result cap for [`LabelStore::search`].
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Longest accepted label name, in characters.
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

fn default_search_limit() -> u32 {
    DEFAULT_LABEL_SEARCH_LIMIT
}

fn default_max_name_len() -> usize {
    MAX_LABEL_NAME_LEN
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            max_name_len: default_max_name_len(),
        }
    }
}

/// Owns label rows and keeps their counts in step with the edge table.
#[derive(Clone, Debug)]
pub struct LabelStore {
    db: Db,
    options: LabelOptions,
}

impl LabelStore {
    pub fn new(db: Db, options: LabelOptions) -> Self {
        Self { db, options }
    }

    pub fn options(&self) -> &LabelOptions {
        &self.options
    }

    /// Find a label by exact name, creating it with `book_count = 0` when
    /// absent. An existing label has its count recomputed and persisted.
    pub fn insert_or_attach(&self, name: &str) -> Result<Label> {
        let name = self.validate_name(name)?;
        self.db.with_conn(|conn| attach_in(conn, name))
    }

    /// Apply [`LabelStore::insert_or_attach`] to every name of a comma
    /// separated list. Each label is committed on its own; the first failure
    /// stops the batch.
    pub fn insert_or_attach_multi(&self, names: &str) -> Result<Vec<Label>> {
        tracing::info!(names, "attaching labels");
        let mut attached = Vec::new();
        for name in split_label_names(names) {
            match self.insert_or_attach(name) {
                Ok(label) => attached.push(label),
                Err(e) => {
                    tracing::error!(name, error = %e, "label batch aborted");
                    return Err(e);
                }
            }
        }
        Ok(attached)
    }

    /// Lookup by id.
    pub fn get(&self, label_id: LabelId) -> Result<Label> {
        Ok(self.db.with_conn(|conn| labels::get(conn, label_id))?)
    }

    /// Exact, case-sensitive lookup by name.
    pub fn find_exact(&self, name: &str) -> Result<Label> {
        Ok(self.db.with_conn(|conn| labels::find_by_name(conn, name.trim()))?)
    }

    /// Delete a label and every edge referencing it. Deleting a missing
    /// label succeeds.
    pub fn delete(&self, label_id: LabelId) -> Result<()> {
        if label_id <= 0 {
            return Err(CatalogError::InvalidParameter(format!(
                "label id must be positive, got {label_id}"
            )));
        }
        let (edges, existed) = self
            .db
            .with_conn(|conn| labels::delete(conn, label_id))
            .map_err(CatalogError::write)?;
        if existed {
            tracing::info!(label_id, edges, "label deleted");
        } else {
            tracing::debug!(label_id, edges, "label already absent");
        }
        Ok(())
    }

    /// Case-insensitive substring search ordered by descending `book_count`.
    /// `limit` defaults to the configured search limit.
    pub fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<Label>> {
        let limit = limit.unwrap_or(self.options.search_limit);
        Ok(self
            .db
            .with_conn(|conn| labels::search(conn, query.trim(), limit))?)
    }

    /// A page of labels ordered by descending `book_count`, each count
    /// refreshed from the edge table before returning.
    pub fn list_page(&self, page_index: u32, page_size: u32) -> Result<Page<Label>> {
        let page = page_request(page_index, page_size)?;
        self.db.with_conn(|conn| {
            let (mut items, total_count) = labels::list_page(conn, page.offset(), page.page_size)?;
            for label in &mut items {
                match labels::refresh_count(conn, label.label_id) {
                    Ok(count) => label.book_count = count,
                    Err(e) => {
                        tracing::warn!(label_id = label.label_id, error = %e, "label count refresh failed");
                    }
                }
            }
            Ok(Page { items, total_count })
        })
    }

    /// Trim and check a label name.
    pub(crate) fn validate_name<'a>(&self, name: &'a str) -> Result<&'a str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidParameter(
                "label name must not be empty".to_string(),
            ));
        }
        if name.contains(',') {
            return Err(CatalogError::InvalidParameter(format!(
                "label name '{name}' must not contain ','"
            )));
        }
        if name.chars().count() > self.options.max_name_len {
            return Err(CatalogError::InvalidParameter(format!(
                "label name '{name}' exceeds {} characters",
                self.options.max_name_len
            )));
        }
        Ok(name)
    }
}

/// Insert-or-attach on a connection the caller already holds.
pub(crate) fn attach_in(conn: &Connection, name: &str) -> Result<Label> {
    match labels::find_by_name(conn, name) {
        Ok(mut label) => {
            label.book_count = labels::refresh_count(conn, label.label_id).map_err(CatalogError::write)?;
            tracing::info!(label_id = label.label_id, name, book_count = label.book_count, "label exists, count refreshed");
            Ok(label)
        }
        Err(DbError::NotFound(_)) => match labels::insert(conn, name) {
            Ok(label) => {
                tracing::info!(label_id = label.label_id, name, "label created");
                Ok(label)
            }
            Err(e) if e.is_unique_violation() => Ok(labels::find_by_name(conn, name)?),
            Err(e) => Err(CatalogError::write(e)),
        },
        Err(e) => Err(e.into()),
    }
}

/// Recompute counts for `label_ids`, logging failures. Counts heal on the
/// next read if a refresh here fails.
pub(crate) fn refresh_counts_in(conn: &Connection, label_ids: impl IntoIterator<Item = LabelId>) {
    for label_id in label_ids {
        if let Err(e) = labels::refresh_count(conn, label_id) {
            tracing::warn!(label_id, error = %e, "label count refresh failed");
        }
    }
}
