//! Book -> workspace membership resolution.

use std::collections::{BTreeSet, HashMap};

use folio_db::queries::workspaces;
use folio_db::Db;
use folio_types::{BookId, Workspace, WorkspaceId};

use crate::{require_book_id, CatalogError, Result};

/// Resolves which workspaces books belong to, reading the current edges on
/// every call.
#[derive(Clone, Debug)]
pub struct WorkspaceMembershipIndex {
    db: Db,
}

impl WorkspaceMembershipIndex {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Workspace ids of every requested book, resolved in one query.
    ///
    /// Books without an edge map to an empty set.
    pub fn resolve_memberships(&self, book_ids: &[BookId]) -> Result<HashMap<BookId, BTreeSet<WorkspaceId>>> {
        let mut ids: Vec<BookId> = book_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut resolved: HashMap<BookId, BTreeSet<WorkspaceId>> =
            ids.iter().map(|&id| (id, BTreeSet::new())).collect();
        if ids.is_empty() {
            return Ok(resolved);
        }

        let edges = self
            .db
            .with_conn(|conn| workspaces::memberships_for_books(conn, &ids))?;
        for edge in edges {
            resolved
                .entry(edge.book_id)
                .or_default()
                .insert(edge.workspace_id);
        }
        tracing::debug!(books = ids.len(), "resolved workspace memberships");
        Ok(resolved)
    }

    /// Display names of workspaces. Unknown ids are absent from the map.
    pub fn workspace_names(&self, workspace_ids: &[WorkspaceId]) -> Result<HashMap<WorkspaceId, String>> {
        Ok(self
            .db
            .with_conn(|conn| workspaces::names_by_ids(conn, workspace_ids))?)
    }

    /// All workspaces.
    pub fn workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(self.db.with_conn(|conn| workspaces::list(conn))?)
    }

    /// Create a workspace.
    pub fn create_workspace(&self, name: &str, now: u64) -> Result<WorkspaceId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidParameter(
                "workspace name must not be empty".to_string(),
            ));
        }
        let workspace_id = self
            .db
            .with_conn(|conn| workspaces::create(conn, name, now))
            .map_err(CatalogError::write)?;
        tracing::info!(workspace_id, name, "workspace created");
        Ok(workspace_id)
    }

    /// Put a book into a workspace. Returns false when it was already there.
    pub fn add_book(&self, book_id: BookId, workspace_id: WorkspaceId, now: u64) -> Result<bool> {
        require_book_id(book_id)?;
        self.db
            .with_conn(|conn| workspaces::add_book(conn, book_id, workspace_id, now))
            .map_err(CatalogError::write)
    }

    /// Take a book out of a workspace.
    pub fn remove_book(&self, book_id: BookId, workspace_id: WorkspaceId) -> Result<()> {
        self.db
            .with_conn(|conn| workspaces::remove_book(conn, book_id, workspace_id))
            .map_err(CatalogError::write)
    }

    /// Replace a book's workspace set atomically.
    pub fn assign(&self, book_id: BookId, workspace_ids: &[WorkspaceId], now: u64) -> Result<()> {
        require_book_id(book_id)?;
        self.db
            .with_conn(|conn| workspaces::replace_for_book(conn, book_id, workspace_ids, now))
            .map_err(|source| {
                tracing::error!(book_id, error = %source, "workspace assignment failed");
                CatalogError::Transaction { book_id, source }
            })?;
        tracing::info!(book_id, workspaces = ?workspace_ids, "workspaces assigned");
        Ok(())
    }

    pub fn workspace_ids_for_book(&self, book_id: BookId) -> Result<Vec<WorkspaceId>> {
        Ok(self
            .db
            .with_conn(|conn| workspaces::workspace_ids_for_book(conn, book_id))?)
    }

    pub fn book_ids_for_workspace(&self, workspace_id: WorkspaceId) -> Result<Vec<BookId>> {
        Ok(self
            .db
            .with_conn(|conn| workspaces::book_ids_for_workspace(conn, workspace_id))?)
    }

    /// Drop all workspace edges of a deleted book.
    pub fn delete_by_book_id(&self, book_id: BookId) -> Result<usize> {
        self.db
            .with_conn(|conn| workspaces::delete_by_book(conn, book_id))
            .map_err(CatalogError::write)
    }
}
