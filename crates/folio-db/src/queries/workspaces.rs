//! Workspace (itemset) and book membership query functions.

use std::collections::HashMap;

use rusqlite::{Connection, TransactionBehavior};

use folio_types::{BookId, Workspace, WorkspaceId, WorkspaceMembership};

use crate::{placeholders, Result};

/// Create a workspace and return its id.
pub fn create(conn: &Connection, name: &str, created_at: u64) -> Result<WorkspaceId> {
    conn.execute(
        "INSERT INTO workspaces (name, created_at) VALUES (?1, ?2)",
        rusqlite::params![name, created_at as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List all workspaces by id.
pub fn list(conn: &Connection) -> Result<Vec<Workspace>> {
    let mut stmt =
        conn.prepare("SELECT workspace_id, name, created_at FROM workspaces ORDER BY workspace_id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Workspace {
                workspace_id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get::<_, i64>(2)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Display names for the given workspace ids. Unknown ids are absent.
pub fn names_by_ids(conn: &Connection, ids: &[WorkspaceId]) -> Result<HashMap<WorkspaceId, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT workspace_id, name FROM workspaces WHERE workspace_id IN ({})",
        placeholders(ids.len())
    ))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(ids), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

/// Add a book to a workspace. Returns false when the edge already existed.
pub fn add_book(conn: &Connection, book_id: BookId, workspace_id: WorkspaceId, created_at: u64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO book_workspaces (book_id, workspace_id, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![book_id, workspace_id, created_at as i64],
    )?;
    Ok(inserted > 0)
}

/// Remove a book from a workspace.
pub fn remove_book(conn: &Connection, book_id: BookId, workspace_id: WorkspaceId) -> Result<()> {
    conn.execute(
        "DELETE FROM book_workspaces WHERE book_id = ?1 AND workspace_id = ?2",
        [book_id, workspace_id],
    )?;
    Ok(())
}

/// Workspaces a book belongs to.
pub fn workspace_ids_for_book(conn: &Connection, book_id: BookId) -> Result<Vec<WorkspaceId>> {
    let mut stmt = conn.prepare(
        "SELECT workspace_id FROM book_workspaces WHERE book_id = ?1 ORDER BY relationship_id",
    )?;
    let rows = stmt
        .query_map([book_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Books in a workspace.
pub fn book_ids_for_workspace(conn: &Connection, workspace_id: WorkspaceId) -> Result<Vec<BookId>> {
    let mut stmt = conn.prepare(
        "SELECT book_id FROM book_workspaces WHERE workspace_id = ?1 ORDER BY relationship_id",
    )?;
    let rows = stmt
        .query_map([workspace_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All membership edges of the given books in one query.
pub fn memberships_for_books(conn: &Connection, book_ids: &[BookId]) -> Result<Vec<WorkspaceMembership>> {
    if book_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT book_id, workspace_id, created_at FROM book_workspaces
         WHERE book_id IN ({}) ORDER BY relationship_id",
        placeholders(book_ids.len())
    ))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(book_ids), |row| {
            Ok(WorkspaceMembership {
                book_id: row.get(0)?,
                workspace_id: row.get(1)?,
                created_at: row.get::<_, i64>(2)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove every workspace edge of a book.
pub fn delete_by_book(conn: &Connection, book_id: BookId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM book_workspaces WHERE book_id = ?1", [book_id])?)
}

/// Replace a book's workspace set in one transaction.
pub fn replace_for_book(
    conn: &mut Connection,
    book_id: BookId,
    workspace_ids: &[WorkspaceId],
    created_at: u64,
) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM book_workspaces WHERE book_id = ?1", [book_id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO book_workspaces (book_id, workspace_id, created_at) VALUES (?1, ?2, ?3)",
        )?;
        for workspace_id in workspace_ids {
            stmt.execute(rusqlite::params![book_id, workspace_id, created_at as i64])?;
        }
    }
    tx.commit()?;
    Ok(())
}
