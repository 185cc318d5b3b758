//! Label query functions.

use rusqlite::{Connection, OptionalExtension, Row};

use folio_types::{Label, LabelId};

use crate::{DbError, Result};

/// Exact, case-sensitive lookup by name.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Label> {
    conn.query_row(
        "SELECT label_id, label_name, book_count FROM labels WHERE label_name = ?1",
        [name],
        label_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("label '{name}'")),
        other => DbError::Sqlite(other),
    })
}

/// Lookup by id.
pub fn get(conn: &Connection, label_id: LabelId) -> Result<Label> {
    conn.query_row(
        "SELECT label_id, label_name, book_count FROM labels WHERE label_id = ?1",
        [label_id],
        label_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("label {label_id}")),
        other => DbError::Sqlite(other),
    })
}

/// Whether a label row exists.
pub fn exists(conn: &Connection, label_id: LabelId) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM labels WHERE label_id = ?1", [label_id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Insert a new label with `book_count = 0`.
pub fn insert(conn: &Connection, name: &str) -> Result<Label> {
    conn.execute(
        "INSERT INTO labels (label_name, book_count) VALUES (?1, 0)",
        [name],
    )
    .map_err(|e| {
        if crate::is_unique_violation(&e) {
            DbError::Constraint(format!("label '{name}' already exists"))
        } else {
            DbError::Sqlite(e)
        }
    })?;
    Ok(Label {
        label_id: conn.last_insert_rowid(),
        name: name.to_string(),
        book_count: 0,
    })
}

/// Recompute and persist `book_count` from the edge table. Returns the new count.
pub fn refresh_count(conn: &Connection, label_id: LabelId) -> Result<u32> {
    conn.execute(
        "UPDATE labels SET book_count = (SELECT COUNT(*) FROM book_labels WHERE label_id = ?1)
         WHERE label_id = ?1",
        [label_id],
    )?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM book_labels WHERE label_id = ?1",
        [label_id],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

/// Remove a label's edges, then the label row. Returns the number of edges removed
/// and whether the label row existed.
///
/// The two deletes are separate statements: if the second fails the label
/// is left orphaned with a stale count, never an edge without its label.
pub fn delete(conn: &Connection, label_id: LabelId) -> Result<(usize, bool)> {
    let edges = conn.execute("DELETE FROM book_labels WHERE label_id = ?1", [label_id])?;
    let rows = conn.execute("DELETE FROM labels WHERE label_id = ?1", [label_id])?;
    Ok((edges, rows > 0))
}

/// Case-insensitive substring search, most used first.
///
/// SQLite's `lower()` only folds ASCII, so names are folded with Unicode
/// rules here while walking the labels in rank order.
pub fn search(conn: &Connection, query: &str, limit: u32) -> Result<Vec<Label>> {
    let needle = query.to_lowercase();
    let limit = limit as usize;
    let mut stmt = conn.prepare(
        "SELECT label_id, label_name, book_count FROM labels
         ORDER BY book_count DESC, label_id ASC",
    )?;
    let mut found = Vec::new();
    for row in stmt.query_map([], label_from_row)? {
        if found.len() >= limit {
            break;
        }
        let label = row?;
        if label.name.to_lowercase().contains(&needle) {
            found.push(label);
        }
    }
    Ok(found)
}

/// A page of labels by stored `book_count`, plus the total label count.
pub fn list_page(conn: &Connection, offset: u64, limit: u32) -> Result<(Vec<Label>, u64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM labels", [], |row| row.get(0))?;
    let mut stmt = conn.prepare(
        "SELECT label_id, label_name, book_count FROM labels
         ORDER BY book_count DESC, label_id ASC
         LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![i64::from(limit), offset as i64], label_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((rows, total as u64))
}

pub(crate) fn label_from_row(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        label_id: row.get(0)?,
        name: row.get(1)?,
        book_count: row.get::<_, i64>(2)? as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::book_labels;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_find() {
        let conn = test_db();
        let label = insert(&conn, "Rust").expect("insert");
        assert_eq!(label.book_count, 0);
        assert_eq!(find_by_name(&conn, "Rust").expect("find").label_id, label.label_id);
        assert!(matches!(find_by_name(&conn, "rust"), Err(DbError::NotFound(_))));
        assert!(exists(&conn, label.label_id).expect("exists"));
        assert!(!exists(&conn, 999).expect("exists"));
    }

    #[test]
    fn test_duplicate_name_is_constraint() {
        let conn = test_db();
        insert(&conn, "Rust").expect("insert");
        let err = insert(&conn, "Rust").expect_err("duplicate");
        assert!(matches!(err, DbError::Constraint(_)));
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_refresh_count_tracks_edges() {
        let conn = test_db();
        let label = insert(&conn, "Rust").expect("insert");
        book_labels::insert_edge(&conn, 1, label.label_id).expect("edge 1");
        book_labels::insert_edge(&conn, 2, label.label_id).expect("edge 2");

        assert_eq!(get(&conn, label.label_id).expect("get").book_count, 0);
        assert_eq!(refresh_count(&conn, label.label_id).expect("refresh"), 2);
        assert_eq!(get(&conn, label.label_id).expect("get").book_count, 2);
    }

    #[test]
    fn test_delete_removes_edges_first() {
        let conn = test_db();
        let label = insert(&conn, "Rust").expect("insert");
        book_labels::insert_edge(&conn, 1, label.label_id).expect("edge");

        assert_eq!(delete(&conn, label.label_id).expect("delete"), (1, true));
        assert_eq!(delete(&conn, label.label_id).expect("again"), (0, false));
        assert!(book_labels::label_ids_for_book(&conn, 1).expect("ids").is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let conn = test_db();
        insert(&conn, "Rustacean").expect("a");
        let popular = insert(&conn, "trust").expect("b");
        insert(&conn, "Go").expect("c");
        book_labels::insert_edge(&conn, 1, popular.label_id).expect("edge");
        refresh_count(&conn, popular.label_id).expect("refresh");

        let found = search(&conn, "RUST", 10).expect("search");
        let names: Vec<_> = found.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["trust", "Rustacean"]);
        assert_eq!(search(&conn, "rust", 1).expect("limited").len(), 1);
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let conn = test_db();
        let umlaut = insert(&conn, "Ärger").expect("a");
        insert(&conn, "ÉCOLE primaire").expect("b");

        let found = search(&conn, "ärger", 10).expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label_id, umlaut.label_id);
        assert_eq!(search(&conn, "école", 10).expect("accent").len(), 1);
        assert!(search(&conn, "ärger", 0).expect("zero limit").is_empty());
    }

    #[test]
    fn test_list_page() {
        let conn = test_db();
        for name in ["a", "b", "c"] {
            insert(&conn, name).expect("insert");
        }
        let (page, total) = list_page(&conn, 2, 2).expect("page");
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
    }
}
