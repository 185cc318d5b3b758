//! Book <-> label edge query functions.

use std::collections::HashSet;

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use folio_types::{BookId, BookVisibility, Label, LabelId};

use crate::{DbError, Result};

/// Outcome of inserting a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Inserted,
    /// The (book, label) pair already existed.
    DuplicateIgnored,
}

/// Result of a transactional replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    /// Label ids the book carried before the replace.
    pub previous: Vec<LabelId>,
    /// Label ids the book carries now.
    pub inserted: Vec<LabelId>,
    /// Requested ids dropped because they were not positive or had no label row.
    pub discarded: Vec<LabelId>,
}

/// A labeled book with the fields needed to filter and order it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledBook {
    pub book_id: BookId,
    pub visibility: BookVisibility,
}

/// Labels of a book ordered by name.
pub fn labels_for_book(conn: &Connection, book_id: BookId) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT l.label_id, l.label_name, l.book_count
         FROM book_labels bl JOIN labels l ON l.label_id = bl.label_id
         WHERE bl.book_id = ?1
         ORDER BY l.label_name ASC",
    )?;
    let rows = stmt
        .query_map([book_id], super::labels::label_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Label ids of a book.
pub fn label_ids_for_book(conn: &Connection, book_id: BookId) -> Result<Vec<LabelId>> {
    let mut stmt =
        conn.prepare("SELECT label_id FROM book_labels WHERE book_id = ?1 ORDER BY book_label_id")?;
    let rows = stmt
        .query_map([book_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove every edge of a book.
pub fn delete_by_book(conn: &Connection, book_id: BookId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM book_labels WHERE book_id = ?1", [book_id])?)
}

/// Insert one edge, reporting an existing pair as [`EdgeInsert::DuplicateIgnored`].
pub fn insert_edge(conn: &Connection, book_id: BookId, label_id: LabelId) -> Result<EdgeInsert> {
    match conn.execute(
        "INSERT INTO book_labels (book_id, label_id) VALUES (?1, ?2)",
        [book_id, label_id],
    ) {
        Ok(_) => Ok(EdgeInsert::Inserted),
        Err(e) if crate::is_unique_violation(&e) => Ok(EdgeInsert::DuplicateIgnored),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Replace a book's label set inside one immediate transaction.
///
/// Ids that are not positive or have no label row are discarded; repeated
/// ids are collapsed. Any insert failure rolls back the whole replace,
/// including the delete of the previous edges.
pub fn replace_by_ids(
    conn: &mut Connection,
    book_id: BookId,
    label_ids: &[LabelId],
) -> Result<ReplaceOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let previous = label_ids_for_book(&tx, book_id)?;
    tx.execute("DELETE FROM book_labels WHERE book_id = ?1", [book_id])?;

    let mut outcome = ReplaceOutcome {
        previous,
        ..ReplaceOutcome::default()
    };
    let mut seen = HashSet::new();
    for &label_id in label_ids {
        if label_id <= 0 || !super::labels::exists(&tx, label_id)? {
            outcome.discarded.push(label_id);
            continue;
        }
        if !seen.insert(label_id) {
            continue;
        }
        tx.execute(
            "INSERT INTO book_labels (book_id, label_id) VALUES (?1, ?2)",
            [book_id, label_id],
        )?;
        outcome.inserted.push(label_id);
    }

    tx.commit()?;
    Ok(outcome)
}

/// Every book carrying a label, ordered by `order_index DESC, book_id DESC`.
pub fn labeled_books(conn: &Connection, label_id: LabelId) -> Result<Vec<LabeledBook>> {
    let mut stmt = conn.prepare(
        "SELECT b.book_id, b.privately_owned
         FROM book_labels bl JOIN books b ON b.book_id = bl.book_id
         WHERE bl.label_id = ?1
         ORDER BY b.order_index DESC, b.book_id DESC",
    )?;
    let rows = stmt
        .query_map([label_id], |row| {
            Ok(LabeledBook {
                book_id: row.get(0)?,
                visibility: BookVisibility::from_private_flag(row.get(1)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One page of the public books carrying a label, in `labeled_books` order,
/// plus the number of public books carrying it.
pub fn public_labeled_book_ids(
    conn: &Connection,
    label_id: LabelId,
    offset: u64,
    limit: u32,
) -> Result<(Vec<BookId>, u64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM book_labels bl JOIN books b ON b.book_id = bl.book_id
         WHERE bl.label_id = ?1 AND b.privately_owned = 0",
        [label_id],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(
        "SELECT b.book_id
         FROM book_labels bl JOIN books b ON b.book_id = bl.book_id
         WHERE bl.label_id = ?1 AND b.privately_owned = 0
         ORDER BY b.order_index DESC, b.book_id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let ids = stmt
        .query_map(
            rusqlite::params![label_id, i64::from(limit), offset as i64],
            |row| row.get(0),
        )?
        .collect::<std::result::Result<Vec<BookId>, _>>()?;
    Ok((ids, total as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::books::tests::add_book;
    use crate::queries::labels;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_labels_for_book_sorted_by_name() {
        let conn = test_db();
        let z = labels::insert(&conn, "zeta").expect("z");
        let a = labels::insert(&conn, "alpha").expect("a");
        insert_edge(&conn, 1, z.label_id).expect("edge z");
        insert_edge(&conn, 1, a.label_id).expect("edge a");

        let names: Vec<_> = labels_for_book(&conn, 1)
            .expect("labels")
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_duplicate_edge_ignored() {
        let conn = test_db();
        let l = labels::insert(&conn, "x").expect("label");
        assert_eq!(insert_edge(&conn, 1, l.label_id).expect("first"), EdgeInsert::Inserted);
        assert_eq!(
            insert_edge(&conn, 1, l.label_id).expect("second"),
            EdgeInsert::DuplicateIgnored
        );
    }

    #[test]
    fn test_edge_requires_label() {
        let conn = test_db();
        assert!(insert_edge(&conn, 1, 42).is_err());
    }

    #[test]
    fn test_replace_filters_invalid_ids() {
        let mut conn = test_db();
        let a = labels::insert(&conn, "a").expect("a");
        let b = labels::insert(&conn, "b").expect("b");
        let old = labels::insert(&conn, "old").expect("old");
        insert_edge(&conn, 1, old.label_id).expect("old edge");

        let outcome =
            replace_by_ids(&mut conn, 1, &[a.label_id, -1, 999, b.label_id, a.label_id]).expect("replace");
        assert_eq!(outcome.previous, vec![old.label_id]);
        assert_eq!(outcome.inserted, vec![a.label_id, b.label_id]);
        assert_eq!(outcome.discarded, vec![-1, 999]);
        assert_eq!(label_ids_for_book(&conn, 1).expect("ids"), vec![a.label_id, b.label_id]);
    }

    #[test]
    fn test_replace_rolls_back_on_insert_failure() {
        let mut conn = test_db();
        let a = labels::insert(&conn, "a").expect("a");
        let b = labels::insert(&conn, "b").expect("b");
        let old = labels::insert(&conn, "old").expect("old");
        insert_edge(&conn, 1, old.label_id).expect("old edge");
        conn.execute_batch(&format!(
            "CREATE TEMP TRIGGER fail_b BEFORE INSERT ON book_labels
             WHEN NEW.label_id = {} BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            b.label_id
        ))
        .expect("trigger");

        assert!(replace_by_ids(&mut conn, 1, &[a.label_id, b.label_id]).is_err());
        assert_eq!(label_ids_for_book(&conn, 1).expect("ids"), vec![old.label_id]);
    }

    #[test]
    fn test_labeled_books_order() {
        let conn = test_db();
        let low = add_book(&conn, "Low", false, 0);
        let high = add_book(&conn, "High", true, 9);
        let newer = add_book(&conn, "Newer", false, 0);
        let l = labels::insert(&conn, "x").expect("label");
        for id in [low, high, newer] {
            insert_edge(&conn, id, l.label_id).expect("edge");
        }

        let rows = labeled_books(&conn, l.label_id).expect("books");
        let ids: Vec<_> = rows.iter().map(|r| r.book_id).collect();
        assert_eq!(ids, vec![high, newer, low]);
        assert!(rows[0].visibility.is_private());
    }

    #[test]
    fn test_public_labeled_book_ids_pages_in_sql() {
        let conn = test_db();
        let label = labels::insert(&conn, "shared").expect("label");
        let first = add_book(&conn, "First", false, 5);
        let hidden = add_book(&conn, "Hidden", true, 4);
        let second = add_book(&conn, "Second", false, 3);
        let third = add_book(&conn, "Third", false, 1);
        for book in [first, hidden, second, third] {
            insert_edge(&conn, book, label.label_id).expect("edge");
        }

        let (ids, total) = public_labeled_book_ids(&conn, label.label_id, 0, 2).expect("page 1");
        assert_eq!(ids, vec![first, second]);
        assert_eq!(total, 3);
        let (ids, _) = public_labeled_book_ids(&conn, label.label_id, 2, 2).expect("page 2");
        assert_eq!(ids, vec![third]);
        let (ids, total) = public_labeled_book_ids(&conn, 999, 0, 2).expect("unknown label");
        assert!(ids.is_empty());
        assert_eq!(total, 0);
    }
}
