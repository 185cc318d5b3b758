//! Reading history query functions.

use rusqlite::{Connection, Row};

use folio_types::{BookId, MemberId, ReadHistoryEntry};

use crate::{DbError, Result};

/// Record an access: create the row with `read_count = 1` on first access,
/// otherwise increment the count and refresh `last_read_at`.
pub fn record_read(conn: &Connection, member_id: MemberId, book_id: BookId, now: u64) -> Result<ReadHistoryEntry> {
    conn.execute(
        "INSERT INTO book_read_history (member_id, book_id, created_at, last_read_at, read_count)
         VALUES (?1, ?2, ?3, ?3, 1)
         ON CONFLICT (member_id, book_id)
         DO UPDATE SET read_count = read_count + 1, last_read_at = excluded.last_read_at",
        rusqlite::params![member_id, book_id, now as i64],
    )?;
    get(conn, member_id, book_id)
}

/// Fetch one member's history row for a book.
pub fn get(conn: &Connection, member_id: MemberId, book_id: BookId) -> Result<ReadHistoryEntry> {
    conn.query_row(
        "SELECT member_id, book_id, created_at, last_read_at, read_count
         FROM book_read_history WHERE member_id = ?1 AND book_id = ?2",
        [member_id, book_id],
        entry_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("history for member {member_id} book {book_id}"))
        }
        other => DbError::Sqlite(other),
    })
}

/// A member's history, most recently read first, plus the total row count.
pub fn find_to_pager(
    conn: &Connection,
    member_id: MemberId,
    offset: u64,
    limit: u32,
) -> Result<(Vec<ReadHistoryEntry>, u64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM book_read_history WHERE member_id = ?1",
        [member_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT member_id, book_id, created_at, last_read_at, read_count
         FROM book_read_history WHERE member_id = ?1
         ORDER BY last_read_at DESC, history_id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::params![member_id, i64::from(limit), offset as i64],
            entry_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((rows, total as u64))
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ReadHistoryEntry> {
    Ok(ReadHistoryEntry {
        member_id: row.get(0)?,
        book_id: row.get(1)?,
        created_at: row.get::<_, i64>(2)? as u64,
        last_read_at: row.get::<_, i64>(3)? as u64,
        read_count: row.get::<_, i64>(4)? as u32,
    })
}
