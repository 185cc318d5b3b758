//! Book access grants: direct member roles and team-derived roles.

use std::collections::HashSet;

use rusqlite::Connection;

use folio_types::{BookId, MemberId, TeamId};

use crate::{placeholders_from, Result};

/// Grant (or change) a member's direct role on a book.
pub fn grant_book_role(conn: &Connection, book_id: BookId, member_id: MemberId, role_id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO book_roles (book_id, member_id, role_id) VALUES (?1, ?2, ?3)
         ON CONFLICT (book_id, member_id) DO UPDATE SET role_id = excluded.role_id",
        rusqlite::params![book_id, member_id, role_id],
    )?;
    Ok(())
}

/// Add a member to a team.
pub fn add_team_member(conn: &Connection, team_id: TeamId, member_id: MemberId, role_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO team_members (team_id, member_id, role_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![team_id, member_id, role_id],
    )?;
    Ok(())
}

/// Give a team access to a book.
pub fn add_team_book(conn: &Connection, team_id: TeamId, book_id: BookId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO team_books (team_id, book_id) VALUES (?1, ?2)",
        rusqlite::params![team_id, book_id],
    )?;
    Ok(())
}

/// The subset of `book_ids` the member holds a direct or team role on.
pub fn viewable_book_ids(
    conn: &Connection,
    member_id: MemberId,
    book_ids: &[BookId],
) -> Result<HashSet<BookId>> {
    if book_ids.is_empty() || !folio_types::is_member(member_id) {
        return Ok(HashSet::new());
    }
    // ?1 is the member, the id list starts at ?2.
    let ids = placeholders_from(2, book_ids.len());
    let sql = format!(
        "SELECT book_id FROM book_roles WHERE member_id = ?1 AND book_id IN ({ids})
         UNION
         SELECT tb.book_id FROM team_books tb
         JOIN team_members tm ON tm.team_id = tb.team_id
         WHERE tm.member_id = ?1 AND tb.book_id IN ({ids})"
    );
    let mut params: Vec<i64> = Vec::with_capacity(book_ids.len() + 1);
    params.push(member_id);
    params.extend_from_slice(book_ids);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| row.get::<_, BookId>(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(rows)
}
