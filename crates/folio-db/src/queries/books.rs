//! Book catalog query functions.

use rusqlite::{Connection, Row};

use folio_types::{Book, BookId, BookVisibility, MemberId};

use crate::{placeholders, Result};

/// Visibility predicate for a member: public books, or private books the
/// member holds a direct or team-derived role on. `?1` is the member id.
pub(crate) const MEMBER_VISIBLE: &str = "(b.privately_owned = 0
      OR EXISTS (SELECT 1 FROM book_roles r WHERE r.book_id = b.book_id AND r.member_id = ?1)
      OR EXISTS (SELECT 1 FROM team_books tb
                 JOIN team_members tm ON tm.team_id = tb.team_id
                 WHERE tb.book_id = b.book_id AND tm.member_id = ?1))";

const BOOK_COLUMNS: &str =
    "b.book_id, b.book_name, b.identify, b.description, b.privately_owned, b.order_index, b.created_at";

/// Fields for a new book.
#[derive(Debug, Clone)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub identify: &'a str,
    pub description: Option<&'a str>,
    pub private: bool,
    pub order_index: i64,
    pub created_at: u64,
}

/// Insert a book and return its id.
pub fn insert(conn: &Connection, book: &NewBook<'_>) -> Result<BookId> {
    conn.execute(
        "INSERT INTO books (book_name, identify, description, privately_owned, order_index, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            book.title,
            book.identify,
            book.description,
            book.private,
            book.order_index,
            book.created_at as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Page of books for the home listing, newest manual order first.
///
/// Anonymous callers (`member_id <= 0`) see public books only.
pub fn find_for_home(
    conn: &Connection,
    member_id: MemberId,
    offset: u64,
    limit: u32,
) -> Result<(Vec<Book>, u64)> {
    if folio_types::is_member(member_id) {
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM books b WHERE {MEMBER_VISIBLE}"),
            [member_id],
            |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books b WHERE {MEMBER_VISIBLE}
             ORDER BY b.order_index DESC, b.book_id DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
            .query_map(
                rusqlite::params![member_id, i64::from(limit), offset as i64],
                book_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((rows, total as u64))
    } else {
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM books WHERE privately_owned = 0",
            [],
            |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books b WHERE b.privately_owned = 0
             ORDER BY b.order_index DESC, b.book_id DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
            .query_map(
                rusqlite::params![i64::from(limit), offset as i64],
                book_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((rows, total as u64))
    }
}

/// Look up books by id. Unknown ids are skipped; order is unspecified.
pub fn get_by_ids(conn: &Connection, ids: &[BookId]) -> Result<Vec<Book>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books b WHERE b.book_id IN ({})",
        placeholders(ids.len())
    ))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(ids), book_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        book_id: row.get(0)?,
        title: row.get(1)?,
        identify: row.get(2)?,
        description: row.get(3)?,
        visibility: BookVisibility::from_private_flag(row.get(4)?),
        order_index: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::queries::roles;

    pub(crate) fn add_book(conn: &Connection, title: &str, private: bool, order_index: i64) -> BookId {
        insert(
            conn,
            &NewBook {
                title,
                identify: &title.to_lowercase().replace(' ', "-"),
                description: None,
                private,
                order_index,
                created_at: 1000,
            },
        )
        .expect("insert book")
    }

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_home_order_and_total() {
        let conn = test_db();
        let a = add_book(&conn, "Alpha", false, 0);
        let b = add_book(&conn, "Beta", false, 5);
        let c = add_book(&conn, "Gamma", false, 0);

        let (books, total) = find_for_home(&conn, 0, 0, 10).expect("page");
        assert_eq!(total, 3);
        let ids: Vec<_> = books.iter().map(|b| b.book_id).collect();
        assert_eq!(ids, vec![b, c, a]);

        let (page2, total) = find_for_home(&conn, 0, 2, 2).expect("page 2");
        assert_eq!(total, 3);
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].book_id, a);
    }

    #[test]
    fn test_anonymous_sees_public_only() {
        let conn = test_db();
        add_book(&conn, "Open", false, 0);
        add_book(&conn, "Secret", true, 0);

        let (books, total) = find_for_home(&conn, 0, 0, 10).expect("page");
        assert_eq!(total, 1);
        assert_eq!(books[0].title, "Open");
    }

    #[test]
    fn test_member_sees_granted_private_books() {
        let conn = test_db();
        add_book(&conn, "Open", false, 0);
        let direct = add_book(&conn, "Direct", true, 0);
        let team = add_book(&conn, "Team", true, 0);
        add_book(&conn, "Hidden", true, 0);

        roles::grant_book_role(&conn, direct, 7, 2).expect("grant");
        roles::add_team_member(&conn, 3, 7, 1).expect("team member");
        roles::add_team_book(&conn, 3, team).expect("team book");

        let (books, total) = find_for_home(&conn, 7, 0, 10).expect("page");
        assert_eq!(total, 3);
        assert!(books.iter().all(|b| b.title != "Hidden"));
    }

    #[test]
    fn test_get_by_ids_skips_unknown() {
        let conn = test_db();
        let a = add_book(&conn, "Alpha", false, 0);
        let books = get_by_ids(&conn, &[a, 999]).expect("lookup");
        assert_eq!(books.len(), 1);
        assert!(get_by_ids(&conn, &[]).expect("empty").is_empty());
    }
}
