//! SQLite-backed implementation of the collaborator contracts.

use std::collections::HashSet;

use folio_db::queries::{books, history, roles};
use folio_db::Db;
use folio_types::{Book, BookId, MemberId, Page, PageRequest, ReadHistoryEntry, TeamId};

use crate::collaborators::{BookCatalogStore, ReadHistoryStore, RoleResolver};
use crate::{require_book_id, CatalogError, Result};

/// Book catalog, reading history and role grants stored in the Folio database.
#[derive(Clone, Debug)]
pub struct SqliteCatalog {
    db: Db,
}

impl SqliteCatalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Add a book to the catalog.
    pub fn add_book(&self, book: &books::NewBook<'_>) -> Result<BookId> {
        let book_id = self
            .db
            .with_conn(|conn| books::insert(conn, book))
            .map_err(CatalogError::write)?;
        tracing::info!(book_id, title = book.title, "book added");
        Ok(book_id)
    }

    /// Record that a member opened a book.
    pub fn record_read(&self, member_id: MemberId, book_id: BookId, now: u64) -> Result<ReadHistoryEntry> {
        require_book_id(book_id)?;
        if !folio_types::is_member(member_id) {
            return Err(CatalogError::InvalidParameter(format!(
                "history requires a member, got {member_id}"
            )));
        }
        self.db
            .with_conn(|conn| history::record_read(conn, member_id, book_id, now))
            .map_err(CatalogError::write)
    }

    /// A single history row; absent rows are [`CatalogError::NotFound`].
    pub fn history_entry(&self, member_id: MemberId, book_id: BookId) -> Result<ReadHistoryEntry> {
        Ok(self.db.with_conn(|conn| history::get(conn, member_id, book_id))?)
    }

    /// Grant a member a direct role on a book.
    pub fn grant_book_role(&self, book_id: BookId, member_id: MemberId, role_id: i64) -> Result<()> {
        self.db
            .with_conn(|conn| roles::grant_book_role(conn, book_id, member_id, role_id))
            .map_err(CatalogError::write)
    }

    /// Add a member to a team and give the team access to a book.
    pub fn grant_team_access(&self, team_id: TeamId, member_id: MemberId, book_id: BookId, role_id: i64) -> Result<()> {
        self.db
            .with_conn(|conn| {
                roles::add_team_member(conn, team_id, member_id, role_id)?;
                roles::add_team_book(conn, team_id, book_id)
            })
            .map_err(CatalogError::write)
    }
}

impl BookCatalogStore for SqliteCatalog {
    fn find_for_home(&self, page: PageRequest, member_id: MemberId) -> Result<Page<Book>> {
        let (items, total_count) = self.db.with_conn(|conn| {
            books::find_for_home(conn, member_id, page.offset(), page.page_size)
        })?;
        Ok(Page { items, total_count })
    }

    fn books_by_ids(&self, ids: &[BookId]) -> Result<Vec<Book>> {
        Ok(self.db.with_conn(|conn| books::get_by_ids(conn, ids))?)
    }
}

impl ReadHistoryStore for SqliteCatalog {
    fn find_to_pager(&self, member_id: MemberId, page: PageRequest) -> Result<Page<ReadHistoryEntry>> {
        let (items, total_count) = self.db.with_conn(|conn| {
            history::find_to_pager(conn, member_id, page.offset(), page.page_size)
        })?;
        Ok(Page { items, total_count })
    }
}

impl RoleResolver for SqliteCatalog {
    fn viewable_books(&self, member_id: MemberId, book_ids: &[BookId]) -> Result<HashSet<BookId>> {
        Ok(self
            .db
            .with_conn(|conn| roles::viewable_book_ids(conn, member_id, book_ids))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SqliteCatalog {
        SqliteCatalog::new(Db::open_memory().expect("open"))
    }

    fn book<'a>(title: &'a str, identify: &'a str, private: bool) -> books::NewBook<'a> {
        books::NewBook {
            title,
            identify,
            description: None,
            private,
            order_index: 0,
            created_at: 1000,
        }
    }

    #[test]
    fn test_history_roundtrip() {
        let catalog = catalog();
        let id = catalog.add_book(&book("Guide", "guide", false)).expect("add");
        catalog.record_read(3, id, 1000).expect("read");
        let entry = catalog.record_read(3, id, 1500).expect("read again");
        assert_eq!(entry.read_count, 2);

        let page = catalog
            .find_to_pager(3, PageRequest::new(1, 100).expect("page"))
            .expect("history");
        assert_eq!(page.total_count, 1);
        assert_eq!(catalog.history_entry(3, id).expect("entry").last_read_at, 1500);
    }

    #[test]
    fn test_missing_history_is_not_found() {
        let catalog = catalog();
        assert!(matches!(catalog.history_entry(3, 4), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_record_read_rejects_anonymous() {
        let catalog = catalog();
        assert!(matches!(
            catalog.record_read(0, 1, 1000),
            Err(CatalogError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_role_resolution() {
        let catalog = catalog();
        let direct = catalog.add_book(&book("Direct", "direct", true)).expect("add");
        let team = catalog.add_book(&book("Team", "team", true)).expect("add");
        let hidden = catalog.add_book(&book("Hidden", "hidden", true)).expect("add");
        catalog.grant_book_role(direct, 9, 1).expect("grant");
        catalog.grant_team_access(4, 9, team, 2).expect("team");

        assert!(catalog.can_view(9, direct).expect("direct"));
        assert!(catalog.can_view(9, team).expect("team"));
        assert!(!catalog.can_view(9, hidden).expect("hidden"));

        let page = catalog
            .find_for_home(PageRequest::new(1, 10).expect("page"), 9)
            .expect("home");
        assert_eq!(page.total_count, 2);
    }
}
