//! Contracts for the services the catalog core consumes but does not own.

use std::collections::HashSet;

use folio_types::{Book, BookId, MemberId, Page, PageRequest, ReadHistoryEntry};

use crate::Result;

/// Paginated book listings and lookups by id.
pub trait BookCatalogStore: Send + Sync {
    /// The home listing page visible to `member_id` (anonymous when `<= 0`),
    /// with the total number of visible books.
    fn find_for_home(&self, page: PageRequest, member_id: MemberId) -> Result<Page<Book>>;

    /// Books for the given ids. Unknown ids are skipped; order is unspecified.
    fn books_by_ids(&self, ids: &[BookId]) -> Result<Vec<Book>>;
}

/// A member's access history, most recently read first.
pub trait ReadHistoryStore: Send + Sync {
    fn find_to_pager(&self, member_id: MemberId, page: PageRequest) -> Result<Page<ReadHistoryEntry>>;
}

/// Decides whether a member may see private books.
pub trait RoleResolver: Send + Sync {
    /// The subset of `book_ids` the member holds a direct or team-derived role on.
    fn viewable_books(&self, member_id: MemberId, book_ids: &[BookId]) -> Result<HashSet<BookId>>;

    fn can_view(&self, member_id: MemberId, book_id: BookId) -> Result<bool> {
        Ok(self.viewable_books(member_id, &[book_id])?.contains(&book_id))
    }
}
