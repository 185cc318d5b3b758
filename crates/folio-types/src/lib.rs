//! # folio-types
//!
//! Shared domain types used across the Folio workspace: books, labels,
//! reading history, workspace (itemset) membership and the home feed.

pub mod book;
pub mod feed;
pub mod history;
pub mod label;
pub mod page;
pub mod workspace;

pub use book::{Book, BookVisibility};
pub use feed::{FeedMode, FeedResult};
pub use history::ReadHistoryEntry;
pub use label::Label;
pub use page::{Page, PageRequest, PageRequestError};
pub use workspace::{Workspace, WorkspaceMembership};

/// Common id aliases. Ids are positive; `<= 0` means "none" or "anonymous".
pub type BookId = i64;
pub type MemberId = i64;
pub type LabelId = i64;
pub type WorkspaceId = i64;
pub type TeamId = i64;

/// Workspace id of the bucket holding books with no workspace edge.
pub const UNGROUPED_WORKSPACE: WorkspaceId = 0;

/// Number of history rows considered when building a feed.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Home feed page size.
pub const DEFAULT_FEED_PAGE_SIZE: u32 = 18;

/// Result cap for label substring search.
pub const DEFAULT_LABEL_SEARCH_LIMIT: u32 = 10;

/// Maximum label name length in characters.
pub const MAX_LABEL_NAME_LEN: usize = 50;

/// Returns true when `member_id` identifies a signed-in member.
pub fn is_member(member_id: MemberId) -> bool {
    member_id > 0
}
