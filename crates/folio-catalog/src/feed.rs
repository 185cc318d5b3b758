//! Home feed aggregation.
//!
//! A feed request pulls the member's recent history and the requested
//! catalog page, resolves workspace membership in one batched lookup and
//! presents the page in one of two modes:
//!
//! - [`FeedMode::Grouped`]: the page grouped by workspace. Workspaces the
//!   member touched come first, in order of first encounter while walking
//!   history newest to oldest; the rest follow in page order; the ungrouped
//!   bucket (id 0) is last and only listed when non-empty.
//! - [`FeedMode::RankedMerge`]: one flat list, history books first, catalog
//!   books not already in history after them, sliced to the page window.
//!
//! History and membership lookups are optional enrichment: their failures
//! are logged and the feed falls back to the plain catalog page. A catalog
//! failure fails the request.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use folio_types::{
    Book, BookId, FeedMode, FeedResult, MemberId, Page, PageRequest, WorkspaceId,
    DEFAULT_HISTORY_LIMIT, UNGROUPED_WORKSPACE,
};

use crate::collaborators::{BookCatalogStore, ReadHistoryStore, RoleResolver};
use crate::membership::WorkspaceMembershipIndex;
use crate::{page_request, Result};

/// Feed construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOptions {
    #[serde(default)]
    pub mode: FeedMode,
    /// Most recent history rows considered.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_history_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            mode: FeedMode::default(),
            history_limit: default_history_limit(),
        }
    }
}

/// Builds the home feed from the catalog, reading history and workspace edges.
#[derive(Clone)]
pub struct HomeFeedAggregator {
    catalog: Arc<dyn BookCatalogStore>,
    history: Arc<dyn ReadHistoryStore>,
    roles: Arc<dyn RoleResolver>,
    memberships: WorkspaceMembershipIndex,
    options: FeedOptions,
}

impl HomeFeedAggregator {
    pub fn new(
        catalog: Arc<dyn BookCatalogStore>,
        history: Arc<dyn ReadHistoryStore>,
        roles: Arc<dyn RoleResolver>,
        memberships: WorkspaceMembershipIndex,
        options: FeedOptions,
    ) -> Self {
        Self {
            catalog,
            history,
            roles,
            memberships,
            options,
        }
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    /// Build a feed page in the configured mode.
    pub fn build_feed(&self, member_id: MemberId, page_index: u32, page_size: u32) -> Result<FeedResult> {
        self.build_feed_with_mode(member_id, page_index, page_size, self.options.mode)
    }

    /// Build a feed page in an explicit mode.
    pub fn build_feed_with_mode(
        &self,
        member_id: MemberId,
        page_index: u32,
        page_size: u32,
        mode: FeedMode,
    ) -> Result<FeedResult> {
        let page = page_request(page_index, page_size)?;
        let history = self.history_books(member_id);
        tracing::debug!(member_id, %mode, history = history.len(), "building feed");

        match mode {
            FeedMode::Grouped => self.grouped(member_id, page, &history),
            FeedMode::RankedMerge => self.ranked_merge(member_id, page, history),
        }
    }

    /// The member's recently read books, most recent first.
    ///
    /// Only books the member may currently see are kept. Anonymous callers
    /// and history failures yield an empty list.
    fn history_books(&self, member_id: MemberId) -> Vec<Book> {
        if !folio_types::is_member(member_id) {
            return Vec::new();
        }
        let Ok(history_page) = PageRequest::new(1, self.options.history_limit) else {
            return Vec::new();
        };

        let entries = match self.history.find_to_pager(member_id, history_page) {
            Ok(page) => page.items,
            Err(e) => {
                tracing::warn!(member_id, error = %e, "history unavailable, feed falls back to catalog order");
                return Vec::new();
            }
        };
        if entries.is_empty() {
            return Vec::new();
        }

        let mut last_read: HashMap<BookId, u64> = HashMap::with_capacity(entries.len());
        let mut position: HashMap<BookId, usize> = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            last_read.entry(entry.book_id).or_insert(entry.last_read_at);
            position.entry(entry.book_id).or_insert(i);
        }
        let ids: Vec<BookId> = position.keys().copied().collect();

        let mut books = match self.catalog.books_by_ids(&ids) {
            Ok(books) => books,
            Err(e) => {
                tracing::warn!(member_id, error = %e, "history books unavailable");
                return Vec::new();
            }
        };
        self.retain_viewable(member_id, &mut books);
        books.sort_by(|a, b| {
            let key = |book: &Book| {
                (
                    std::cmp::Reverse(last_read.get(&book.book_id).copied().unwrap_or(0)),
                    position.get(&book.book_id).copied().unwrap_or(usize::MAX),
                )
            };
            key(a).cmp(&key(b))
        });
        books
    }

    /// Drop private history books the member holds no role on. A member
    /// keeps history rows for books they lost access to.
    fn retain_viewable(&self, member_id: MemberId, books: &mut Vec<Book>) {
        let private: Vec<BookId> = books
            .iter()
            .filter(|book| book.visibility.is_private())
            .map(|book| book.book_id)
            .collect();
        if private.is_empty() {
            return;
        }
        let viewable = self.roles.viewable_books(member_id, &private).unwrap_or_else(|e| {
            tracing::warn!(member_id, error = %e, "role lookup failed, hiding private history books");
            HashSet::new()
        });
        let before = books.len();
        books.retain(|book| !book.visibility.is_private() || viewable.contains(&book.book_id));
        if books.len() < before {
            tracing::debug!(member_id, hidden = before - books.len(), "private history books hidden");
        }
    }

    fn catalog_page(&self, page: PageRequest, member_id: MemberId) -> Result<Page<Book>> {
        self.catalog.find_for_home(page, member_id).map_err(|e| {
            tracing::error!(member_id, page = page.page_index, error = %e, "catalog page unavailable");
            e
        })
    }

    fn grouped(&self, member_id: MemberId, page: PageRequest, history: &[Book]) -> Result<FeedResult> {
        let catalog = self.catalog_page(page, member_id)?;

        let mut lookup: Vec<BookId> = catalog.items.iter().map(|b| b.book_id).collect();
        lookup.extend(history.iter().map(|b| b.book_id));
        let memberships = self.memberships.resolve_memberships(&lookup).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "workspace membership unavailable, listing page ungrouped");
            HashMap::new()
        });
        let empty = BTreeSet::new();
        let workspaces_of = |book_id: BookId| memberships.get(&book_id).unwrap_or(&empty);

        // Each appearance is its own copy of the book.
        let mut groups: HashMap<WorkspaceId, Vec<Book>> = HashMap::new();
        let mut page_order: Vec<WorkspaceId> = Vec::new();
        for book in &catalog.items {
            let workspace_ids = workspaces_of(book.book_id);
            if workspace_ids.is_empty() {
                groups.entry(UNGROUPED_WORKSPACE).or_default().push(book.clone());
                continue;
            }
            for &workspace_id in workspace_ids {
                let group = groups.entry(workspace_id).or_default();
                if group.is_empty() {
                    page_order.push(workspace_id);
                }
                group.push(book.clone());
            }
        }

        let mut touched: HashSet<WorkspaceId> = HashSet::new();
        let mut group_order: Vec<WorkspaceId> = Vec::with_capacity(groups.len());
        for book in history {
            for &workspace_id in workspaces_of(book.book_id) {
                if workspace_id > 0 && touched.insert(workspace_id) && groups.contains_key(&workspace_id) {
                    group_order.push(workspace_id);
                }
            }
        }
        group_order.extend(page_order.iter().copied().filter(|id| !touched.contains(id)));
        if groups.contains_key(&UNGROUPED_WORKSPACE) {
            group_order.push(UNGROUPED_WORKSPACE);
        }

        let named: Vec<WorkspaceId> = group_order
            .iter()
            .copied()
            .filter(|&id| id != UNGROUPED_WORKSPACE)
            .collect();
        let workspace_names = self.memberships.workspace_names(&named).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "workspace names unavailable");
            HashMap::new()
        });

        Ok(FeedResult {
            mode: FeedMode::Grouped,
            page_index: page.page_index,
            page_size: page.page_size,
            books: catalog.items,
            total_count: catalog.total_count,
            groups: Some(groups),
            group_order,
            workspace_names,
        })
    }

    /// History books first, then the catalog prefix `[0, page_index * page_size)`
    /// minus those books, sliced to the page window.
    ///
    /// With history present every request reads the whole prefix, so the cost
    /// grows linearly with page depth. Deep pages of a large catalog should be
    /// served in grouped mode.
    fn ranked_merge(&self, member_id: MemberId, page: PageRequest, history: Vec<Book>) -> Result<FeedResult> {
        let (books, total_count) = if history.is_empty() {
            let catalog = self.catalog_page(page, member_id)?;
            (catalog.items, catalog.total_count)
        } else {
            // The combined sequence is history followed by the catalog prefix
            // up to the end of the requested window.
            let prefix_len = u32::try_from(page.end()).unwrap_or(u32::MAX);
            let prefix = self.catalog_page(PageRequest { page_index: 1, page_size: prefix_len }, member_id)?;

            let mut seen: HashSet<BookId> = HashSet::with_capacity(history.len() + prefix.items.len());
            let combined: Vec<Book> = history
                .into_iter()
                .chain(prefix.items)
                .filter(|book| seen.insert(book.book_id))
                .collect();
            let window = page.window(combined.len());
            (combined[window].to_vec(), prefix.total_count)
        };

        Ok(FeedResult {
            mode: FeedMode::RankedMerge,
            page_index: page.page_index,
            page_size: page.page_size,
            books,
            total_count,
            groups: None,
            group_order: Vec::new(),
            workspace_names: HashMap::new(),
        })
    }
}
