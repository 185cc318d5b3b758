//! Home feed results.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{page, Book, WorkspaceId};

/// How the home feed is presented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Catalog page grouped by workspace, history-touched workspaces first.
    #[default]
    Grouped,
    /// Flat list with the member's history surfaced ahead of the catalog.
    RankedMerge,
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grouped => f.write_str("grouped"),
            Self::RankedMerge => f.write_str("ranked_merge"),
        }
    }
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grouped" => Ok(Self::Grouped),
            "ranked_merge" | "ranked-merge" => Ok(Self::RankedMerge),
            other => Err(format!("unknown feed mode '{other}'")),
        }
    }
}

/// A built home feed page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResult {
    pub mode: FeedMode,
    pub page_index: u32,
    pub page_size: u32,
    /// Books on this page, in display order.
    pub books: Vec<Book>,
    /// Total catalog rows visible to the caller.
    pub total_count: u64,
    /// Workspace id -> books of this page in it. Grouped mode only.
    pub groups: Option<HashMap<WorkspaceId, Vec<Book>>>,
    /// Display order of `groups`; the ungrouped bucket, when present, is last.
    pub group_order: Vec<WorkspaceId>,
    /// Display names of the listed workspaces.
    pub workspace_names: HashMap<WorkspaceId, String>,
}

impl FeedResult {
    pub fn total_pages(&self) -> u64 {
        page::total_pages(self.total_count, self.page_size)
    }

    /// Books of one group, or an empty slice when it is not listed.
    pub fn group(&self, workspace_id: WorkspaceId) -> &[Book] {
        self.groups
            .as_ref()
            .and_then(|groups| groups.get(&workspace_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
