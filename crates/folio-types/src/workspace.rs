//! Workspaces ("itemsets") and their many-to-many book membership.

use serde::{Deserialize, Serialize};

use crate::{BookId, WorkspaceId};

/// A named collection of books.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub created_at: u64,
}

/// A single book -> workspace edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    pub book_id: BookId,
    pub workspace_id: WorkspaceId,
    pub created_at: u64,
}
