//! Per-member reading history.

use serde::{Deserialize, Serialize};

use crate::{BookId, MemberId};

/// One row per (member, book) pair. `read_count` starts at 1 on first access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadHistoryEntry {
    pub member_id: MemberId,
    pub book_id: BookId,
    pub created_at: u64,
    pub last_read_at: u64,
    pub read_count: u32,
}
