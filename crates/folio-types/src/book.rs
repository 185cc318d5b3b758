//! Book (document) entities as seen by the catalog layer.

use serde::{Deserialize, Serialize};

use crate::BookId;

/// Who may see a book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookVisibility {
    #[default]
    Public,
    Private,
}

impl BookVisibility {
    /// Decode the `privately_owned` storage flag.
    pub fn from_private_flag(private: bool) -> Self {
        if private {
            Self::Private
        } else {
            Self::Public
        }
    }

    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

/// A catalog book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    /// URL-safe identifier used by the web layer.
    pub identify: String,
    pub description: Option<String>,
    pub visibility: BookVisibility,
    /// Manual ordering weight; higher sorts first.
    pub order_index: i64,
    pub created_at: u64,
}
