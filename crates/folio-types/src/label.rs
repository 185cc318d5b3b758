//! Free-text labels (tags) attached to books.

use serde::{Deserialize, Serialize};

use crate::LabelId;

/// A label with its cached usage count.
///
/// `book_count` is a materialized count of book edges as of the last
/// recompute; it is refreshed on read and on write and may briefly lag
/// behind concurrent edge mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub label_id: LabelId,
    pub name: String,
    pub book_count: u32,
}

/// Split a comma separated label list into trimmed, non-empty names.
///
/// Order is preserved and repeated names are kept; callers decide how to
/// treat repeats.
pub fn split_label_names(names: &str) -> Vec<&str> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Join label names back into the comma separated form.
pub fn join_label_names(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| label.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
