//! Pagination requests and results.

use serde::{Deserialize, Serialize};

/// A 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    #[error("page size must be positive")]
    ZeroPageSize,
}

impl PageRequest {
    /// Build a page request. Page indexes below 1 are clamped to 1.
    pub fn new(page_index: u32, page_size: u32) -> Result<Self, PageRequestError> {
        if page_size == 0 {
            return Err(PageRequestError::ZeroPageSize);
        }
        Ok(Self {
            page_index: page_index.max(1),
            page_size,
        })
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Row offset one past the last item on this page.
    pub fn end(&self) -> u64 {
        self.offset() + u64::from(self.page_size)
    }

    /// Half-open window of this page inside a sequence of `len` items,
    /// clamped so it never exceeds the sequence.
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(self.end()).unwrap_or(usize::MAX).min(len);
        start..end
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

/// Number of pages needed for `total_count` rows.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}
