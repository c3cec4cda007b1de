//! Fixed-size, 1-based catalog paging.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`PageRequest`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Pages are numbered from 1.
    #[error("page numbers start at 1")]
    Zero,
}

/// A request for one page of the catalog listing.
///
/// ```
/// use bazaar_core::PageRequest;
///
/// let page = PageRequest::new(2).unwrap();
/// assert_eq!((page.offset(), page.limit()), (3, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
}

impl PageRequest {
    /// Number of products on every catalog page.
    pub const PAGE_SIZE: u32 = 3;

    /// Create a request for a 1-based page number.
    ///
    /// # Errors
    ///
    /// Returns `PageError::Zero` for page `0`.
    pub const fn new(page: u32) -> Result<Self, PageError> {
        if page == 0 {
            return Err(PageError::Zero);
        }
        Ok(Self { page })
    }

    /// Rows to skip, as an SQL `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * Self::PAGE_SIZE as i64
    }

    /// Rows to return, as an SQL `LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        Self::PAGE_SIZE as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1 }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = PageRequest::default();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 3);
    }

    #[test]
    fn test_later_pages_skip_whole_pages() {
        assert_eq!(PageRequest::new(2).unwrap().offset(), 3);
        assert_eq!(PageRequest::new(3).unwrap().offset(), 6);
    }

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(PageRequest::new(0), Err(PageError::Zero));
    }

    #[test]
    fn test_large_page_does_not_overflow() {
        let page = PageRequest::new(u32::MAX).unwrap();
        assert_eq!(page.offset(), (i64::from(u32::MAX) - 1) * 3);
    }
}
