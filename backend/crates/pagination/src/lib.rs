//! Page-based pagination primitives shared by list endpoints.
//!
//! [`PageRequest`] normalises the optional `page`/`limit` query parameters a
//! client sends, and [`Paginated`] is the response envelope that carries the
//! current page of items together with the total count and a `hasMore` flag.

use serde::{Deserialize, Serialize};

/// Page number used when a client does not supply one.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when a client does not supply one.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Normalised page request.
///
/// `page` is one-based and always at least 1; `limit` is clamped to
/// `1..=MAX_LIMIT`.
///
/// # Examples
///
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(Some(3), Some(500));
/// assert_eq!(request.page(), 3);
/// assert_eq!(request.limit(), 100);
/// assert_eq!(request.offset(), 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request from optional client input.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip before this page starts.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Number of matching items across all pages.
    pub total_count: u64,
    /// One-based page number these items belong to.
    pub page: u32,
    /// Whether a further page exists.
    pub has_more: bool,
}

impl<T> Paginated<T> {
    /// Assemble a page from the fetched items and the total match count.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::{PageRequest, Paginated};
    ///
    /// let page = Paginated::new(vec!["a", "b"], 5, PageRequest::new(Some(1), Some(2)));
    /// assert!(page.has_more);
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let seen = request
            .offset()
            .saturating_add(u64::try_from(items.len()).unwrap_or(u64::MAX));
        Self {
            items,
            total_count,
            page: request.page(),
            has_more: seen < total_count,
        }
    }

    /// Transform every item while keeping the envelope.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            has_more: self.has_more,
        }
    }
}
