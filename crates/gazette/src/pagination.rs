//! Offset pagination over an already-resolved result set.

/// Page size used by category and listing pages.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// A clamped page request.
///
/// Pages are 1-based. Anything below 1 becomes page 1, and a page size of 0
/// becomes 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: i64, page_size: u32) -> Self {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        Self {
            page,
            page_size: page_size.max(1),
        }
    }

    /// Parse a raw `?page=` query value. Missing or unparseable input means
    /// page 1.
    pub fn parse(raw: Option<&str>, page_size: u32) -> Self {
        let page = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1);
        Self::new(page, page_size)
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items before this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

/// Page metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub total_posts: u64,
}

impl Pagination {
    /// Metadata for `request` over `total` items.
    ///
    /// An empty set is always reported as page 1 of 1 with nowhere to go,
    /// whatever page was asked for.
    pub fn compute(total: u64, request: PageRequest) -> Self {
        if total == 0 {
            return Self {
                current_page: 1,
                total_pages: 1,
                has_next_page: false,
                has_prev_page: false,
                total_posts: 0,
            };
        }

        let page_size = request.page_size() as u64;
        let total_pages = u32::try_from(total.div_ceil(page_size)).unwrap_or(u32::MAX);
        let current_page = request.page();

        Self {
            current_page,
            total_pages,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
            total_posts: total,
        }
    }

    /// Metadata for a result set with nothing in it.
    pub fn empty(request: PageRequest) -> Self {
        Self::compute(0, request)
    }
}

/// The part of `items` that falls on the requested page. Empty when the page
/// starts past the end.
pub fn page_slice<T>(items: &[T], request: PageRequest) -> &[T] {
    let len = items.len() as u64;
    let start = request.offset().min(len) as usize;
    let end = (request.offset() + request.page_size() as u64).min(len) as usize;
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_set() {
        for page in [1, 2, 3, 7, i64::MAX] {
            let request = PageRequest::new(page, 12);
            let p = Pagination::compute(0, request);
            assert_eq!(p.total_pages, 1);
            assert_eq!(p.current_page, 1);
            assert!(!p.has_next_page);
            assert!(!p.has_prev_page, "page {page} of an empty set has no previous page");
            assert_eq!(p.total_posts, 0);
            assert!(page_slice::<u8>(&[], request).is_empty());
            assert_eq!(Pagination::empty(request), p);
        }
    }

    #[test]
    fn test_past_end_of_non_empty_set_keeps_page() {
        let p = Pagination::compute(5, PageRequest::new(3, 12));
        assert_eq!(p.current_page, 3);
        assert_eq!(p.total_pages, 1);
        assert!(p.has_prev_page);
        assert!(!p.has_next_page);
    }

    #[test]
    fn test_clamps_page_and_size() {
        assert_eq!(PageRequest::new(0, 12).page(), 1);
        assert_eq!(PageRequest::new(-4, 12).page(), 1);
        assert_eq!(PageRequest::new(3, 0).page_size(), 1);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_parse_query_value() {
        assert_eq!(PageRequest::parse(None, 12).page(), 1);
        assert_eq!(PageRequest::parse(Some("3"), 12).page(), 3);
        assert_eq!(PageRequest::parse(Some(" 2 "), 12).page(), 2);
        assert_eq!(PageRequest::parse(Some("abc"), 12).page(), 1);
        assert_eq!(PageRequest::parse(Some("-9"), 12).page(), 1);
    }

    #[test]
    fn test_middle_page() {
        let p = Pagination::compute(30, PageRequest::new(2, 12));
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let items: Vec<u32> = (0..30).collect();
        assert_eq!(page_slice(&items, PageRequest::new(3, 12)), &items[24..30]);
    }

    proptest! {
        #[test]
        fn prop_total_pages_is_ceil(total in 1u64..10_000, size in 1u32..100) {
            let p = Pagination::compute(total, PageRequest::new(1, size));
            prop_assert_eq!(p.total_pages as u64, total.div_ceil(size as u64));
        }

        #[test]
        fn prop_empty_set_never_has_prev(page in i64::MIN..i64::MAX, size in 1u32..100) {
            let p = Pagination::compute(0, PageRequest::new(page, size));
            prop_assert!(!p.has_prev_page);
            prop_assert_eq!(p.current_page, 1);
        }

        #[test]
        fn prop_page_past_end_is_empty(total in 0u64..2_000, size in 1u32..50) {
            let items: Vec<u64> = (0..total).collect();
            let last = Pagination::compute(total, PageRequest::new(1, size)).total_pages;
            let request = PageRequest::new(last as i64 + 1, size);
            let p = Pagination::compute(total, request);
            prop_assert!(!p.has_next_page);
            prop_assert!(page_slice(&items, request).is_empty());
        }

        #[test]
        fn prop_pages_partition_items(total in 0u64..500, size in 1u32..40) {
            let items: Vec<u64> = (0..total).collect();
            let pages = Pagination::compute(total, PageRequest::new(1, size)).total_pages;
            let mut seen = Vec::new();
            for page in 1..=pages {
                seen.extend_from_slice(page_slice(&items, PageRequest::new(page as i64, size)));
            }
            prop_assert_eq!(seen, items);
        }
    }
}
