//! In-memory pagination for card grids
//!
//! Lists are fetched whole and paged client-side. Each view has its own fixed page size.

/// Movies list page size
pub const MOVIES_PAGE_SIZE: usize = 6;
/// Home view section page size
pub const HOME_SECTION_PAGE_SIZE: usize = 6;
/// Admin list page size
pub const ADMIN_PAGE_SIZE: usize = 5;

/// Pagination metadata for one page of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages (0 for an empty list)
    pub total_pages: usize,
    /// Index of the first item on the page
    pub offset: usize,
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Calculate pagination metadata, clamping the page into `[1, total_pages]`
///
/// # Examples
/// ```
/// use muvi_client::views::pagination::calculate_pagination;
///
/// // 14 movies at 6 per page = 3 pages (6 + 6 + 2)
/// let p = calculate_pagination(14, 2, 6);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 6);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(14, 99, 6);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 12);
/// ```
pub fn calculate_pagination(total: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size);
    let page = requested_page.clamp(1, total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

/// Slice out one page of `items`
pub fn paginate<T>(items: &[T], requested_page: usize, page_size: usize) -> (&[T], Pagination) {
    let p = calculate_pagination(items.len(), requested_page, page_size);
    let end = (p.offset + page_size.max(1)).min(items.len());
    (&items[p.offset.min(end)..end], p)
}
