use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Slice `items` into fixed-size pages. Page numbers are 1-based and
/// out-of-range requests clamp to the nearest valid page instead of
/// erroring; an empty sequence yields a single empty page.
pub fn paginate<T>(items: Vec<T>, page_size: usize, page_number: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page_number = page_number.clamp(1, total_pages);

    let start = (page_number - 1) * page_size;
    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    Page {
        items,
        page_number,
        total_pages,
        has_next: page_number < total_pages,
        has_prev: page_number > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_fixed_pages() {
        let page = paginate((0..25).collect(), 10, 2);
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let page = paginate((0..15).collect(), 10, 999);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.items, (10..15).collect::<Vec<_>>());
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn page_zero_clamps_to_first() {
        let page = paginate((0..15).collect(), 10, 0);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_sequence_is_one_empty_page() {
        let page = paginate(Vec::<i32>::new(), 10, 1);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_page() {
        let page = paginate((0..20).collect(), 10, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page_number, 2);
    }
}
