use std::ops::Range;

/// How a list page consumes its filtered results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Render everything at once
    All,
    /// Render the next batch each time the scroll sentinel comes into view
    Incremental { batch_size: usize },
    /// Fixed-size pages with next/previous controls
    Paged { page_size: usize },
}

/// Hands out consecutive batches of a result list.
///
/// Reset whenever the underlying list changes; a stale cursor would skip or
/// repeat entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCursor {
    batch_size: usize,
    position: usize,
}

impl BatchCursor {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            position: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Entries already handed out
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.position < total
    }

    /// Advance over the next batch of a list of `total` entries
    pub fn next_range(&mut self, total: usize) -> Option<Range<usize>> {
        if !self.has_more(total) {
            return None;
        }
        let start = self.position;
        let end = (start + self.batch_size).min(total);
        self.position = end;
        Some(start..end)
    }

    /// Next batch of `items`; empty once exhausted
    pub fn next_batch<'a, T>(&mut self, items: &'a [T]) -> &'a [T] {
        match self.next_range(items.len()) {
            Some(range) => &items[range],
            None => &[],
        }
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// Fixed page-size navigation over `total` entries. Pages are 1-based and
/// there is always at least one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    page: usize,
    total: usize,
}

impl Pager {
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            total,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size).max(1)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Move forward one page; false when already on the last page
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Move back one page; false when already on the first page
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a page, clamped into range
    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    /// Entry positions shown on the current page
    pub fn range(&self) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        &items[range.start.min(items.len())..range.end.min(items.len())]
    }

    /// `page/total_pages` label
    pub fn info(&self) -> String {
        format!("{}/{}", self.page, self.total_pages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod batch_cursor {
        use super::*;

        #[test]
        fn yields_consecutive_batches() {
            let items: Vec<u32> = (0..7).collect();
            let mut cursor = BatchCursor::new(3);

            assert_eq!(cursor.next_batch(&items), &[0, 1, 2]);
            assert_eq!(cursor.next_batch(&items), &[3, 4, 5]);
            assert!(cursor.has_more(items.len()));
            assert_eq!(cursor.next_batch(&items), &[6]);
            assert!(!cursor.has_more(items.len()));
            assert!(cursor.next_batch(&items).is_empty());
        }

        #[test]
        fn reset_starts_over() {
            let items = ["a", "b", "c"];
            let mut cursor = BatchCursor::new(2);
            cursor.next_batch(&items);
            cursor.reset();
            assert_eq!(cursor.position(), 0);
            assert_eq!(cursor.next_batch(&items), &["a", "b"]);
        }

        #[test]
        fn zero_batch_size_is_clamped() {
            let cursor = BatchCursor::new(0);
            assert_eq!(cursor.batch_size(), 1);
        }

        #[test]
        fn empty_list_has_nothing() {
            let mut cursor = BatchCursor::new(5);
            assert_eq!(cursor.next_range(0), None);
        }
    }

    mod pager {
        use super::*;

        #[test]
        fn total_pages_rounds_up_with_minimum_one() {
            assert_eq!(Pager::new(7, 3).total_pages(), 3);
            assert_eq!(Pager::new(6, 3).total_pages(), 2);
            assert_eq!(Pager::new(0, 3).total_pages(), 1);
        }

        #[test]
        fn navigation_is_bounded() {
            let mut pager = Pager::new(7, 3);
            assert!(!pager.has_prev());
            assert!(!pager.prev());
            assert!(pager.next());
            assert!(pager.next());
            assert!(!pager.next());
            assert_eq!(pager.page(), 3);
            assert_eq!(pager.info(), "3/3");
            assert!(pager.prev());
            assert_eq!(pager.info(), "2/3");
        }

        #[test]
        fn slices_current_page() {
            let items: Vec<u32> = (1..=7).collect();
            let mut pager = Pager::new(items.len(), 3);
            assert_eq!(pager.slice(&items), &[1, 2, 3]);
            pager.go_to(3);
            assert_eq!(pager.slice(&items), &[7]);
        }

        #[test]
        fn go_to_clamps() {
            let mut pager = Pager::new(4, 3);
            pager.go_to(99);
            assert_eq!(pager.page(), 2);
            pager.go_to(0);
            assert_eq!(pager.page(), 1);
        }

        #[test]
        fn empty_list_shows_empty_first_page() {
            let items: Vec<u32> = Vec::new();
            let pager = Pager::new(0, 3);
            assert!(pager.slice(&items).is_empty());
            assert_eq!(pager.info(), "1/1");
        }
    }
}
