// Page slicing for post listings

use serde::Serialize;

/// Position of one page inside a counted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Lenient lookup: a missing or unparsable page gives the first page,
    /// a page past the end gives the last one. An empty listing still has
    /// one (empty) page.
    pub fn window(&self, count: usize, requested: Option<&str>) -> PageWindow {
        let num_pages = if count == 0 {
            1
        } else {
            count.div_ceil(self.per_page)
        };

        let number = match requested.map(str::trim).map(str::parse::<usize>) {
            Some(Ok(0)) | Some(Err(_)) | None => 1,
            Some(Ok(n)) => n.min(num_pages),
        };

        PageWindow {
            number,
            num_pages,
            count,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            per_page: window.per_page,
            has_next: window.number < window.num_pages,
            has_previous: window.number > 1,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_items_make_two_pages() {
        let paginator = Paginator::new(10);

        let first = paginator.window(13, None);
        assert_eq!((first.number, first.num_pages), (1, 2));
        assert_eq!((first.offset(), first.limit()), (0, 10));

        let second = paginator.window(13, Some("2"));
        assert_eq!(second.offset(), 10);
        assert_eq!(13 - second.offset(), 3);
    }

    #[test]
    fn test_lenient_page_numbers() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.window(13, Some("abc")).number, 1);
        assert_eq!(paginator.window(13, Some("0")).number, 1);
        assert_eq!(paginator.window(13, Some("-3")).number, 1);
        assert_eq!(paginator.window(13, Some("99")).number, 2);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let window = Paginator::new(10).window(0, Some("5"));
        assert_eq!((window.number, window.num_pages), (1, 1));

        let page: Page<i32> = Page::new(vec![], window);
        assert!(!page.has_next);
        assert!(!page.has_previous);
        assert!(page.is_empty());
    }
}
