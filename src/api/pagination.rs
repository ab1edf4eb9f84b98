//! Page-number pagination for list views.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number, or `last`.
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

/// The slice of rows a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub limit: u32,
    pub offset: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// An empty list still has one (empty) page.
    pub fn num_pages(&self) -> u32 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(u64::from(self.per_page)) as u32
        }
    }

    pub fn window(&self, requested: Option<&str>) -> Result<PageWindow, AppError> {
        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => self.num_pages(),
            Some(raw) => raw.parse::<u32>().map_err(|_| AppError::not_found("Page"))?,
        };

        if number == 0 || number > self.num_pages() {
            return Err(AppError::not_found("Page"));
        }

        Ok(PageWindow {
            number,
            limit: self.per_page,
            offset: u64::from(number - 1) * u64::from(self.per_page),
        })
    }
}

/// One page of results with its navigation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub per_page: u32,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Paginated<T> {
    pub fn new(paginator: Paginator, window: PageWindow, items: Vec<T>) -> Self {
        let num_pages = paginator.num_pages();
        Self {
            items,
            number: window.number,
            num_pages,
            per_page: paginator.per_page,
            count: paginator.count,
            has_next: window.number < num_pages,
            has_previous: window.number > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_has_one_page() {
        let p = Paginator::new(0, 50);
        assert_eq!(p.num_pages(), 1);
        let w = p.window(None).unwrap();
        assert_eq!(w.number, 1);
        assert_eq!(w.offset, 0);
        assert!(p.window(Some("2")).is_err());
    }

    #[test]
    fn partial_last_page_counts() {
        let p = Paginator::new(120, 50);
        assert_eq!(p.num_pages(), 3);
        assert_eq!(p.window(Some("3")).unwrap().offset, 100);
        assert_eq!(p.window(Some("last")).unwrap().number, 3);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let p = Paginator::new(20, 10);
        assert_eq!(p.num_pages(), 2);
        assert!(p.window(Some("3")).is_err());
    }

    #[test]
    fn rejects_zero_and_garbage() {
        let p = Paginator::new(5, 10);
        assert!(matches!(p.window(Some("0")), Err(AppError::NotFound(_))));
        assert!(matches!(p.window(Some("two")), Err(AppError::NotFound(_))));
        assert!(matches!(p.window(Some("-1")), Err(AppError::NotFound(_))));
    }

    #[test]
    fn navigation_flags() {
        let p = Paginator::new(25, 10);
        let middle = Paginated::new(p, p.window(Some("2")).unwrap(), vec![0u8; 10]);
        assert!(middle.has_next);
        assert!(middle.has_previous);

        let last = Paginated::new(p, p.window(Some("last")).unwrap(), vec![0u8; 5]);
        assert!(!last.has_next);
        assert_eq!(last.num_pages, 3);
    }
}
