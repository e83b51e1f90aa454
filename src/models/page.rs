use serde::Deserialize;
use validator::Validate;

/// Upper bound on `pageSize` accepted from clients.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the client omits `pageSize`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Zero-based paging parameters taken from the query string (`pageNum`, `pageSize`).
/// Missing parameters fall back to the first page of [`DEFAULT_PAGE_SIZE`] items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    pub page_num: u32,
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl PageQuery {
    pub fn new(page_num: u32, page_size: u32) -> Self {
        Self {
            page_num,
            page_size,
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        i64::from(self.page_num) * i64::from(self.page_size)
    }

    /// Rows to fetch: one more than the page size, so the store can tell whether a next page exists.
    pub fn probe_limit(&self) -> i64 {
        i64::from(self.page_size) + 1
    }
}

/// One page of results without a total count.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    pub items: Vec<T>,
    pub page: PageQuery,
    pub has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from rows fetched with [`PageQuery::probe_limit`].
    pub fn from_probe(mut rows: Vec<T>, page: PageQuery) -> Self {
        let size = page.page_size as usize;
        let has_next = rows.len() > size;
        rows.truncate(size);
        Self {
            items: rows,
            page,
            has_next,
        }
    }

    pub fn map<U, F>(self, f: F) -> Slice<U>
    where
        F: FnMut(T) -> U,
    {
        Slice {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_from_probe() {
        let page = PageQuery::new(0, 2);
        let slice = Slice::from_probe(vec![1, 2, 3], page);
        assert_eq!(slice.items, vec![1, 2]);
        assert!(slice.has_next);

        let slice = Slice::from_probe(vec![1, 2], page);
        assert!(!slice.has_next);

        let slice: Slice<i32> = Slice::from_probe(vec![], page);
        assert!(slice.items.is_empty());
        assert!(!slice.has_next);
    }

    #[test]
    fn test_offset_and_limit() {
        let page = PageQuery::new(3, 20);
        assert_eq!(page.offset(), 60);
        assert_eq!(page.probe_limit(), 21);
    }

    #[test]
    fn test_missing_parameters_use_defaults() {
        let page: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(page, PageQuery::new(0, DEFAULT_PAGE_SIZE));

        let page: PageQuery = serde_json::from_str(r#"{"pageNum": 2}"#).unwrap();
        assert_eq!(page, PageQuery::new(2, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(PageQuery::new(0, 0).validate().is_err());
        assert!(PageQuery::new(0, MAX_PAGE_SIZE + 1).validate().is_err());
        assert!(PageQuery::new(7, MAX_PAGE_SIZE).validate().is_ok());
    }
}
