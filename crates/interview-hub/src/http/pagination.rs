use serde::{Deserialize, Serialize};

use super::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// `?page=&page_size=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Page-number envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

impl PageParams {
    fn size(&self) -> usize {
        self.page_size
            .filter(|size| *size > 0)
            .map_or(DEFAULT_PAGE_SIZE, |size| size.min(MAX_PAGE_SIZE))
    }

    /// Cuts `items` into the requested page; pages past the end are 404.
    pub fn paginate<T>(&self, items: Vec<T>) -> Result<Page<T>, ApiError> {
        let size = self.size();
        let page = self.page.unwrap_or(1);
        let count = items.len();
        let pages = count.div_ceil(size).max(1);

        if page == 0 || page > pages {
            return Err(ApiError::NotFound("Invalid page.".to_string()));
        }

        let results = items
            .into_iter()
            .skip((page - 1) * size)
            .take(size)
            .collect();

        Ok(Page {
            count,
            next: (page < pages).then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
            results,
        })
    }
}
