use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::shared::AppError;

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub fn default_page() -> u32 {
    DEFAULT_PAGE
}

pub fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Zero-based page index plus page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, AppError> {
        if size == 0 {
            return Err(AppError::BadRequest(
                "Page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// The offset as a SQL `BIGINT`; `None` when it does not fit, in
    /// which case the page lies past any real result set
    pub fn sql_offset(&self) -> Option<i64> {
        i64::try_from(self.offset()).ok()
    }

    /// Slices one page out of an already ordered sequence
    pub fn slice<T, I>(&self, items: I) -> Page<T>
    where
        I: IntoIterator<Item = T>,
    {
        let mut total = 0u64;
        let offset = self.offset();
        let mut content = Vec::new();

        for item in items {
            if total >= offset && content.len() < self.size as usize {
                content.push(item);
            }
            total += 1;
        }

        Page::new(content, *self, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results together with the totals of the whole result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
    pub size: u32,
    pub number_of_elements: u32,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = request.size();
        let total_pages = total_elements.div_ceil(u64::from(size)) as u32;
        let number = request.page();

        Self {
            number_of_elements: content.len() as u32,
            empty: content.is_empty(),
            content,
            total_elements,
            total_pages,
            number,
            size,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Renders 204 for an empty page, 200 with the page otherwise
#[derive(Debug)]
pub struct PageResponse<T>(pub Page<T>);

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        if self.0.is_empty() {
            StatusCode::NO_CONTENT.into_response()
        } else {
            (StatusCode::OK, Json(self.0)).into_response()
        }
    }
}
