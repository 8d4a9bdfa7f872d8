//! Pagination over ordered record lists.
//!
//! Pages are 1-based. Out-of-bounds parameters are rejected rather than
//! clamped, so caller mistakes surface as errors; a page past the end of the
//! data is valid and simply comes back empty.

use serde::Serialize;

use crate::error::ToolError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MIN_PAGE_SIZE: usize = 1;
pub const MAX_PAGE_SIZE: usize = 100;

/// Navigation metadata for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Slice out the requested page and compute its navigation metadata.
pub fn paginate<T>(
    records: Vec<T>,
    page: usize,
    page_size: usize,
) -> Result<(Vec<T>, PageInfo), ToolError> {
    if page < 1 {
        return Err(ToolError::InvalidParameter(format!(
            "invalid page {page}: must be >= 1"
        )));
    }
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ToolError::InvalidParameter(format!(
            "invalid page_size {page_size}: must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"
        )));
    }

    let total_count = records.len();
    let total_pages = total_count.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);

    let slice: Vec<T> = records
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    let info = PageInfo {
        current_page: page,
        page_size,
        total_count,
        total_pages,
        has_next_page: page < total_pages,
        has_previous_page: page > 1,
    };

    Ok((slice, info))
}
