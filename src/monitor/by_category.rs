//! monitor.processes_by_category — sorted, paginated listing for one category

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

use super::paging::{self, PageInfo, DEFAULT_PAGE_SIZE};
use super::records::{self, Category, ProcessRecord};
use super::sort::{self, SortOrder};
use super::{collect, decode_input, encode_output};

#[derive(Deserialize)]
struct Input {
    process_type: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default = "default_sort_by")]
    sort_by: String,
    #[serde(default = "default_sort_order")]
    sort_order: String,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE as u32
}

fn default_sort_by() -> String {
    "auto".to_string()
}

fn default_sort_order() -> String {
    "desc".to_string()
}

#[derive(Serialize, Debug)]
struct Output {
    process_type: &'static str,
    processes: Vec<ProcessRecord>,
    sorting: Sorting,
    pagination: PageInfo,
}

#[derive(Serialize, Debug)]
struct Sorting {
    /// The field actually sorted on (`auto` resolved).
    sort_by: &'static str,
    sort_order: SortOrder,
    requested_sort_by: String,
}

pub fn execute(input: &[u8]) -> Result<Vec<u8>, ToolError> {
    if input.is_empty() {
        return Err(ToolError::InvalidParameter(
            "missing input: process_type is required".to_string(),
        ));
    }
    let input: Input = decode_input(input)?;

    // Validate everything the caller controls before touching the OS.
    let category = Category::parse(&input.process_type)?;
    let (key, order) = sort::parse_sort_spec(&input.sort_by, &input.sort_order, category)?;

    let raw = collect::collect_category(category)?;
    let all_records = records::parse_records(category, &raw);
    let output = assemble(category, all_records, &input, key, order)?;

    encode_output(&output)
}

/// Pure sort/paginate/assemble step, separated from collection for testing.
fn assemble(
    category: Category,
    all_records: Vec<ProcessRecord>,
    input: &Input,
    key: sort::SortKey,
    order: SortOrder,
) -> Result<Output, ToolError> {
    let (sorted, resolved) = sort::sort_records(all_records, key, order, category);
    let (processes, pagination) =
        paging::paginate(sorted, input.page as usize, input.page_size as usize)?;

    Ok(Output {
        process_type: category.label(),
        processes,
        sorting: Sorting {
            sort_by: resolved.name(),
            sort_order: order,
            requested_sort_by: input.sort_by.clone(),
        },
        pagination,
    })
}
