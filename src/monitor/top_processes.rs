//! monitor.top_processes — the five heaviest processes per category

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

use super::records::{self, Category, ProcessRecord};
use super::sort::{self, SortKey, SortOrder};
use super::{collect, decode_input, encode_output};

/// How many records each category reports.
pub const TOP_PROCESS_LIMIT: usize = 5;

#[derive(Deserialize)]
struct Input {}

#[derive(Serialize)]
struct Output {
    cpu_intensive_processes: Vec<ProcessRecord>,
    memory_intensive_processes: Vec<ProcessRecord>,
    network_intensive_processes: Vec<ProcessRecord>,
}

pub fn execute(input: &[u8]) -> Result<Vec<u8>, ToolError> {
    let _input: Input = if input.is_empty() {
        Input {}
    } else {
        decode_input(input)?
    };

    let output = Output {
        cpu_intensive_processes: top_for(Category::Cpu)?,
        memory_intensive_processes: top_for(Category::Memory)?,
        network_intensive_processes: top_for(Category::Network)?,
    };

    encode_output(&output)
}

/// Collect, normalize, and keep the head of the category's default ordering.
fn top_for(category: Category) -> Result<Vec<ProcessRecord>, ToolError> {
    let raw = collect::collect_category(category)?;
    let records = records::parse_records(category, &raw);
    Ok(head_of(records, category))
}

fn head_of(records: Vec<ProcessRecord>, category: Category) -> Vec<ProcessRecord> {
    let (mut sorted, _) = sort::sort_records(records, SortKey::Auto, SortOrder::Desc, category);
    sorted.truncate(TOP_PROCESS_LIMIT);
    sorted
}
