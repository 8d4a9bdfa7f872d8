//! Process resource monitoring tools — cpu, memory, and network listings.
//!
//! Shells out to `ps` and `lsof` (plus `sysctl`/`vm_stat`/`top` on macOS and
//! `/proc` on Linux for the overview), normalizes the output into typed
//! records, and sorts/paginates them. Each tool submodule exposes
//! `pub fn execute(input: &[u8]) -> Result<Vec<u8>, ToolError>`.

pub mod by_category;
pub mod collect;
pub mod overview;
pub mod paging;
pub mod records;
pub mod sort;
pub mod top_processes;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ToolError;
use crate::registry::{make_tool, Registry};

/// Time budget for one tool execution, covering its command invocations.
pub const COMMAND_TIMEOUT_MS: i32 = 10_000;

/// Register every monitor tool with the registry.
pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(make_tool(
        "monitor.top_processes",
        "monitor",
        "Report the five most resource-intensive processes per category (cpu, memory, network)",
        COMMAND_TIMEOUT_MS,
    ));

    reg.register_tool(make_tool(
        "monitor.processes_by_category",
        "monitor",
        "List processes for one category with sorting and pagination",
        COMMAND_TIMEOUT_MS,
    ));

    reg.register_tool(make_tool(
        "monitor.system_overview",
        "monitor",
        "Report an aggregate snapshot: CPU load, memory totals, and process statistics",
        COMMAND_TIMEOUT_MS,
    ));
}

fn decode_input<T: DeserializeOwned>(input: &[u8]) -> Result<T, ToolError> {
    serde_json::from_slice(input)
        .map_err(|e| ToolError::InvalidParameter(format!("invalid JSON input: {e}")))
}

fn encode_output<T: Serialize>(output: &T) -> Result<Vec<u8>, ToolError> {
    serde_json::to_vec(output).map_err(|e| ToolError::CommandFailure {
        command: "json encode".to_string(),
        detail: e.to_string(),
    })
}
