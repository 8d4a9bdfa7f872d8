//! Raw metric collection — invokes OS process-listing utilities.
//!
//! Each category has a fixed argv. Commands here only read system state;
//! the execution pipeline bounds their runtime with the tool's time budget.

use std::process::Command;

use crate::error::ToolError;

use super::records::Category;

/// The command line used to sample a category's processes.
pub fn listing_argv(category: Category) -> &'static [&'static str] {
    match category {
        Category::Cpu => {
            if cfg!(target_os = "macos") {
                &["ps", "-eo", "pid,%cpu,comm", "-r"]
            } else {
                &["ps", "-eo", "pid,%cpu,comm", "--sort=-%cpu"]
            }
        }
        Category::Memory => {
            if cfg!(target_os = "macos") {
                &["ps", "-eo", "pid,pmem,rss,comm", "-m"]
            } else {
                &["ps", "-eo", "pid,pmem,rss,comm", "--sort=-pmem"]
            }
        }
        Category::Network => &["lsof", "-i", "-n", "-P"],
    }
}

/// Run a command and return its stdout as text.
///
/// A spawn failure or non-zero exit is a `CommandFailure`; callers never see
/// partial output.
pub fn run_command(argv: &[&str]) -> Result<String, ToolError> {
    let output = Command::new(argv[0])
        .args(&argv[1..])
        .output()
        .map_err(|e| ToolError::CommandFailure {
            command: argv.join(" "),
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::CommandFailure {
            command: argv.join(" "),
            detail: format!("{} ({})", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Collect the raw process listing for one category.
pub fn collect_category(category: Category) -> Result<String, ToolError> {
    run_command(listing_argv(category))
}
