//! Tool error kinds surfaced across the tool boundary.
//!
//! Every failure a tool can hit maps to one of three kinds. The execution
//! pipeline recovers all of them into a structured error payload; none of
//! them crash the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Caller supplied a bad category, sort field, sort order, or page bounds.
    #[error("{0}")]
    InvalidParameter(String),

    /// The external collector exceeded its time budget.
    #[error("tool '{tool}' did not finish within its {timeout_ms}ms time budget")]
    CommandTimeout { tool: String, timeout_ms: i32 },

    /// The external collector exited non-zero or produced unusable output.
    #[error("command '{command}' failed: {detail}")]
    CommandFailure { command: String, detail: String },
}

impl ToolError {
    /// Machine-readable kind string for the error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidParameter(_) => "invalid_parameter",
            ToolError::CommandTimeout { .. } => "command_timeout",
            ToolError::CommandFailure { .. } => "command_failure",
        }
    }
}
