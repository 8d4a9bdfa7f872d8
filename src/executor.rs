//! Tool execution pipeline
//!
//! Pipeline: look up tool → run its handler on a blocking thread under the
//! tool's time budget → fold the outcome into the response. Every failure is
//! recovered into a structured error payload; a call never crashes the
//! server or returns partial results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ToolError;
use crate::proto::tools::{ExecuteRequest, ExecuteResponse};
use crate::registry::Registry;

/// A tool handler function
type ToolHandler = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, ToolError> + Send + Sync>;

/// Executes tools through the pipeline
pub struct Executor {
    /// Map of tool name → handler function
    handlers: HashMap<String, ToolHandler>,
}

impl Executor {
    pub fn new() -> Self {
        let mut executor = Self {
            handlers: HashMap::new(),
        };
        executor.register_handlers();
        executor
    }

    /// Register all built-in tool handlers
    fn register_handlers(&mut self) {
        self.insert_handler("monitor.top_processes", |input| {
            crate::monitor::top_processes::execute(input)
        });
        self.insert_handler("monitor.processes_by_category", |input| {
            crate::monitor::by_category::execute(input)
        });
        self.insert_handler("monitor.system_overview", |input| {
            crate::monitor::overview::execute(input)
        });
    }

    fn insert_handler<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[u8]) -> Result<Vec<u8>, ToolError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    /// Execute a tool and fold any failure into the error payload.
    pub async fn execute(&self, registry: &Registry, request: ExecuteRequest) -> ExecuteResponse {
        let execution_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        info!(
            "Executing: caller={} tool={}",
            request.caller_id, request.tool_name
        );

        match self.run(registry, &request).await {
            Ok(output) => ExecuteResponse {
                success: true,
                output_json: output,
                error_kind: String::new(),
                error_message: String::new(),
                execution_id,
                duration_ms: start.elapsed().as_millis() as i64,
            },
            Err(err) => {
                warn!(
                    "Tool failed: tool={} kind={} error={}",
                    request.tool_name,
                    err.kind(),
                    err
                );
                ExecuteResponse {
                    success: false,
                    output_json: vec![],
                    error_kind: err.kind().to_string(),
                    error_message: err.to_string(),
                    execution_id,
                    duration_ms: start.elapsed().as_millis() as i64,
                }
            }
        }
    }

    async fn run(
        &self,
        registry: &Registry,
        request: &ExecuteRequest,
    ) -> Result<Vec<u8>, ToolError> {
        let tool = registry.get_tool(&request.tool_name).ok_or_else(|| {
            ToolError::InvalidParameter(format!("unknown tool '{}'", request.tool_name))
        })?;

        let handler = self.handlers.get(&request.tool_name).cloned().ok_or_else(|| {
            ToolError::InvalidParameter(format!(
                "no handler registered for tool '{}'",
                request.tool_name
            ))
        })?;

        // Handlers block on external commands, so they run off the async
        // runtime under the tool's time budget. On expiry the blocking task
        // is abandoned; there is no further cancellation.
        let input = request.input_json.clone();
        let budget = Duration::from_millis(tool.timeout_ms.max(0) as u64);

        match timeout(budget, task::spawn_blocking(move || handler(&input))).await {
            Err(_) => Err(ToolError::CommandTimeout {
                tool: request.tool_name.clone(),
                timeout_ms: tool.timeout_ms,
            }),
            Ok(Err(join_err)) => Err(ToolError::CommandFailure {
                command: request.tool_name.clone(),
                detail: format!("handler aborted: {join_err}"),
            }),
            Ok(Ok(result)) => result,
        }
    }
}
