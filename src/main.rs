//! resmon-tools — process resource monitor tool service
//!
//! Serves a small registry of monitoring tools over gRPC. Each tool shells
//! out to OS utilities (`ps`, `lsof`, `sysctl`, ...), normalizes the output
//! into typed records, and returns JSON. Calls are stateless: one snapshot
//! per invocation, no caching or background work.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::info;

mod error;
mod executor;
mod monitor;
mod registry;

pub mod proto {
    pub mod tools {
        tonic::include_proto!("resmon.tools");
    }
}

use proto::tools::tool_registry_server::{ToolRegistry, ToolRegistryServer};

const DEFAULT_ADDR: &str = "0.0.0.0:50071";

/// gRPC service implementation
pub struct MonitorService {
    registry: Arc<registry::Registry>,
    executor: Arc<executor::Executor>,
}

#[tonic::async_trait]
impl ToolRegistry for MonitorService {
    async fn list_tools(
        &self,
        request: tonic::Request<proto::tools::ListToolsRequest>,
    ) -> Result<tonic::Response<proto::tools::ListToolsResponse>, tonic::Status> {
        let req = request.into_inner();
        let tools = self.registry.list_tools(&req.namespace);

        Ok(tonic::Response::new(proto::tools::ListToolsResponse {
            tools,
        }))
    }

    async fn get_tool(
        &self,
        request: tonic::Request<proto::tools::GetToolRequest>,
    ) -> Result<tonic::Response<proto::tools::ToolDefinition>, tonic::Status> {
        let req = request.into_inner();

        self.registry
            .get_tool(&req.name)
            .ok_or_else(|| tonic::Status::not_found(format!("Tool not found: {}", req.name)))
            .map(tonic::Response::new)
    }

    async fn execute(
        &self,
        request: tonic::Request<proto::tools::ExecuteRequest>,
    ) -> Result<tonic::Response<proto::tools::ExecuteResponse>, tonic::Status> {
        let req = request.into_inner();
        let response = self.executor.execute(&self.registry, req).await;
        Ok(tonic::Response::new(response))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    info!("resmon tool service starting...");

    let mut reg = registry::Registry::new();
    monitor::register_tools(&mut reg);
    info!("Registered {} built-in tools", reg.tool_count());

    let service = MonitorService {
        registry: Arc::new(reg),
        executor: Arc::new(executor::Executor::new()),
    };

    let addr: SocketAddr = std::env::var("RESMON_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .context("Invalid listen address")?;
    info!("Tool service gRPC server listening on {addr}");

    Server::builder()
        .add_service(ToolRegistryServer::new(service))
        .serve(addr)
        .await
        .context("Tool service gRPC server failed")?;

    Ok(())
}
