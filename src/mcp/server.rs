// SPDX-License-Identifier: MIT

//! MCP-facing surface: `tools/list` answers from the registry, `tools/call`
//! goes through the router. Per-call failures become error content; the
//! process keeps serving.

use crate::mcp::registry;
use crate::mcp::router::Router;
use once_cell::sync::Lazy;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::stdio;
use rmcp::{ErrorData, ServerHandler, ServiceExt};
use std::sync::Arc;

static TOOLS: Lazy<Vec<Tool>> = Lazy::new(|| {
    registry::CATALOG
        .iter()
        .map(|descriptor| {
            Tool::new(
                descriptor.name,
                descriptor.description,
                Arc::new(descriptor.input_schema()),
            )
        })
        .collect()
});

#[derive(Clone)]
pub struct K3sServer {
    router: Arc<Router>,
}

impl K3sServer {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

impl ServerHandler for K3sServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "k3s-mcp-rs".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Kubernetes (K3s) cluster management tools: list and inspect pods, \
                 deployments, services, nodes and namespaces, read pod logs, execute \
                 commands, apply manifests, scale deployments and delete resources."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: TOOLS.clone(),
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        match self.router.dispatch(&request.name, arguments).await {
            Ok(payload) => Ok(CallToolResult::success(vec![Content::text(payload)])),
            Err(e) => {
                log::warn!("tool '{}' failed: {}", request.name, e);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error executing {}: {}",
                    request.name, e
                ))]))
            }
        }
    }
}

/// Serve MCP over stdio until the client disconnects.
pub async fn serve_stdio(router: Router) -> anyhow::Result<()> {
    let service = K3sServer::new(router).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
