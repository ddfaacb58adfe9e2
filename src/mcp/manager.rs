use super::connection::McpConnection;
use super::proxy_tool::McpToolProxy;
use crate::config::{McpConfig, McpTransport};
use crate::tools::Tool;
use std::sync::Arc;
use std::time::Duration;

struct ManagedTool {
    connection: Arc<McpConnection>,
    tool_name: String,
    description: String,
    parameters_schema: serde_json::Value,
}

/// Holds every MCP connection for one run.
///
/// A server that fails to start is logged and skipped; the run continues with
/// whatever tools did come up. Callers must [`shutdown`](Self::shutdown) on
/// every exit path.
pub struct McpManager {
    connections: Vec<Arc<McpConnection>>,
    tools: Vec<ManagedTool>,
}

impl McpManager {
    pub fn empty() -> Self {
        Self {
            connections: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub async fn from_config(config: &McpConfig) -> Self {
        let mut manager = Self::empty();

        for server in config.enabled_servers() {
            let McpTransport::Stdio { command, args, env } = &server.transport;

            let connection = match McpConnection::connect_stdio(
                server.name.clone(),
                command,
                args,
                env,
                Duration::from_secs(server.max_call_seconds),
            )
            .await
            {
                Ok(connection) => Arc::new(connection),
                Err(error) => {
                    tracing::warn!(
                        server = %server.name,
                        error = %error,
                        "Failed to connect MCP stdio server"
                    );
                    continue;
                }
            };

            match connection.list_tools().await {
                Ok(server_tools) => {
                    tracing::info!(
                        server = %server.name,
                        count = server_tools.len(),
                        "Loaded MCP tools"
                    );
                    manager
                        .tools
                        .extend(server_tools.into_iter().map(|tool| ManagedTool {
                            connection: Arc::clone(&connection),
                            tool_name: tool.name.into_owned(),
                            description: tool
                                .description
                                .map_or_else(String::new, std::borrow::Cow::into_owned),
                            parameters_schema: serde_json::Value::Object(
                                tool.input_schema.as_ref().clone(),
                            ),
                        }));
                }
                Err(error) => {
                    tracing::warn!(
                        server = %server.name,
                        error = %error,
                        "Failed to list MCP tools from server"
                    );
                }
            }

            manager.connections.push(connection);
        }

        manager
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools
            .iter()
            .map(|tool| {
                Arc::new(McpToolProxy::new(
                    tool.tool_name.clone(),
                    tool.description.clone(),
                    tool.parameters_schema.clone(),
                    Arc::clone(&tool.connection),
                )) as Arc<dyn Tool>
            })
            .collect()
    }

    pub async fn shutdown(&self) {
        for connection in &self.connections {
            if let Err(error) = connection.shutdown().await {
                tracing::warn!(
                    server = %connection.name(),
                    error = %error,
                    "Failed to shut down MCP connection"
                );
            }
        }
    }
}
