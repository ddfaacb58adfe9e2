use super::connection::{CallOutcome, McpConnection};
use crate::tools::{Tool, ToolResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Exposes one remote MCP tool as a local [`Tool`] named `mcp_<server>_<tool>`.
pub struct McpToolProxy {
    tool_name: String,
    namespaced_name: String,
    description: String,
    parameters_schema: serde_json::Value,
    connection: Arc<McpConnection>,
}

impl McpToolProxy {
    pub fn new(
        tool_name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: serde_json::Value,
        connection: Arc<McpConnection>,
    ) -> Self {
        let tool_name = tool_name.into();
        let namespaced_name = format!("mcp_{}_{tool_name}", connection.name());

        Self {
            tool_name,
            namespaced_name,
            description: description.into(),
            parameters_schema,
            connection,
        }
    }

    pub fn upstream_tool_name(&self) -> &str {
        &self.tool_name
    }

    fn result_from_outcome(outcome: CallOutcome) -> ToolResult {
        if outcome.is_error {
            ToolResult::failed(outcome.text)
        } else {
            ToolResult::ok(outcome.text)
        }
    }
}

impl Tool for McpToolProxy {
    fn name(&self) -> &str {
        &self.namespaced_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.parameters_schema.clone()
    }

    fn execute<'a>(
        &'a self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>> {
        Box::pin(async move {
            let result = match self.connection.call_tool(&self.tool_name, args).await {
                Ok(outcome) => Self::result_from_outcome(outcome),
                Err(error) => ToolResult::failed(format!("{error:#}")),
            };
            Ok(result)
        })
    }
}
