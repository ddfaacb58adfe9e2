use super::traits::Tool;
use super::types::ToolResult;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;

/// Hands control of the run to another role.
///
/// The tool does nothing itself; the acting role sees
/// [`ToolResult::handoff`] and routes accordingly.
pub struct TransferTool {
    target: String,
    name: String,
    description: String,
}

impl TransferTool {
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            name: format!("transfer_to_{target}"),
            description: format!("Transfer control to {target} agent."),
            target,
        }
    }
}

impl Tool for TransferTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    fn execute<'a>(
        &'a self,
        _args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>> {
        Box::pin(async move {
            Ok(ToolResult {
                handoff: Some(self.target.clone()),
                ..ToolResult::ok(format!("Successfully transferred to {}", self.target))
            })
        })
    }
}
