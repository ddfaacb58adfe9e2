use super::traits::{CapabilityProvider, Tool};
use super::types::{ToolResult, ToolSpec};
use crate::error::ToolError;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Flat collection of tools, exposed to the acting role as a [`CapabilityProvider`].
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    call_timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT)
    }
}

impl ToolRegistry {
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            tools: HashMap::new(),
            call_timeout,
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if self.tools.insert(tool.name().to_string(), tool).is_some() {
            tracing::debug!("Replaced a tool registered under the same name");
        }
    }

    pub fn extend(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// Return sorted list of registered tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Specs for all registered tools, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|tool| tool.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool under the per-call timeout.
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::failed(
                ToolError::NotFound {
                    name: name.to_string(),
                }
                .to_string(),
            );
        };

        match tokio::time::timeout(self.call_timeout, tool.execute(args)).await {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => ToolResult::failed(
                ToolError::Execution {
                    name: name.to_string(),
                    message: format!("{error:#}"),
                }
                .to_string(),
            ),
            Err(_) => {
                tracing::warn!(
                    tool = %name,
                    timeout_secs = self.call_timeout.as_secs(),
                    "Tool call timed out"
                );
                ToolResult::failed(format!(
                    "tool {name} timed out after {}s",
                    self.call_timeout.as_secs()
                ))
            }
        }
    }
}

impl CapabilityProvider for ToolRegistry {
    fn list_capabilities(&self) -> Vec<ToolSpec> {
        self.specs()
    }

    fn invoke<'a>(
        &'a self,
        name: &'a str,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>> {
        Box::pin(async move { Ok(self.execute(name, args).await) })
    }
}
