use super::types::{ToolResult, ToolSpec};
use std::future::Future;
use std::pin::Pin;

/// One callable capability: a local process, an MCP proxy, or a handoff.
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by. Unique within a registry.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run once. Expected failures (bad exit status, server-side errors)
    /// belong in a failed [`ToolResult`]; `Err` means the call itself broke.
    fn execute<'a>(
        &'a self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// What the acting role sees of its tools: a catalogue and a way to call them.
///
/// Injected at construction so the role never knows whether a capability is
/// a local process, a browser behind MCP, or a test double.
pub trait CapabilityProvider: Send + Sync {
    fn list_capabilities(&self) -> Vec<ToolSpec>;

    /// Invoke a capability. Unknown names and tool failures come back as a
    /// failed [`ToolResult`]; `Err` is reserved for the provider itself breaking.
    fn invoke<'a>(
        &'a self,
        name: &'a str,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>>;
}
