mod env_overrides;
mod loader;
pub mod mcp;
mod schema;
#[cfg(test)]
mod test_env;

pub use mcp::{McpConfig, McpServerConfig, McpTransport};
pub use schema::{ActingConfig, Config, ControlConfig, CriticConfig, LlmConfig, ToolsConfig};
