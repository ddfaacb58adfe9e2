//! MCP (Model Context Protocol) client.
//!
//! Connects to external tool hosts over stdio (the Playwright browser server
//! by default) and exposes their tools through the local [`Tool`](crate::tools::Tool) trait.

pub mod connection;
pub mod content;
pub mod manager;
pub mod proxy_tool;

pub use connection::McpConnection;
pub use manager::McpManager;
pub use proxy_tool::McpToolProxy;
