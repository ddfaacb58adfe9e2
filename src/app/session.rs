use crate::agent::RoleId;
use crate::config::Config;
#[cfg(feature = "mcp")]
use crate::mcp::McpManager;
use crate::tools::{PythonTool, ShellTool, ToolRegistry, TransferTool};
use std::sync::Arc;
use std::time::Duration;

/// Every capability one run may use, acquired at start and released on exit.
///
/// The registry is shared with the roles; the MCP connections behind it stay
/// open until [`close`](Self::close).
pub struct ToolSession {
    registry: Arc<ToolRegistry>,
    #[cfg(feature = "mcp")]
    mcp: McpManager,
}

impl ToolSession {
    /// Build the local tools and connect every enabled MCP server.
    /// `with_handoffs` adds the `transfer_to_<role>` tools.
    pub async fn open(config: &Config, with_handoffs: bool) -> Self {
        let timeout = Duration::from_secs(config.acting.tool_timeout_secs);
        let workspace_dir = config.workspace_dir();
        let mut registry = ToolRegistry::new(timeout);

        if config.tools.shell {
            registry.register(Arc::new(ShellTool::new(&workspace_dir, timeout)));
        }
        if config.tools.python {
            registry.register(Arc::new(PythonTool::new(
                config.tools.python_command.clone(),
                &workspace_dir,
                timeout,
            )));
        }
        if with_handoffs {
            for role in RoleId::ALL {
                registry.register(Arc::new(TransferTool::new(role.as_str())));
            }
        }

        #[cfg(feature = "mcp")]
        let mcp = {
            let manager = McpManager::from_config(&config.mcp).await;
            registry.extend(manager.tools());
            manager
        };

        tracing::info!(tools = registry.len(), "Tool session open");
        Self {
            registry: Arc::new(registry),
            #[cfg(feature = "mcp")]
            mcp,
        }
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    /// Tear down external tool hosts. Safe to call on every exit path.
    pub async fn close(self) {
        #[cfg(feature = "mcp")]
        self.mcp.shutdown().await;
        tracing::debug!("Tool session closed");
    }
}
