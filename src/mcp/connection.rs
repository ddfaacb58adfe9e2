use super::content::render_content_to_text;
use crate::error::ToolError;
use anyhow::{Context, Result, anyhow};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{ServiceExt, model::CallToolRequestParams};
use std::collections::HashMap;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::RwLock;

type McpService = RunningService<RoleClient, ()>;

/// A tool-host reached over a child process's stdio.
///
/// Connected once per run; [`shutdown`](Self::shutdown) is idempotent.
pub struct McpConnection {
    name: String,
    service: RwLock<Option<McpService>>,
    call_timeout: Duration,
}

/// The result of one MCP tool call, flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub text: String,
    pub is_error: bool,
}

impl McpConnection {
    pub async fn connect_stdio(
        name: impl Into<String>,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        call_timeout: Duration,
    ) -> Result<Self> {
        let name = name.into();
        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args);
            cmd.envs(env.iter());
        }))
        .map_err(|e| ToolError::Session {
            server: name.clone(),
            message: format!("failed to spawn '{command}': {e}"),
        })?;

        let service = ().serve(transport).await.map_err(|e| ToolError::Session {
            server: name.clone(),
            message: format!("handshake with '{command}' failed: {e}"),
        })?;

        tracing::info!(server = %name, command, "Connected MCP server");
        Ok(Self {
            name,
            service: RwLock::new(Some(service)),
            call_timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn list_tools(&self) -> Result<Vec<rmcp::model::Tool>> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.inactive())?;

        service
            .list_all_tools()
            .await
            .with_context(|| format!("failed to list tools for MCP server '{}'", self.name))
    }

    pub async fn call_tool(&self, tool_name: &str, args: serde_json::Value) -> Result<CallOutcome> {
        let arguments = match args {
            serde_json::Value::Object(object) => Some(object),
            serde_json::Value::Null => None,
            _ => {
                return Err(anyhow!(
                    "MCP tool '{tool_name}' requires JSON object arguments"
                ));
            }
        };

        let request = CallToolRequestParams {
            meta: None,
            name: tool_name.to_string().into(),
            arguments,
            task: None,
        };

        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.inactive())?;

        let result = tokio::time::timeout(self.call_timeout, service.call_tool(request))
            .await
            .map_err(|_| {
                anyhow!(
                    "MCP tool '{tool_name}' on server '{}' timed out after {}s",
                    self.name,
                    self.call_timeout.as_secs()
                )
            })?
            .with_context(|| {
                format!("MCP tool '{tool_name}' call failed on server '{}'", self.name)
            })?;

        Ok(CallOutcome {
            text: render_content_to_text(&result.content),
            is_error: result.is_error.unwrap_or(false),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        let service = self.service.write().await.take();
        if let Some(service) = service {
            service
                .cancel()
                .await
                .with_context(|| format!("failed to shut down MCP server '{}'", self.name))?;
            tracing::debug!(server = %self.name, "MCP server shut down");
        }
        Ok(())
    }

    fn inactive(&self) -> anyhow::Error {
        ToolError::Session {
            server: self.name.clone(),
            message: "connection is not active".to_string(),
        }
        .into()
    }

    #[cfg(test)]
    pub(crate) fn disconnected_for_test(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: RwLock::new(None),
            call_timeout: Duration::from_secs(30),
        }
    }
}
