use super::traits::Tool;
use super::types::ToolResult;
use serde_json::json;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

/// Maximum output size in bytes (1 MB).
const MAX_OUTPUT_BYTES: usize = 1_048_576;
/// Environment variables safe to pass to child processes.
/// Only functional variables are included -- never API keys or secrets.
const SAFE_ENV_VARS: &[&str] = &[
    "PATH", "HOME", "TERM", "LANG", "LC_ALL", "LC_CTYPE", "USER", "SHELL",
];

/// Run a prepared command inside `workspace_dir` with a scrubbed environment
/// and a hard timeout. Shared by the shell and Python tools.
pub(crate) async fn run_in_workspace(
    mut cmd: tokio::process::Command,
    workspace_dir: &Path,
    timeout: Duration,
) -> ToolResult {
    cmd.current_dir(workspace_dir)
        .env_clear()
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true);
    for var in SAFE_ENV_VARS {
        if let Ok(val) = std::env::var(var) {
            cmd.env(var, val);
        }
    }

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => {
            let stdout = truncate_output(&output.stdout, "output");
            let stderr = truncate_output(&output.stderr, "stderr");
            let success = output.status.success();

            let error = if success {
                (!stderr.is_empty()).then_some(stderr)
            } else if stderr.is_empty() {
                Some(format!("process exited with {}", output.status))
            } else {
                Some(stderr)
            };

            ToolResult {
                success,
                output: stdout,
                error,
                handoff: None,
            }
        }
        Ok(Err(e)) => ToolResult::failed(format!("Failed to execute command: {e}")),
        Err(_) => ToolResult::failed(format!(
            "Command timed out after {}s and was killed",
            timeout.as_secs()
        )),
    }
}

fn truncate_output(bytes: &[u8], label: &str) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > MAX_OUTPUT_BYTES {
        text.truncate(text.floor_char_boundary(MAX_OUTPUT_BYTES));
        text.push_str(&format!("\n... [{label} truncated at 1MB]"));
    }
    text
}

/// Shell command execution in the workspace directory.
pub struct ShellTool {
    workspace_dir: PathBuf,
    timeout: Duration,
}

impl ShellTool {
    pub fn new(workspace_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            timeout,
        }
    }
}

impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace directory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    fn execute<'a>(
        &'a self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>> {
        Box::pin(async move {
            let command = args
                .get("command")
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("Missing 'command' parameter"))?;

            tracing::debug!(command, "Running shell command");
            let mut cmd = tokio::process::Command::new("sh");
            cmd.arg("-c").arg(command);
            Ok(run_in_workspace(cmd, &self.workspace_dir, self.timeout).await)
        })
    }
}
