use super::shell::run_in_workspace;
use super::traits::Tool;
use super::types::ToolResult;
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

/// Runs a Python snippet with the configured interpreter.
pub struct PythonTool {
    command: String,
    workspace_dir: PathBuf,
    timeout: Duration,
}

impl PythonTool {
    pub fn new(
        command: impl Into<String>,
        workspace_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            workspace_dir: workspace_dir.into(),
            timeout,
        }
    }
}

impl Tool for PythonTool {
    fn name(&self) -> &str {
        "run_python_code"
    }

    fn description(&self) -> &str {
        "Execute Python code and return output."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source to execute. Print anything you want returned."
                }
            },
            "required": ["code"]
        })
    }

    fn execute<'a>(
        &'a self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>> {
        Box::pin(async move {
            let code = args
                .get("code")
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("Missing 'code' parameter"))?;

            let mut cmd = tokio::process::Command::new(&self.command);
            cmd.arg("-c").arg(code);
            Ok(run_in_workspace(cmd, &self.workspace_dir, self.timeout).await)
        })
    }
}
