use serde::{Deserialize, Serialize};

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    /// Set by role-transfer tools: the role that should take over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            handoff: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            handoff: None,
        }
    }

    /// Text recorded in the transcript for this result.
    pub fn transcript_content(&self) -> String {
        match &self.error {
            Some(error) if !self.success => {
                if self.output.is_empty() {
                    format!("[ERROR] {error}")
                } else {
                    format!("{}\n[ERROR] {error}", self.output)
                }
            }
            Some(stderr) if !stderr.is_empty() => format!("{}\n[stderr] {stderr}", self.output),
            _ => self.output.clone(),
        }
    }
}

/// Description of a tool for the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}
