use super::mcp::McpConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_tool_rounds() -> u32 {
    12
}

fn default_tool_timeout_secs() -> u64 {
    60
}

fn default_critic_timeout_secs() -> u64 {
    60
}

fn default_max_revisions() -> u32 {
    8
}

fn default_python_command() -> String {
    "python3".to_string()
}

fn default_workspace_dir() -> String {
    ".".to_string()
}

fn default_enabled_true() -> bool {
    true
}

/// Language-model service shared by both roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to `GEMINI_API_KEY` / `GOOGLE_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Upper bound for a single model request made by the acting role.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            base_url: None,
        }
    }
}

/// The main agent that performs SOP steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Model round-trips allowed in one acting turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Per tool call.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for ActingConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            max_tool_rounds: default_max_tool_rounds(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// The critic that judges each action against the SOP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// How long to wait for a judgment before recording it as unavailable.
    #[serde(default = "default_critic_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            timeout_secs: default_critic_timeout_secs(),
        }
    }
}

/// Termination policy for the acting/reviewing loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Critic rejections tolerated before the run fails as not converged.
    #[serde(default = "default_max_revisions")]
    pub max_revisions: u32,

    /// Optional wall-clock bound for the whole run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            max_revisions: default_max_revisions(),
            deadline_secs: None,
        }
    }
}

impl ControlConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Built-in tools offered to the main agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_enabled_true")]
    pub shell: bool,

    #[serde(default = "default_enabled_true")]
    pub python: bool,

    #[serde(default = "default_python_command")]
    pub python_command: String,

    /// Working directory for shell and Python tools. `~` is expanded.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell: true,
            python: true,
            python_command: default_python_command(),
            workspace_dir: default_workspace_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// SOP document used when `--sop` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sop_path: Option<String>,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub acting: ActingConfig,

    #[serde(default)]
    pub critic: CriticConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub mcp: McpConfig,
}

impl Config {
    pub fn acting_model(&self) -> &str {
        self.acting.model.as_deref().unwrap_or(&self.llm.model)
    }

    pub fn acting_temperature(&self) -> f64 {
        self.acting.temperature.unwrap_or(self.llm.temperature)
    }

    pub fn critic_model(&self) -> &str {
        self.critic.model.as_deref().unwrap_or(&self.llm.model)
    }

    pub fn critic_temperature(&self) -> f64 {
        self.critic.temperature.unwrap_or(self.llm.temperature)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.tools.workspace_dir).into_owned())
    }

    pub fn sop_path(&self) -> Option<PathBuf> {
        self.sop_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let temperatures = [
            ("llm.temperature", Some(self.llm.temperature)),
            ("acting.temperature", self.acting.temperature),
            ("critic.temperature", self.critic.temperature),
        ];
        for (field, value) in temperatures {
            if let Some(temp) = value
                && !(0.0..=2.0).contains(&temp)
            {
                errors.push(format!("{field} must be within 0.0..=2.0 (got {temp})"));
            }
        }

        if self.llm.model.trim().is_empty() {
            errors.push("llm.model cannot be empty".to_string());
        }
        if self.llm.request_timeout_secs == 0 {
            errors.push("llm.request_timeout_secs must be > 0".to_string());
        }
        if self.acting.max_tool_rounds == 0 {
            errors.push("acting.max_tool_rounds must be > 0".to_string());
        }
        if self.acting.tool_timeout_secs == 0 {
            errors.push("acting.tool_timeout_secs must be > 0".to_string());
        }
        if self.critic.timeout_secs == 0 {
            errors.push("critic.timeout_secs must be > 0".to_string());
        }
        if self.control.max_revisions == 0 {
            errors.push("control.max_revisions must be > 0".to_string());
        }
        if self.control.deadline_secs == Some(0) {
            errors.push("control.deadline_secs must be > 0 when set".to_string());
        }
        if self.tools.python && self.tools.python_command.trim().is_empty() {
            errors.push("tools.python_command cannot be empty".to_string());
        }
        errors.extend(self.mcp.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
