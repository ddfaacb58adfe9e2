use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

fn default_max_call_seconds() -> u64 {
    60
}

fn default_enabled_true() -> bool {
    true
}

/// External tool hosts the main agent draws browser tools from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_enabled_true")]
    pub enabled: bool,

    #[serde(default)]
    pub servers: Vec<McpServerConfig>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            servers: vec![McpServerConfig::playwright()],
        }
    }
}

/// One MCP server reached over stdio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Unique name; tools are exposed as `mcp_<name>_<tool>`.
    pub name: String,

    #[serde(default)]
    pub transport: McpTransport,

    #[serde(default = "default_enabled_true")]
    pub enabled: bool,

    /// Maximum seconds per tool call.
    #[serde(default = "default_max_call_seconds")]
    pub max_call_seconds: u64,
}

/// How to reach an MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum McpTransport {
    /// Spawn the server as a child process and talk over its stdio.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

impl Default for McpTransport {
    fn default() -> Self {
        Self::Stdio {
            command: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

impl McpServerConfig {
    /// Headless browser automation via `@playwright/mcp`.
    pub fn playwright() -> Self {
        Self {
            name: "playwright".to_string(),
            transport: McpTransport::Stdio {
                command: "npx".to_string(),
                args: vec!["@playwright/mcp@latest".to_string()],
                env: HashMap::new(),
            },
            enabled: true,
            max_call_seconds: default_max_call_seconds(),
        }
    }
}

impl McpConfig {
    /// Validate the configuration, returning errors for invalid entries.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut names: HashSet<&str> = HashSet::new();

        for server in &self.servers {
            if server.name.is_empty() {
                errors.push("MCP server name cannot be empty".to_string());
            }
            if !names.insert(server.name.as_str()) {
                errors.push(format!("Duplicate MCP server name: {}", server.name));
            }
            let McpTransport::Stdio { command, .. } = &server.transport;
            if command.is_empty() {
                errors.push(format!(
                    "MCP server '{}': stdio transport requires a command",
                    server.name
                ));
            }
            if server.max_call_seconds == 0 {
                errors.push(format!(
                    "MCP server '{}': max_call_seconds must be > 0",
                    server.name
                ));
            }
        }

        errors
    }

    /// Servers to connect for a run; empty when MCP is switched off.
    #[must_use]
    pub fn enabled_servers(&self) -> Vec<&McpServerConfig> {
        if !self.enabled {
            return Vec::new();
        }
        self.servers
            .iter()
            .filter(|server| server.enabled)
            .collect()
    }
}
