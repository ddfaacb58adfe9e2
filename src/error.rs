use std::time::Duration;
use thiserror::Error;

use crate::agent::role::RoleId;

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

// ─── Tool errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool {name} not found")]
    NotFound { name: String },

    #[error("tool {name} execution failed: {message}")]
    Execution { name: String, message: String },

    #[error("tool session {server} unavailable: {message}")]
    Session { server: String, message: String },
}

// ─── Control loop errors ────────────────────────────────────────────────────

/// A role broke the routing contract. Always fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("role {role} routed to unknown role '{value}'")]
    UnknownRole { role: RoleId, value: String },

    #[error("role {role} tried to terminate the run; only the reviewing role may")]
    ActingCannotTerminate { role: RoleId },

    #[error("role {role} rewrote or dropped earlier transcript messages")]
    TranscriptRewritten { role: RoleId },
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("routing contract violation: {0}")]
    Routing(#[from] RoutingError),

    #[error("SOP execution did not converge after {revisions} revisions")]
    NotConverged { revisions: u32 },

    #[error("SOP execution exceeded its {}s deadline", .limit.as_secs())]
    DeadlineExceeded { limit: Duration },

    #[error("role {role} failed: {source}")]
    Role {
        role: RoleId,
        #[source]
        source: anyhow::Error,
    },
}
