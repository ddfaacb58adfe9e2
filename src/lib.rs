#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod tools;
pub mod transcript;

pub use agent::{ControlLoop, RoleId, RunOutcome, RunState, TerminationPolicy, Verdict};
pub use config::Config;
pub use error::{LoopError, RoutingError};
pub use transcript::{Message, MessageRole, SopDocument, Transcript};
