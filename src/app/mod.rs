//! Wiring from configuration to a running loop, and CLI dispatch.

pub mod run;
pub mod session;

pub use run::{RunOptions, dispatch, resolve_sop, solo_turn};
pub use session::ToolSession;
