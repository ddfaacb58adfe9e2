//! The critique-driven state machine: an acting role that performs SOP steps,
//! a reviewing role that judges them, and the loop that routes between them.

pub mod acting;
pub mod control;
pub mod diagram;
pub mod prompts;
pub mod reviewing;
pub mod role;
pub mod updates;
pub mod verdict;

pub use acting::{ActingRole, ActingSettings};
pub use control::{ControlLoop, LoopState, RunOutcome, TerminationPolicy};
pub use prompts::PromptTemplates;
pub use reviewing::{CriticSettings, ReviewingRole};
pub use role::{NextRole, Role, RoleId, RoutingDecision, RunState};
pub use updates::{ChannelSink, ConsoleSink, NullUpdateSink, TransitionUpdate, UpdateSink};
pub use verdict::Verdict;
