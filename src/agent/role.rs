use crate::transcript::{SopDocument, Transcript};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use strum::{Display, EnumString, IntoStaticStr};

/// Closed set of roles that can hold the transcript.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoleId {
    /// Performs SOP steps with tools.
    MainAgent,
    /// Judges the last action against the SOP.
    CriticAgent,
}

impl RoleId {
    pub const ALL: [Self; 2] = [Self::MainAgent, Self::CriticAgent];

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Where the control loop goes after a role finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NextRole {
    Acting,
    Reviewing,
    Terminate,
}

impl From<RoleId> for NextRole {
    fn from(role: RoleId) -> Self {
        match role {
            RoleId::MainAgent => Self::Acting,
            RoleId::CriticAgent => Self::Reviewing,
        }
    }
}

/// Produced by every role invocation and consumed immediately by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub next: NextRole,
    /// The full transcript after this role's turn: the prior messages
    /// followed by whatever the role appended.
    pub transcript: Transcript,
}

impl RoutingDecision {
    pub fn new(next: NextRole, transcript: Transcript) -> Self {
        Self { next, transcript }
    }
}

/// One participant in the acting/reviewing loop.
///
/// The transcript is moved in and handed back inside the decision, so only
/// the running role can touch it.
pub trait Role: Send + Sync {
    fn id(&self) -> RoleId;

    fn run<'a>(
        &'a self,
        transcript: Transcript,
        sop: &'a SopDocument,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<RoutingDecision>> + Send + 'a>>;
}

/// Starting point of a run.
#[derive(Debug, Clone)]
pub struct RunState {
    pub transcript: Transcript,
    pub sop: SopDocument,
}

impl RunState {
    pub fn new(instruction: impl Into<String>, sop: SopDocument) -> Self {
        Self {
            transcript: Transcript::seeded(instruction),
            sop,
        }
    }
}
