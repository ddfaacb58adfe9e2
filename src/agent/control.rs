use super::role::{NextRole, Role, RoleId, RunState};
use super::updates::{NullUpdateSink, TransitionUpdate, UpdateSink};
use crate::config::ControlConfig;
use crate::error::{LoopError, RoutingError};
use crate::transcript::Transcript;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_MAX_REVISIONS: u32 = 8;

/// When a run gives up instead of waiting for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    /// Returns to the acting role allowed before the run fails as not converged.
    pub max_revisions: u32,
    /// Wall-clock bound for the whole run.
    pub deadline: Option<Duration>,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            max_revisions: DEFAULT_MAX_REVISIONS,
            deadline: None,
        }
    }
}

impl TerminationPolicy {
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            max_revisions: config.max_revisions,
            deadline: config.deadline(),
        }
    }
}

/// States of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Acting,
    Reviewing,
    Terminated,
}

impl From<NextRole> for LoopState {
    fn from(next: NextRole) -> Self {
        match next {
            NextRole::Acting => Self::Acting,
            NextRole::Reviewing => Self::Reviewing,
            NextRole::Terminate => Self::Terminated,
        }
    }
}

/// A run that reached approval.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub transcript: Transcript,
    /// Role invocations, both roles counted.
    pub steps: u32,
    /// Times control went back to the acting role.
    pub revisions: u32,
}

/// Alternates the acting and reviewing roles until the critic approves.
///
/// Each role receives the transcript its predecessor returned and must hand
/// back an extension of it. Only the reviewing state may terminate.
pub struct ControlLoop {
    acting: Arc<dyn Role>,
    reviewing: Arc<dyn Role>,
    policy: TerminationPolicy,
    sink: Arc<dyn UpdateSink>,
}

impl ControlLoop {
    pub fn new(acting: Arc<dyn Role>, reviewing: Arc<dyn Role>) -> Self {
        Self {
            acting,
            reviewing,
            policy: TerminationPolicy::default(),
            sink: Arc::new(NullUpdateSink),
        }
    }

    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn UpdateSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    pub async fn run(&self, state: RunState) -> Result<RunOutcome, LoopError> {
        let Some(limit) = self.policy.deadline else {
            return self.drive(state).await;
        };

        if let Ok(result) = tokio::time::timeout(limit, self.drive(state)).await {
            result
        } else {
            tracing::warn!(limit_secs = limit.as_secs(), "Run deadline exceeded");
            Err(LoopError::DeadlineExceeded { limit })
        }
    }

    async fn drive(&self, state: RunState) -> Result<RunOutcome, LoopError> {
        let run_id = Uuid::new_v4();
        let RunState {
            mut transcript,
            sop,
        } = state;
        let mut current = LoopState::Acting;
        let mut steps = 0_u32;
        let mut revisions = 0_u32;

        tracing::info!(%run_id, max_revisions = self.policy.max_revisions, "Starting run");

        loop {
            let role = match current {
                LoopState::Acting => &self.acting,
                LoopState::Reviewing => &self.reviewing,
                LoopState::Terminated => {
                    tracing::info!(%run_id, steps, revisions, "Run approved");
                    return Ok(RunOutcome {
                        run_id,
                        transcript,
                        steps,
                        revisions,
                    });
                }
            };
            let role_id = role.id();
            let prior = transcript.clone();

            tracing::debug!(%run_id, role = %role_id, messages = prior.len(), "Invoking role");
            let decision = role
                .run(transcript, &sop)
                .await
                .map_err(|error| classify_role_error(role_id, error))?;

            if !decision.transcript.extends(&prior) {
                return Err(RoutingError::TranscriptRewritten { role: role_id }.into());
            }
            if current == LoopState::Acting && decision.next == NextRole::Terminate {
                return Err(RoutingError::ActingCannotTerminate { role: role_id }.into());
            }

            steps += 1;
            transcript = decision.transcript;
            let update = TransitionUpdate {
                run_id,
                step: steps,
                role: role_id,
                next: decision.next,
                appended: transcript.since(prior.len()).to_vec(),
                at: Utc::now(),
            };
            tracing::debug!(
                %run_id,
                step = steps,
                role = %role_id,
                next = %decision.next,
                appended = update.appended.len(),
                "Transition"
            );
            self.sink.on_update(&update).await;

            current = LoopState::from(decision.next);
            if current == LoopState::Acting {
                if revisions >= self.policy.max_revisions {
                    tracing::warn!(%run_id, revisions, "Run did not converge");
                    return Err(LoopError::NotConverged { revisions });
                }
                revisions += 1;
            }
        }
    }
}

fn classify_role_error(role: RoleId, error: anyhow::Error) -> LoopError {
    match error.downcast::<RoutingError>() {
        Ok(routing) => LoopError::Routing(routing),
        Err(source) => LoopError::Role { role, source },
    }
}
