use super::role::NextRole;
use serde::{Deserialize, Serialize};

/// The critic's judgment of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Revise,
}

impl Verdict {
    /// `Approve` only when the whole response, trimmed and lower-cased, is
    /// exactly `ok`. `"OK."`, `"ok, done"` and empty text all revise.
    pub fn classify(response: &str) -> Self {
        if response.trim().to_lowercase() == "ok" {
            Self::Approve
        } else {
            Self::Revise
        }
    }

    pub fn next_role(self) -> NextRole {
        match self {
            Self::Approve => NextRole::Terminate,
            Self::Revise => NextRole::Acting,
        }
    }
}
