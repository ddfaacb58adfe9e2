//! Append-only run history shared by the acting and reviewing roles.
//!
//! A [`Transcript`] is an owned value: each role receives it by move, pushes
//! its new messages, and hands it back inside its routing decision. Nothing
//! outside this module can remove or reorder messages.

pub mod message;
pub mod sop;

pub use message::{Message, MessageRole};
pub use sop::{EXAMPLE_SOP, SopDocument};

use serde::{Deserialize, Serialize};

/// Instruction that seeds a run when the caller does not supply one.
pub const DEFAULT_INSTRUCTION: &str = "Start SOP execution.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript holding a single user instruction.
    pub fn seeded(instruction: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(instruction)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message not authored by `author`.
    pub fn last_not_authored_by(&self, author: &str) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|message| !message.is_authored_by(author))
    }

    /// Messages appended after the first `len` entries.
    pub fn since(&self, len: usize) -> &[Message] {
        self.messages.get(len..).unwrap_or_default()
    }

    /// Whether `self` keeps every message of `prior`, in order, as its prefix.
    pub fn extends(&self, prior: &Self) -> bool {
        self.messages.len() >= prior.messages.len()
            && self.messages[..prior.messages.len()] == prior.messages[..]
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}
