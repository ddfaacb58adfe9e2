use super::role::{NextRole, RoleId};
use crate::transcript::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One completed role invocation, as surfaced to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionUpdate {
    pub run_id: Uuid,
    /// 1-based count of role invocations in this run.
    pub step: u32,
    pub role: RoleId,
    pub next: NextRole,
    /// Messages this role appended, in order.
    pub appended: Vec<Message>,
    pub at: DateTime<Utc>,
}

/// Receives every transition as the loop progresses.
pub trait UpdateSink: Send + Sync {
    fn on_update<'a>(
        &'a self,
        update: &'a TransitionUpdate,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Discards updates.
pub struct NullUpdateSink;

impl UpdateSink for NullUpdateSink {
    fn on_update<'a>(
        &'a self,
        _update: &'a TransitionUpdate,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}

/// Prints updates to stdout, either as readable blocks or JSON lines.
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn render(&self, update: &TransitionUpdate) -> String {
        if self.json {
            return serde_json::to_string(update)
                .unwrap_or_else(|error| json_error_line(update.step, &error));
        }

        let mut out = format!(
            "Update:\n  [{}] {} -> {}\n",
            update.step, update.role, update.next
        );
        for message in &update.appended {
            let role: &'static str = message.role.into();
            let author = message.name.as_deref().unwrap_or(role);
            out.push_str(&format!("  {author}: {}\n", message.content));
        }
        out
    }
}

/// Stand-in JSON line for an update that failed to serialize.
fn json_error_line(step: u32, error: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "step": step, "error": error.to_string() }).to_string()
}

impl UpdateSink for ConsoleSink {
    fn on_update<'a>(
        &'a self,
        update: &'a TransitionUpdate,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let rendered = self.render(update);
            let mut stdout = std::io::stdout().lock();
            if let Err(error) = writeln!(stdout, "{}", rendered.trim_end()) {
                tracing::debug!(error = %error, "Failed to print update");
            }
        })
    }
}

/// Forwards updates into a channel; used by library callers and tests.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TransitionUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransitionUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UpdateSink for ChannelSink {
    fn on_update<'a>(
        &'a self,
        update: &'a TransitionUpdate,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            // A dropped receiver only means nobody is watching.
            let _ = self.tx.send(update.clone());
        })
    }
}
