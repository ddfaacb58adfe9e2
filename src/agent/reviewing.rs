use super::prompts::{CRITIC_FEEDBACK_PREFIX, NO_CRITIQUE, PromptTemplates};
use super::role::{Role, RoleId, RoutingDecision};
use super::verdict::Verdict;
use crate::config::Config;
use crate::llm::traits::Provider;
use crate::transcript::{Message, SopDocument, Transcript};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Model settings for the reviewing role.
#[derive(Debug, Clone)]
pub struct CriticSettings {
    pub model: String,
    pub temperature: f64,
    /// How long to wait for a judgment before recording it as unavailable.
    pub timeout: Duration,
}

impl CriticSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.critic_model().to_string(),
            temperature: config.critic_temperature(),
            timeout: Duration::from_secs(config.critic.timeout_secs),
        }
    }
}

/// The critic: judges the most recent action against the SOP.
///
/// Appends exactly one `Critic feedback: ...` message per turn and never
/// fails on a bad model response. Approval terminates the run; anything else
/// sends the main agent back to work.
pub struct ReviewingRole {
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptTemplates>,
    settings: CriticSettings,
}

impl ReviewingRole {
    pub fn new(
        provider: Arc<dyn Provider>,
        prompts: Arc<PromptTemplates>,
        settings: CriticSettings,
    ) -> Self {
        Self {
            provider,
            prompts,
            settings,
        }
    }

    async fn critique(&self, sop: &SopDocument, last_action: &str) -> anyhow::Result<String> {
        let request = self.prompts.render_critique(sop.text(), last_action)?;

        let reply = tokio::time::timeout(
            self.settings.timeout,
            self.provider.chat_with_system(
                None,
                &request,
                &self.settings.model,
                self.settings.temperature,
            ),
        )
        .await;

        let critique = match reply {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                tracing::debug!("Critic returned empty content");
                NO_CRITIQUE.to_string()
            }
            Ok(Err(error)) => {
                tracing::warn!(error = %format!("{error:#}"), "Critic model call failed");
                NO_CRITIQUE.to_string()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.settings.timeout.as_secs(),
                    "Critic judgment timed out"
                );
                format!(
                    "Critique unavailable: judgment timed out after {}s.",
                    self.settings.timeout.as_secs()
                )
            }
        };
        Ok(critique)
    }
}

/// The message the critic judges: the newest one it did not write itself.
pub fn last_action(transcript: &Transcript) -> &str {
    transcript
        .last_not_authored_by(RoleId::CriticAgent.as_str())
        .map_or("", |message| message.content.as_str())
}

impl Role for ReviewingRole {
    fn id(&self) -> RoleId {
        RoleId::CriticAgent
    }

    fn run<'a>(
        &'a self,
        mut transcript: Transcript,
        sop: &'a SopDocument,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<RoutingDecision>> + Send + 'a>> {
        Box::pin(async move {
            let critique = self.critique(sop, last_action(&transcript)).await?;
            let verdict = Verdict::classify(&critique);
            tracing::info!(verdict = ?verdict, "Critic judged last action");

            transcript.push(
                Message::assistant(format!("{CRITIC_FEEDBACK_PREFIX}{critique}"))
                    .with_name(RoleId::CriticAgent.as_str()),
            );
            Ok(RoutingDecision::new(verdict.next_role(), transcript))
        })
    }
}
