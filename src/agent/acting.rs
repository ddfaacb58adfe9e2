use super::prompts::{DEFAULT_ACTION_SUMMARY, PromptTemplates};
use super::role::{NextRole, Role, RoleId, RoutingDecision};
use super::updates::{TransitionUpdate, UpdateSink};
use crate::config::Config;
use crate::error::RoutingError;
use crate::llm::traits::Provider;
use crate::llm::types::{ContentBlock, ProviderMessage, ProviderResponse};
use crate::tools::{CapabilityProvider, ToolResult};
use crate::transcript::{DEFAULT_INSTRUCTION, Message, MessageRole, SopDocument, Transcript};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const CRITIC_NAME: &str = "critic_agent";

/// Model settings for the acting role.
#[derive(Debug, Clone)]
pub struct ActingSettings {
    pub model: String,
    pub temperature: f64,
    /// Model round-trips allowed before the turn is handed to review.
    pub max_tool_rounds: u32,
    pub request_timeout: Duration,
}

impl ActingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.acting_model().to_string(),
            temperature: config.acting_temperature(),
            max_tool_rounds: config.acting.max_tool_rounds,
            request_timeout: Duration::from_secs(config.llm.request_timeout_secs),
        }
    }
}

/// The main agent: performs SOP steps with tools and reports what it did.
///
/// Every turn ends with exactly one summary message authored `main_agent`,
/// and always routes to review unless a transfer tool names another role.
pub struct ActingRole {
    provider: Arc<dyn Provider>,
    capabilities: Arc<dyn CapabilityProvider>,
    prompts: Arc<PromptTemplates>,
    settings: ActingSettings,
    round_sink: Option<Arc<dyn UpdateSink>>,
}

/// Reports the inside of one turn to a round sink: one update per tool
/// round, then one for the summary.
struct RoundReporter<'a> {
    sink: &'a dyn UpdateSink,
    run_id: Uuid,
    step: u32,
    reported: usize,
}

impl RoundReporter<'_> {
    async fn report(&mut self, next: NextRole, transcript: &Transcript) {
        self.step += 1;
        let update = TransitionUpdate {
            run_id: self.run_id,
            step: self.step,
            role: RoleId::MainAgent,
            next,
            appended: transcript.since(self.reported).to_vec(),
            at: Utc::now(),
        };
        self.reported = transcript.len();
        self.sink.on_update(&update).await;
    }
}

/// How one acting turn ended.
enum TurnEnd {
    Finished(String),
    Transferred { target: RoleId, text: String },
    ModelUnavailable(String),
    OutOfRounds,
}

impl ActingRole {
    pub fn new(
        provider: Arc<dyn Provider>,
        capabilities: Arc<dyn CapabilityProvider>,
        prompts: Arc<PromptTemplates>,
        settings: ActingSettings,
    ) -> Self {
        Self {
            provider,
            capabilities,
            prompts,
            settings,
            round_sink: None,
        }
    }

    /// Stream every tool round of a turn, not just its outcome. Used when
    /// the acting role runs without the control loop.
    pub fn with_round_sink(mut self, sink: Arc<dyn UpdateSink>) -> Self {
        self.round_sink = Some(sink);
        self
    }

    async fn take_turn(
        &self,
        transcript: &mut Transcript,
        sop: &SopDocument,
        mut reporter: Option<&mut RoundReporter<'_>>,
    ) -> anyhow::Result<TurnEnd> {
        let specs = self.capabilities.list_capabilities();
        let tool_names: Vec<String> = specs.iter().map(|spec| spec.name.clone()).collect();
        let system_prompt = self.prompts.render_acting(sop.text(), &tool_names)?;
        let mut messages = to_provider_messages(transcript);

        for round in 0..self.settings.max_tool_rounds {
            let response = match tokio::time::timeout(
                self.settings.request_timeout,
                self.provider.chat_with_tools(
                    Some(&system_prompt),
                    &messages,
                    &specs,
                    &self.settings.model,
                    self.settings.temperature,
                ),
            )
            .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(error)) => return Ok(TurnEnd::ModelUnavailable(format!("{error:#}"))),
                Err(_) => {
                    return Ok(TurnEnd::ModelUnavailable(format!(
                        "no response within {}s",
                        self.settings.request_timeout.as_secs()
                    )));
                }
            };

            tracing::debug!(
                round,
                tool_calls = response.tool_use_blocks().len(),
                tokens = ?response.total_tokens(),
                "Acting round complete"
            );
            messages.push(response.to_assistant_message());

            if !response.has_tool_use() {
                return Ok(TurnEnd::Finished(response.text));
            }

            if let Some(target) = self.run_tools(&response, transcript, &mut messages).await? {
                return Ok(TurnEnd::Transferred {
                    target,
                    text: response.text,
                });
            }
            if let Some(reporter) = reporter.as_mut() {
                reporter.report(NextRole::Acting, transcript).await;
            }
        }

        Ok(TurnEnd::OutOfRounds)
    }

    /// Run every tool call of one response in order, recording each result
    /// before the next starts. Stops early on a transfer to another role.
    async fn run_tools(
        &self,
        response: &ProviderResponse,
        transcript: &mut Transcript,
        messages: &mut Vec<ProviderMessage>,
    ) -> anyhow::Result<Option<RoleId>> {
        for block in response.tool_use_blocks() {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            let result = match self.capabilities.invoke(name, input.clone()).await {
                Ok(result) => result,
                Err(error) => ToolResult::failed(format!("{error:#}")),
            };
            if !result.success {
                tracing::info!(tool = %name, error = ?result.error, "Tool call failed");
            }

            let content = result.transcript_content();
            transcript.push(Message::tool(name.clone(), id.clone(), content.clone()));
            messages.push(ProviderMessage::tool_result(id, content, !result.success));

            if let Some(value) = result.handoff {
                let target = RoleId::from_str(&value).map_err(|_| RoutingError::UnknownRole {
                    role: RoleId::MainAgent,
                    value: value.clone(),
                })?;
                if target != RoleId::MainAgent {
                    return Ok(Some(target));
                }
            }
        }
        Ok(None)
    }
}

impl Role for ActingRole {
    fn id(&self) -> RoleId {
        RoleId::MainAgent
    }

    fn run<'a>(
        &'a self,
        mut transcript: Transcript,
        sop: &'a SopDocument,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<RoutingDecision>> + Send + 'a>> {
        Box::pin(async move {
            let mut reporter = self.round_sink.as_deref().map(|sink| RoundReporter {
                sink,
                run_id: Uuid::new_v4(),
                step: 0,
                reported: transcript.len(),
            });
            let end = self.take_turn(&mut transcript, sop, reporter.as_mut()).await?;

            let (next, summary) = match end {
                TurnEnd::Finished(text) => (NextRole::Reviewing, summary_or_default(&text)),
                TurnEnd::Transferred { target, text } => {
                    let summary = if text.trim().is_empty() {
                        format!("Main agent handed control to {target}.")
                    } else {
                        text.trim().to_string()
                    };
                    (NextRole::from(target), summary)
                }
                TurnEnd::ModelUnavailable(reason) => {
                    tracing::warn!(reason = %reason, "Acting model call failed");
                    let summary = format!(
                        "Main agent could not complete the step: model request failed ({reason})."
                    );
                    (NextRole::Reviewing, summary)
                }
                TurnEnd::OutOfRounds => (
                    NextRole::Reviewing,
                    format!(
                        "Main agent stopped after {} tool rounds without finishing the step.",
                        self.settings.max_tool_rounds
                    ),
                ),
            };

            transcript.push(Message::assistant(summary).with_name(RoleId::MainAgent.as_str()));
            if let Some(reporter) = reporter.as_mut() {
                reporter.report(next, &transcript).await;
            }
            Ok(RoutingDecision::new(next, transcript))
        })
    }
}

fn summary_or_default(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        DEFAULT_ACTION_SUMMARY.to_string()
    } else {
        text.to_string()
    }
}

/// Present the shared transcript to the model as a conversation.
///
/// Only the acting role's own messages are model turns; critic feedback and
/// tool output from earlier turns come back as user text.
fn to_provider_messages(transcript: &Transcript) -> Vec<ProviderMessage> {
    if transcript.is_empty() {
        return vec![ProviderMessage::user(DEFAULT_INSTRUCTION)];
    }

    transcript
        .messages()
        .iter()
        .map(|message| match message.role {
            MessageRole::User => ProviderMessage::user(&message.content),
            MessageRole::Assistant if message.is_authored_by(CRITIC_NAME) => {
                ProviderMessage::user(&message.content)
            }
            MessageRole::Assistant => ProviderMessage::assistant(&message.content),
            MessageRole::Tool => ProviderMessage::user(format!(
                "Tool {} returned: {}",
                message.name.as_deref().unwrap_or("unknown"),
                message.content
            )),
        })
        .collect()
}
