#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::json;
use sop_critic::agent::{
    ActingRole, ActingSettings, CriticSettings, NextRole, PromptTemplates, ReviewingRole, Role,
    RoleId, RoutingDecision,
};
use sop_critic::llm::{ContentBlock, Provider, ProviderMessage, ProviderResponse, StopReason};
use sop_critic::tools::{Tool, ToolRegistry, ToolResult, ToolSpec, TransferTool};
use sop_critic::transcript::{Message, SopDocument, Transcript};

/// What the scripted model does on one call.
pub enum Scripted<T> {
    Reply(T),
    Fail(&'static str),
    /// Never answers; exercises timeouts.
    Hang,
}

/// A model whose acting turns and judgments are queued up front.
///
/// An empty acting queue ends the turn with no text; an empty judgment
/// queue approves.
#[derive(Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Scripted<ProviderResponse>>>,
    judgments: Mutex<VecDeque<Scripted<String>>>,
    seen_turns: Mutex<Vec<Vec<ProviderMessage>>>,
    seen_system_prompts: Mutex<Vec<Option<String>>>,
    seen_judgments: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turn(self, turn: ProviderResponse) -> Self {
        self.push_turn(Scripted::Reply(turn))
    }

    pub fn push_turn(self, turn: Scripted<ProviderResponse>) -> Self {
        lock(&self.turns).push_back(turn);
        self
    }

    pub fn judgment(self, reply: &str) -> Self {
        self.push_judgment(Scripted::Reply(reply.to_string()))
    }

    pub fn push_judgment(self, judgment: Scripted<String>) -> Self {
        lock(&self.judgments).push_back(judgment);
        self
    }

    pub fn seen_turns(&self) -> Vec<Vec<ProviderMessage>> {
        lock(&self.seen_turns).clone()
    }

    pub fn seen_system_prompts(&self) -> Vec<Option<String>> {
        lock(&self.seen_system_prompts).clone()
    }

    pub fn seen_judgments(&self) -> Vec<String> {
        lock(&self.seen_judgments).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn resolve<T>(scripted: Scripted<T>) -> anyhow::Result<T> {
    match scripted {
        Scripted::Reply(value) => Ok(value),
        Scripted::Fail(message) => Err(anyhow::anyhow!(message)),
        Scripted::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(anyhow::anyhow!("scripted hang elapsed"))
        }
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat_with_system<'a>(
        &'a self,
        _system_prompt: Option<&'a str>,
        message: &'a str,
        _model: &'a str,
        _temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            lock(&self.seen_judgments).push(message.to_string());
            let next = lock(&self.judgments)
                .pop_front()
                .unwrap_or_else(|| Scripted::Reply("OK".to_string()));
            resolve(next).await
        })
    }

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        _tools: &'a [ToolSpec],
        _model: &'a str,
        _temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(async move {
            lock(&self.seen_system_prompts).push(system_prompt.map(str::to_string));
            lock(&self.seen_turns).push(messages.to_vec());
            let next = lock(&self.turns)
                .pop_front()
                .unwrap_or_else(|| Scripted::Reply(end_turn_text("")));
            resolve(next).await
        })
    }
}

pub fn end_turn_text(text: &str) -> ProviderResponse {
    ProviderResponse {
        text: text.to_string(),
        input_tokens: None,
        output_tokens: None,
        model: None,
        content_blocks: vec![],
        stop_reason: Some(StopReason::EndTurn),
    }
}

/// One model response requesting every `(id, tool, args)` call in order.
pub fn tool_calls(calls: &[(&str, &str, serde_json::Value)]) -> ProviderResponse {
    ProviderResponse {
        text: String::new(),
        input_tokens: None,
        output_tokens: None,
        model: None,
        content_blocks: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: (*id).to_string(),
                name: (*name).to_string(),
                input: input.clone(),
            })
            .collect(),
        stop_reason: Some(StopReason::ToolUse),
    }
}

pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> ProviderResponse {
    tool_calls(&[(id, name, input)])
}

/// Echoes its `text` argument.
pub struct EchoTool;

impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given text"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {"text": {"type": "string"}},
            "required": ["text"]
        })
    }

    fn execute<'a>(
        &'a self,
        args: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>> {
        Box::pin(async move {
            let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(ToolResult::ok(text))
        })
    }
}

/// Echo plus both transfer tools.
pub fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new(Duration::from_secs(10));
    registry.register(Arc::new(EchoTool));
    for role in RoleId::ALL {
        registry.register(Arc::new(TransferTool::new(role.as_str())));
    }
    Arc::new(registry)
}

/// Echo only, as a solo turn sees it.
pub fn solo_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new(Duration::from_secs(10));
    registry.register(Arc::new(EchoTool));
    Arc::new(registry)
}

pub fn acting_settings() -> ActingSettings {
    ActingSettings {
        model: "scripted-model".into(),
        temperature: 0.0,
        max_tool_rounds: 6,
        request_timeout: Duration::from_secs(10),
    }
}

pub fn critic_settings() -> CriticSettings {
    CriticSettings {
        model: "scripted-model".into(),
        temperature: 0.0,
        timeout: Duration::from_secs(10),
    }
}

pub fn prompts() -> Arc<PromptTemplates> {
    Arc::new(PromptTemplates::new().unwrap())
}

pub fn acting_role(
    provider: &Arc<ScriptedProvider>,
    registry: Arc<ToolRegistry>,
    settings: ActingSettings,
) -> Arc<ActingRole> {
    Arc::new(ActingRole::new(
        Arc::clone(provider) as Arc<dyn Provider>,
        registry,
        prompts(),
        settings,
    ))
}

pub fn reviewing_role(
    provider: &Arc<ScriptedProvider>,
    settings: CriticSettings,
) -> Arc<ReviewingRole> {
    Arc::new(ReviewingRole::new(
        Arc::clone(provider) as Arc<dyn Provider>,
        prompts(),
        settings,
    ))
}

pub fn sop() -> SopDocument {
    SopDocument::new("1. Open the forecast page.\n2. Report the weather.")
}

/// A role that ignores the model and returns whatever `decide` builds.
pub struct FakeRole<F> {
    pub id: RoleId,
    pub decide: F,
}

impl<F> FakeRole<F>
where
    F: Fn(Transcript) -> anyhow::Result<RoutingDecision> + Send + Sync,
{
    pub fn new(id: RoleId, decide: F) -> Self {
        Self { id, decide }
    }
}

impl<F> Role for FakeRole<F>
where
    F: Fn(Transcript) -> anyhow::Result<RoutingDecision> + Send + Sync,
{
    fn id(&self) -> RoleId {
        self.id
    }

    fn run<'a>(
        &'a self,
        transcript: Transcript,
        _sop: &'a SopDocument,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<RoutingDecision>> + Send + 'a>> {
        Box::pin(async move { (self.decide)(transcript) })
    }
}

/// A well-behaved acting stand-in: appends one action and asks for review.
pub fn stub_acting(action: &'static str) -> Arc<dyn Role> {
    Arc::new(FakeRole::new(RoleId::MainAgent, move |mut transcript| {
        transcript.push(Message::assistant(action).with_name("main_agent"));
        Ok(RoutingDecision::new(NextRole::Reviewing, transcript))
    }))
}
