use super::types::{ContentBlock, MessageRole, ProviderMessage, ProviderResponse};
use crate::tools::ToolSpec;
use std::future::Future;
use std::pin::Pin;

/// Flatten a conversation for providers that only accept one prompt string.
///
/// Tool requests are dropped; tool results read as plain text under the
/// turn that carried them.
pub fn messages_to_text(messages: &[ProviderMessage]) -> String {
    let mut lines = Vec::with_capacity(messages.len());
    for message in messages {
        let text = message
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }
        let speaker = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        lines.push(format!("{speaker}: {text}"));
    }
    lines.join("\n")
}

/// Language-model text completion service.
///
/// `chat_with_system` is the judgment call the reviewing role makes;
/// `chat_with_tools` drives the acting role's tool loop. Providers without
/// native tool calling get a text-only fallback.
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "gemini").
    fn name(&self) -> &str;

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        _tools: &'a [ToolSpec],
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(async move {
            let text = messages_to_text(messages);
            let reply = self
                .chat_with_system(system_prompt, &text, model, temperature)
                .await?;
            Ok(ProviderResponse::text(reply))
        })
    }
}
