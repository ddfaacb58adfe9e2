//! Google Gemini provider.
//!
//! Authenticates with an API key from config, `GEMINI_API_KEY`, or
//! `GOOGLE_API_KEY`, in that order.

use crate::error::LlmError;
use crate::llm::{
    scrub::{sanitize_api_error, scrub_secret_patterns},
    traits::Provider,
    types::{ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason},
};
use crate::tools::ToolSpec;
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;

mod types;
use types::{
    Candidate, Content, GeminiFunctionCall, GeminiFunctionDeclaration, GeminiFunctionResponse,
    GeminiTool, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    ResponsePart,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const MAX_OUTPUT_TOKENS: u32 = 8192;

/// JSON-schema keys the function-declaration endpoint rejects.
const UNSUPPORTED_SCHEMA_KEYS: [&str; 3] = ["$schema", "additionalProperties", "default"];

pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// Authentication priority:
    /// 1. Explicit API key passed in
    /// 2. `GEMINI_API_KEY` environment variable
    /// 3. `GOOGLE_API_KEY` environment variable
    pub fn new(api_key: Option<&str>, timeout_secs: u64) -> Self {
        let resolved_key = api_key
            .filter(|key| !key.is_empty())
            .map(String::from)
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok());

        Self {
            api_key: resolved_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: build_client(timeout_secs),
        }
    }

    /// Point the provider at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn api_key(&self) -> anyhow::Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "Gemini API key not found. Options:\n\
                 1. Set GEMINI_API_KEY env var\n\
                 2. Set [llm].api_key in ~/.sop-critic/config.toml\n\
                 3. Get an API key from https://aistudio.google.com/app/apikey"
            )
        })
    }

    fn system_content(system_prompt: Option<&str>) -> Option<Content> {
        system_prompt.map(|system| Content {
            role: None,
            parts: vec![Part::text(scrub_secret_patterns(system).into_owned())],
        })
    }

    fn build_request(
        system_prompt: Option<&str>,
        message: &str,
        temperature: f64,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(scrub_secret_patterns(message).into_owned())],
            }],
            system_instruction: Self::system_content(system_prompt),
            tools: None,
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    fn build_gemini_tools(tools: &[ToolSpec]) -> Option<Vec<GeminiTool>> {
        if tools.is_empty() {
            return None;
        }

        let function_declarations = tools
            .iter()
            .map(|tool| GeminiFunctionDeclaration {
                name: tool.name.clone(),
                description: scrub_secret_patterns(&tool.description).into_owned(),
                parameters: clean_schema(&tool.parameters),
            })
            .collect();

        Some(vec![GeminiTool {
            function_declarations,
        }])
    }

    fn map_provider_message(
        provider_message: &ProviderMessage,
        tool_id_to_name: &HashMap<String, String>,
    ) -> Content {
        let role = match provider_message.role {
            MessageRole::Assistant => "model",
            MessageRole::User => "user",
        }
        .to_string();

        let parts = provider_message
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => Part::text(scrub_secret_patterns(text).into_owned()),
                ContentBlock::ToolUse { id, name, input } => {
                    Part::function_call(GeminiFunctionCall {
                        name: name.clone(),
                        args: wrap_object(input),
                        id: Some(id.clone()),
                    })
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    let tool_name = tool_id_to_name
                        .get(tool_use_id)
                        .cloned()
                        .unwrap_or_else(|| "tool".to_string());
                    Part::function_response(GeminiFunctionResponse {
                        name: tool_name,
                        response: serde_json::json!({
                            "tool_use_id": tool_use_id,
                            "content": scrub_secret_patterns(content).into_owned(),
                            "is_error": is_error,
                        }),
                    })
                }
            })
            .collect();

        Content {
            role: Some(role),
            parts,
        }
    }

    fn build_tools_request(
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        tools: &[ToolSpec],
        temperature: f64,
    ) -> GenerateContentRequest {
        // Each result is named after the closest earlier call with its id,
        // so a reused id never renames an older round's result.
        let mut tool_id_to_name = HashMap::new();
        let mut contents = Vec::with_capacity(messages.len());
        for message in messages {
            for block in &message.content {
                if let ContentBlock::ToolUse { id, name, .. } = block {
                    tool_id_to_name.insert(id.clone(), name.clone());
                }
            }
            contents.push(Self::map_provider_message(message, &tool_id_to_name));
        }

        GenerateContentRequest {
            contents,
            system_instruction: Self::system_content(system_prompt),
            tools: Self::build_gemini_tools(tools),
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    fn map_stop_reason(candidate: &Candidate) -> StopReason {
        if candidate
            .content
            .parts
            .iter()
            .any(|part| part.function_call.is_some())
        {
            return StopReason::ToolUse;
        }

        match candidate.finish_reason.as_deref() {
            Some("STOP") => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some(_) | None => StopReason::Error,
        }
    }

    fn parse_content_blocks(parts: &[ResponsePart]) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();

        for part in parts {
            if let Some(text) = &part.text
                && !text.is_empty()
            {
                blocks.push(ContentBlock::Text { text: text.clone() });
            }

            if let Some(function_call) = &part.function_call {
                // Gemini usually omits call ids; they must stay unique for the turn.
                let id = function_call
                    .id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("gemini_call_{}", Uuid::new_v4().simple()));
                blocks.push(ContentBlock::ToolUse {
                    id,
                    name: function_call.name.clone(),
                    input: wrap_object(&function_call.args),
                });
            }
        }

        blocks
    }

    fn extract_text(result: &GenerateContentResponse) -> anyhow::Result<String> {
        let text = result
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("No response from Gemini");
        }

        Ok(text)
    }

    async fn call_api_with_request(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/{}:generateContent?key={api_key}",
            self.base_url,
            Self::model_name(model)
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| request_error(&e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(request_error(&format!("({status}) {error_text}")).into());
        }

        let result: GenerateContentResponse = response.json().await?;
        if let Some(err) = result.error.as_ref() {
            return Err(request_error(&err.message).into());
        }

        Ok(result)
    }
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            function_call: None,
            function_response: None,
        }
    }

    fn function_call(function_call: GeminiFunctionCall) -> Self {
        Self {
            text: None,
            function_call: Some(function_call),
            function_response: None,
        }
    }

    fn function_response(function_response: GeminiFunctionResponse) -> Self {
        Self {
            text: None,
            function_call: None,
            function_response: Some(function_response),
        }
    }
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn request_error(message: &str) -> LlmError {
    LlmError::Request {
        provider: "gemini".to_string(),
        message: sanitize_api_error(message),
    }
}

/// Function arguments must be a JSON object on the wire.
fn wrap_object(value: &Value) -> Value {
    if value.is_object() {
        value.clone()
    } else {
        let mut wrapped = Map::new();
        wrapped.insert("input".to_string(), value.clone());
        Value::Object(wrapped)
    }
}

/// Strip schema keys the API refuses, recursively. Property names under
/// `properties` are kept even when they collide with a stripped key.
fn clean_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| {
                    let cleaned = match value {
                        Value::Object(properties) if key == "properties" => Value::Object(
                            properties
                                .iter()
                                .map(|(name, property)| (name.clone(), clean_schema(property)))
                                .collect(),
                        ),
                        _ => clean_schema(value),
                    };
                    (key.clone(), cleaned)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
        other => other.clone(),
    }
}

impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = Self::build_request(system_prompt, message, temperature);
            let result = self.call_api_with_request(model, &request).await?;
            Self::extract_text(&result)
        })
    }

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        tools: &'a [ToolSpec],
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(async move {
            let request = Self::build_tools_request(system_prompt, messages, tools, temperature);
            let result = self.call_api_with_request(model, &request).await?;

            let candidate = result
                .candidates
                .as_ref()
                .and_then(|candidates| candidates.first())
                .ok_or_else(|| anyhow::anyhow!("No response from Gemini"))?;

            let mut provider_response = ProviderResponse::from_blocks(
                Self::parse_content_blocks(&candidate.content.parts),
                Self::map_stop_reason(candidate),
            );
            if let Some(usage) = &result.usage_metadata {
                provider_response = provider_response
                    .with_usage(usage.prompt_token_count, usage.candidates_token_count);
            }
            if let Some(model_version) = &result.model_version {
                provider_response = provider_response.with_model(model_version.clone());
            }

            Ok(provider_response)
        })
    }
}
