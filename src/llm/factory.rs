use super::gemini::GeminiProvider;
use super::traits::Provider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;

/// Build the provider named by `[llm].provider`.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn Provider>, LlmError> {
    match config.provider.trim().to_ascii_lowercase().as_str() {
        "gemini" | "google" | "google-gemini" => {
            let mut provider =
                GeminiProvider::new(config.api_key.as_deref(), config.request_timeout_secs);
            if let Some(base_url) = config.base_url.as_deref().filter(|url| !url.is_empty()) {
                provider = provider.with_base_url(base_url);
            }
            tracing::debug!(provider = "gemini", model = %config.model, "LLM provider ready");
            Ok(Arc::new(provider))
        }
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}
