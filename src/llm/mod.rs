// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod scrub;
pub mod traits;
pub mod types;

// ── Provider implementations ────────────────────────────────────────────────
pub mod factory;
pub mod gemini;

pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use traits::{Provider, messages_to_text};
pub use types::{ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason};
