//! Provider factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use crate::agent::config::RagConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::ConfigError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default): `OpenAI` and any OpenAI-compatible server via `async-openai`
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &RagConfig) -> Result<Box<dyn LlmProvider>, ConfigError> {
    match config.provider.to_ascii_lowercase().as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config))),
        _ => Err(ConfigError::UnsupportedProvider {
            name: config.provider.clone(),
        }),
    }
}
