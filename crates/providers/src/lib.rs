//! Upstream LLM provider implementations for Vouch.
//!
//! All providers implement the `vouch_core::Provider` trait. The gateway
//! builds exactly one from configuration at startup.

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatProvider;
pub use scripted::ScriptedProvider;

use std::sync::Arc;
use std::time::Duration;
use vouch_core::error::ProviderError;
use vouch_core::provider::Provider;

/// Build the configured provider.
///
/// A missing API key still yields a provider; availability checks refuse
/// to route traffic to it until a key is configured.
pub fn build_from_config(
    config: &vouch_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let settings = &config.provider;
    let provider = OpenAiCompatProvider::new(
        settings.name.clone(),
        settings.base_url.clone(),
        config.api_key.clone().unwrap_or_default(),
        Duration::from_millis(settings.request_timeout_ms),
    )?;

    tracing::debug!(
        provider = %settings.name,
        base_url = %settings.base_url,
        model = %settings.model,
        "Built upstream provider"
    );

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_default_groq_provider() {
        let config = vouch_config::AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "groq");
    }
}
