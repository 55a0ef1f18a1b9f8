//! External LLM providers.
//!
//! `ChatProvider` abstracts "prompt in, generated text out"; the registry
//! holds whichever providers have credentials configured and picks one per
//! request. Upstream failures surface as `ApiError::Generation` with no
//! automatic retry.

mod gemini;
mod openai;
mod types;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use types::{GenerationRequest, MeetingAnalysis};

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::core::settings::Settings;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name as exposed by `/chat/providers` (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate an answer for a fully composed prompt.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError>;

    /// Produce a structured analysis of a meeting transcript.
    async fn summarize_meeting(&self, transcript: &str) -> Result<MeetingAnalysis, ApiError>;
}

pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ChatProvider>>,
    default: String,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn ChatProvider>>, default: impl Into<String>) -> Self {
        Self {
            providers,
            default: default.into(),
        }
    }

    /// Build from configured credentials; providers without a key are
    /// simply absent rather than failing startup.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut providers: Vec<Arc<dyn ChatProvider>> = Vec::new();

        if let Some(key) = &settings.openai_api_key {
            providers.push(Arc::new(OpenAiProvider::new(
                key.clone(),
                settings.openai_model.clone(),
            )));
        }
        if let Some(key) = &settings.gemini_api_key {
            providers.push(Arc::new(GeminiProvider::new(
                key.clone(),
                settings.gemini_model.clone(),
            )));
        }

        if providers.is_empty() {
            tracing::warn!("No AI provider credentials found in the environment");
        }

        Self::new(providers, settings.default_provider.clone())
    }

    pub fn available(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn default_provider(&self) -> &str {
        &self.default
    }

    fn get(&self, name: &str) -> Option<Arc<dyn ChatProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Pick a provider: the hinted one when configured, else the default,
    /// else any configured one. An unknown hint falls through rather than
    /// erroring so a request never fails over a stale preference.
    pub fn resolve(&self, hint: Option<&str>) -> Result<Arc<dyn ChatProvider>, ApiError> {
        if let Some(name) = hint {
            if let Some(provider) = self.get(name) {
                return Ok(provider);
            }
            tracing::debug!("Requested provider '{}' unavailable, falling back", name);
        }

        self.get(&self.default)
            .or_else(|| self.providers.first().cloned())
            .ok_or(ApiError::ProviderUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProvider(&'static str);

    #[async_trait]
    impl ChatProvider for FakeProvider {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, ApiError> {
            Ok(format!("answer from {}", self.0))
        }

        async fn summarize_meeting(&self, _transcript: &str) -> Result<MeetingAnalysis, ApiError> {
            Ok(MeetingAnalysis::default())
        }
    }

    fn registry(names: &[&'static str], default: &str) -> ProviderRegistry {
        let providers = names
            .iter()
            .map(|n| Arc::new(FakeProvider(n)) as Arc<dyn ChatProvider>)
            .collect();
        ProviderRegistry::new(providers, default)
    }

    #[test]
    fn resolve_honors_hint_when_available() {
        let reg = registry(&["openai", "gemini"], "gemini");
        assert_eq!(reg.resolve(Some("openai")).unwrap().name(), "openai");
    }

    #[test]
    fn resolve_falls_back_to_default_on_unknown_hint() {
        let reg = registry(&["openai", "gemini"], "gemini");
        assert_eq!(reg.resolve(Some("claude")).unwrap().name(), "gemini");
    }

    #[test]
    fn resolve_uses_any_provider_when_default_missing() {
        let reg = registry(&["openai"], "gemini");
        assert_eq!(reg.resolve(None).unwrap().name(), "openai");
    }

    #[test]
    fn resolve_fails_when_nothing_configured() {
        let reg = registry(&[], "gemini");
        assert!(matches!(
            reg.resolve(None),
            Err(ApiError::ProviderUnavailable)
        ));
    }
}
