//! LlmGateway - the only way the rest of Aether talks to a model.
//!
//! Wraps an optional provider with a timeout and converts every failure
//! (timeout, non-2xx, unparseable or empty body) into a fixed fallback
//! text. `generate` never returns an error and never retries.

use crate::openai::OpenAiProvider;
use crate::provider::{LlmError, LlmProvider};
use crate::types::{Generation, LlmMessage, LlmRequest};
use aether_core::config::LlmSettings;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Returned whenever the model cannot be reached or answers with nothing usable.
pub const FALLBACK_TEXT: &str =
    "The channel is quiet right now. I will keep working with what I already know.";

pub struct LlmGateway {
    provider: Option<Arc<dyn LlmProvider>>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    fallback_text: String,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::disabled()
        }
        .with_model(model)
    }

    /// A gateway with no provider: every call returns the fallback text.
    pub fn disabled() -> Self {
        let defaults = LlmSettings::default();
        Self {
            provider: None,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            timeout: Duration::from_secs(defaults.timeout_secs),
            fallback_text: FALLBACK_TEXT.to_string(),
        }
    }

    /// Build from configuration. No endpoint means a disabled gateway.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let gateway = match &settings.endpoint {
            Some(endpoint) => {
                let mut provider = OpenAiProvider::new(endpoint);
                if let Some(key) = &settings.api_key {
                    provider = provider.with_api_key(key);
                }
                Self::new(Arc::new(provider), &settings.model)
            }
            None => {
                warn!("LLM_ENDPOINT not set; cognition will run on fallback text");
                Self::disabled().with_model(&settings.model)
            }
        };
        gateway
            .with_max_tokens(settings.max_tokens)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = text.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn fallback_text(&self) -> &str {
        &self.fallback_text
    }

    /// Generate with the configured token budget and timeout.
    pub async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Generation {
        self.generate(system_prompt, user_prompt, self.max_tokens, self.timeout)
            .await
    }

    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Generation {
        match self.try_generate(system_prompt, user_prompt, max_tokens, timeout).await {
            Ok(text) => {
                debug!("llm reply: {} chars", text.len());
                Generation::llm(text)
            }
            Err(LlmError::NotConfigured) => Generation::fallback(&self.fallback_text),
            Err(e) => {
                warn!(error = %e, "llm_unavailable, using fallback text");
                Generation::fallback(&self.fallback_text)
            }
        }
    }

    async fn try_generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let provider = self.provider.as_ref().ok_or(LlmError::NotConfigured)?;

        let request = LlmRequest {
            model: self.model.clone(),
            messages: vec![LlmMessage::system(system_prompt), LlmMessage::user(user_prompt)],
            max_tokens: Some(max_tokens),
            temperature: None,
        };

        let text = tokio::time::timeout(timeout, provider.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(timeout))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".into()));
        }
        Ok(text.to_string())
    }
}
