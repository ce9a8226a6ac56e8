//! LLM request and response types

use aether_core::TextSource;
use serde::{Deserialize, Serialize};

/// LLM request
#[derive(Clone, Debug, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for LlmRequest {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            messages: Vec::new(),
            max_tokens: Some(256),
            temperature: None,
        }
    }
}

/// Message in an LLM conversation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// Text produced by the gateway, tagged with where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub source: TextSource,
}

impl Generation {
    pub fn llm(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: TextSource::Llm }
    }

    pub fn fallback(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: TextSource::Fallback }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == TextSource::Fallback
    }
}
