//! Aether LLM - provider adapters and the fallback-safe gateway

pub mod gateway;
pub mod openai;
pub mod provider;
pub mod types;

pub use gateway::{LlmGateway, FALLBACK_TEXT};
pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider, LlmResult};
pub use types::*;
