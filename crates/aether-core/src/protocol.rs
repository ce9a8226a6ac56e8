//! Dashboard wire protocol
//!
//! HTTP:
//!   GET  /snapshot                 → `Snapshot`
//!   POST /user_message {"text"}    → `{"enqueued": id}` or `{"reply", "source"}`
//!   GET  /health                   → `{"ok": true, "queue_depth", "cycle_count"}`
//!
//! WebSocket `/ws` pushes `LiveEvent`s, one JSON object per text frame:
//!   { "event": "thought_executed", "thought_id": "...", "success": true, ... }

use crate::types::{AgentState, ThoughtKind, ThoughtSource};
use serde::{Deserialize, Serialize};

/// Where generated text came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Llm,
    Fallback,
}

impl TextSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for TextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UserMessageResponse {
    Enqueued {
        enqueued: String,
        kind: ThoughtKind,
    },
    Reply {
        reply: String,
        source: TextSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub ok: bool,
    pub queue_depth: usize,
    pub cycle_count: u64,
}

/// Structured error body returned by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Events pushed to live dashboard clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LiveEvent {
    ThoughtEnqueued {
        thought_id: String,
        kind: ThoughtKind,
        source: ThoughtSource,
        content: String,
    },
    ThoughtExecuted {
        thought_id: String,
        kind: ThoughtKind,
        success: bool,
        files: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    StateUpdated {
        state: AgentState,
    },
}
