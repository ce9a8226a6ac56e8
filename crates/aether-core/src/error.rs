//! Error types for Aether

use crate::types::ThoughtKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("duplicate thought id: {0}")]
    DuplicateThought(String),

    #[error("thought not found: {0}")]
    ThoughtNotFound(String),

    #[error("thought already executed: {0}")]
    AlreadyExecuted(String),

    #[error("invalid state patch: {0}")]
    InvalidPatch(String),

    #[error("thought kind {0} is never enqueued")]
    NotEnqueueable(ThoughtKind),

    #[error("unsupported thought kind: {0}")]
    UnsupportedKind(String),

    #[error("store io error at {}: {source}", .path.display())]
    StoreIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StoreIo {
            path: path.into(),
            source,
        }
    }

    /// Stable snake_case label, used in logs and in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "config_error",
            Self::DuplicateThought(_) => "duplicate_thought_id",
            Self::ThoughtNotFound(_) => "not_found",
            Self::AlreadyExecuted(_) => "already_executed",
            Self::InvalidPatch(_) => "invalid_patch",
            Self::NotEnqueueable(_) => "not_enqueueable",
            Self::UnsupportedKind(_) => "unsupported_kind",
            Self::StoreIo { .. } => "store_io_error",
            Self::IoError(_) => "io_error",
            Self::JsonError(_) => "json_error",
        }
    }

    /// Disk failures inside the store cannot be recovered by retrying the tick.
    pub fn is_store_io(&self) -> bool {
        matches!(self, Self::StoreIo { .. })
    }
}
