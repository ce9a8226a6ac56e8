//! Artifact error types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("unsupported thought kind: {0}")]
    UnsupportedKind(String),

    #[error("path escapes artifact root: {}", .0.display())]
    PathEscapesRoot(PathBuf),

    #[error("file already exists: {}", .0.display())]
    Collision(PathBuf),

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedKind(_) => "unsupported_kind",
            _ => "artifact_write_failed",
        }
    }
}

/// A failed artifact write, with the files removed during rollback.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct WriteFailure {
    pub error: ArtifactError,
    pub rolled_back: Vec<PathBuf>,
}
