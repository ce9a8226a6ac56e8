//! ArtifactWriter - materialize rendered files under the artifacts root
//!
//! Files are created with `create_new` and never overwrite. On a name
//! collision the file is retried once as `<stem>.<timestamp><ext>`. Any
//! failure rolls back every file and directory this call created.

use crate::error::{ArtifactError, WriteFailure};
use crate::templater::{ArtifactFile, RenderedArtifact};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub name: String,
    /// Absolute paths, in template order.
    pub files: Vec<PathBuf>,
}

pub struct ArtifactWriter {
    root: PathBuf,
    clock: fn() -> DateTime<Utc>,
}

impl ArtifactWriter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root,
            clock: Utc::now,
        }
    }

    /// Override the clock used for collision suffixes.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether `rel` (relative to the root) already exists.
    pub fn exists(&self, rel: &Path) -> bool {
        self.root.join(rel).exists()
    }

    pub async fn write(
        &self,
        artifact: &RenderedArtifact,
    ) -> Result<WrittenArtifact, WriteFailure> {
        let mut created = Created::default();

        for file in &artifact.files {
            match self.write_file(file, &mut created).await {
                Ok(path) => created.files.push(path),
                Err(error) => {
                    warn!(
                        artifact = %artifact.name,
                        error = %error,
                        "artifact write failed, rolling back {} file(s)",
                        created.files.len()
                    );
                    let rolled_back = created.roll_back().await;
                    return Err(WriteFailure { error, rolled_back });
                }
            }
        }

        debug!("wrote artifact {} ({} files)", artifact.name, created.files.len());
        Ok(WrittenArtifact {
            name: artifact.name.clone(),
            files: created.files,
        })
    }

    async fn write_file(
        &self,
        file: &ArtifactFile,
        created: &mut Created,
    ) -> Result<PathBuf, ArtifactError> {
        let target = self.resolve(&file.path)?;
        if let Some(parent) = target.parent() {
            created.create_dirs(parent).await?;
        }

        match create_new(&target, file.contents.as_bytes()).await {
            Ok(()) => Ok(target),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let alternate = timestamped(&target, (self.clock)());
                match create_new(&alternate, file.contents.as_bytes()).await {
                    Ok(()) => {
                        warn!(
                            "{} exists, wrote {} instead",
                            target.display(),
                            alternate.display()
                        );
                        Ok(alternate)
                    }
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        Err(ArtifactError::Collision(alternate))
                    }
                    Err(e) => Err(ArtifactError::io(alternate, e)),
                }
            }
            Err(e) => Err(ArtifactError::io(target, e)),
        }
    }

    /// Join `rel` onto the root, refusing anything that could leave it.
    fn resolve(&self, rel: &Path) -> Result<PathBuf, ArtifactError> {
        let mut out = self.root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ArtifactError::PathEscapesRoot(rel.to_path_buf()));
                }
            }
        }
        if out == self.root {
            return Err(ArtifactError::PathEscapesRoot(rel.to_path_buf()));
        }
        Ok(out)
    }
}

/// Everything one `write` call has put on disk.
#[derive(Default)]
struct Created {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl Created {
    async fn create_dirs(&mut self, dir: &Path) -> Result<(), ArtifactError> {
        let mut missing = Vec::new();
        let mut cursor = Some(dir);
        while let Some(d) = cursor {
            if fs::try_exists(d).await.unwrap_or(false) {
                break;
            }
            missing.push(d.to_path_buf());
            cursor = d.parent();
        }

        fs::create_dir_all(dir)
            .await
            .map_err(|e| ArtifactError::io(dir, e))?;

        // Outermost first, so rollback can pop innermost first.
        self.dirs.extend(missing.into_iter().rev());
        Ok(())
    }

    async fn roll_back(self) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        for file in self.files {
            match fs::remove_file(&file).await {
                Ok(()) => removed.push(file),
                Err(e) => warn!("rollback could not remove {}: {}", file.display(), e),
            }
        }
        for dir in self.dirs.into_iter().rev() {
            // Only empty directories; anything else was not ours.
            let _ = fs::remove_dir(&dir).await;
        }
        removed
    }
}

/// Create `path` exclusively, write, and fsync. A partially written file
/// is removed before the error is returned.
async fn create_new(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let result = async {
        file.write_all(contents).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = result {
        drop(file);
        let _ = fs::remove_file(path).await;
        return Err(e);
    }
    Ok(())
}

/// `main.py` → `main.<YYYYmmddHHMMSS>.py`
fn timestamped(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stamp = at.format("%Y%m%d%H%M%S").to_string();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}.{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}.{}", stem, stamp),
    };
    path.with_file_name(file_name)
}
