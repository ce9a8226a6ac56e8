//! Templater - pure mapping from a thought to the files of its artifact
//!
//! Rendering does no I/O. The only outside input is the `is_taken`
//! predicate, which tells the templater whether an artifact directory
//! already exists so it can pick a fresh name.

use crate::error::ArtifactError;
use crate::naming::{generated_name, normalize_name, pascal_case, stable_pick};
use crate::templates::{agent, room, tool};
use aether_core::{Thought, ThoughtKind};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// One file of a rendered artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactFile {
    /// Relative to the artifacts root.
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub thought_id: String,
    pub kind: ThoughtKind,
    /// Normalized directory name.
    pub name: String,
    pub files: Vec<ArtifactFile>,
}

/// Everything a template module needs to produce its files.
#[derive(Clone, Debug)]
pub struct TemplateContext<'a> {
    pub thought_id: &'a str,
    /// Normalized, collision-free directory name.
    pub name: &'a str,
    /// Name as requested, or the generated name when none was given.
    pub display_name: &'a str,
    /// PascalCase identifier derived from `name`.
    pub class_name: String,
    pub purpose: String,
    pub theme: String,
    pub created_by: &'a str,
    pub created_at: DateTime<Utc>,
}

pub const THEMES: &[&str] = &["cosmic", "neon", "forest", "ocean", "crystal", "ember"];

pub struct Templater {
    created_by: String,
}

impl Default for Templater {
    fn default() -> Self {
        Self::new("Aether")
    }
}

impl Templater {
    pub fn new(created_by: impl Into<String>) -> Self {
        Self {
            created_by: created_by.into(),
        }
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Render `thought` into files. `is_taken` receives an artifact
    /// directory relative to the artifacts root (e.g. `agents/scout`).
    pub fn render(
        &self,
        thought: &Thought,
        is_taken: impl Fn(&Path) -> bool,
    ) -> Result<RenderedArtifact, ArtifactError> {
        let (subtree, noun) = match &thought.kind {
            ThoughtKind::CreateAgent => ("agents", "agent"),
            ThoughtKind::CreateRoom => ("rooms", "room"),
            ThoughtKind::CreateTool => ("tools", "tool"),
            _ => return Err(ArtifactError::UnsupportedKind(thought.kind.to_string())),
        };

        let generated = generated_name(thought.kind.as_str(), thought.created_at);
        let requested = thought.params.name();
        let name = resolve_name(
            requested.and_then(normalize_name),
            &generated,
            |candidate| is_taken(&Path::new(subtree).join(candidate)),
        );

        let ctx = TemplateContext {
            thought_id: &thought.id,
            name: &name,
            display_name: requested.unwrap_or(&generated),
            class_name: pascal_case(&name),
            purpose: thought
                .params
                .purpose()
                .map(str::to_string)
                .unwrap_or_else(|| default_purpose(noun, &thought.id)),
            theme: thought
                .params
                .theme()
                .map(str::to_string)
                .unwrap_or_else(|| stable_pick(THEMES, &thought.id).to_string()),
            created_by: &self.created_by,
            created_at: thought.created_at,
        };

        let rendered = match &thought.kind {
            ThoughtKind::CreateAgent => agent::render(&ctx),
            ThoughtKind::CreateRoom => room::render(&ctx),
            _ => tool::render(&ctx),
        };

        let dir = Path::new(subtree).join(&name);
        let files = rendered
            .into_iter()
            .map(|(file, contents)| ArtifactFile {
                path: dir.join(file),
                contents,
            })
            .collect();

        Ok(RenderedArtifact {
            thought_id: thought.id.clone(),
            kind: thought.kind.clone(),
            name,
            files,
        })
    }
}

/// Requested name if free, else the generated name, else the generated
/// name with the first free `_<n>` suffix.
fn resolve_name(
    requested: Option<String>,
    generated: &str,
    is_taken: impl Fn(&str) -> bool,
) -> String {
    if let Some(name) = requested {
        if !is_taken(&name) {
            return name;
        }
    }
    if !is_taken(generated) {
        return generated.to_string();
    }
    (2u32..)
        .map(|n| format!("{}_{}", generated, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| generated.to_string())
}

fn default_purpose(noun: &str, thought_id: &str) -> String {
    let short: String = thought_id.chars().take(8).collect();
    format!("An autonomous {} conceived in thought {}", noun, short)
}
