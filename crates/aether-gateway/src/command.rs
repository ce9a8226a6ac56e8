//! Structured chat commands
//!
//! `create agent X`, `make room Y`, `build a tool called Z` and similar
//! phrasings become artifact thoughts. Anything else is conversation.

use aether_core::{ArtifactParams, Thought, ThoughtKind, ThoughtSource};
use regex::Regex;
use std::sync::OnceLock;

/// Longest accepted name, in characters.
const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: ThoughtKind,
    pub name: String,
}

impl Command {
    /// The user thought this command enqueues. `text` becomes its content.
    pub fn into_thought(self, text: &str) -> Thought {
        Thought::new(
            self.kind,
            ArtifactParams::named(self.name),
            text.trim(),
            ThoughtSource::User,
        )
    }
}

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:please\s+)?(?:create|make|build)\s+(?:an?\s+|the\s+)?(agent|room|tool)\s+(?:named\s+|called\s+)?(.+?)\s*$",
        )
        .expect("command regex is valid")
    })
}

/// Parse `text` as a structured command. Returns `None` for free text or
/// when the name is empty after trimming quotes and punctuation.
pub fn parse_command(text: &str) -> Option<Command> {
    let caps = command_regex().captures(text)?;
    let kind = match caps[1].to_ascii_lowercase().as_str() {
        "agent" => ThoughtKind::CreateAgent,
        "room" => ThoughtKind::CreateRoom,
        "tool" => ThoughtKind::CreateTool,
        _ => return None,
    };

    let name = caps[2]
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches(['.', '!', '?'])
        .trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return None;
    }

    Some(Command {
        kind,
        name: name.to_string(),
    })
}
