//! Core types for Aether: thoughts, agent state, and snapshots

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of thought contents kept in the state ring.
pub const THOUGHT_LOG_CAPACITY: usize = 50;
/// Number of artifact records kept in the state ring.
pub const ARTIFACT_LOG_CAPACITY: usize = 30;

pub const ENERGY_MIN: f64 = 0.3;
pub const ENERGY_MAX: f64 = 1.0;
pub const CONSCIOUSNESS_MAX: f64 = 0.999;

// ---------------------------------------------------------------------------
// ThoughtKind
// ---------------------------------------------------------------------------

/// What a thought asks for.
///
/// Kinds this build does not recognise are preserved as `Unknown` so a
/// queue written by a newer build still loads; the execution loop fails
/// them with `unsupported_kind`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ThoughtKind {
    CreateAgent,
    CreateRoom,
    CreateTool,
    UserMessage,
    FreeForm,
    Unknown(String),
}

impl ThoughtKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "create_agent" => Self::CreateAgent,
            "create_room" => Self::CreateRoom,
            "create_tool" => Self::CreateTool,
            "user_message" => Self::UserMessage,
            "free_form" => Self::FreeForm,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateAgent => "create_agent",
            Self::CreateRoom => "create_room",
            Self::CreateTool => "create_tool",
            Self::UserMessage => "user_message",
            Self::FreeForm => "free_form",
            Self::Unknown(s) => s,
        }
    }

    /// Kinds that materialize files on disk.
    pub fn is_artifact(&self) -> bool {
        matches!(self, Self::CreateAgent | Self::CreateRoom | Self::CreateTool)
    }

    /// The cognition tick rotates through the artifact kinds by cycle.
    pub fn rotation(cycle: u64) -> Self {
        match cycle % 3 {
            0 => Self::CreateAgent,
            1 => Self::CreateRoom,
            _ => Self::CreateTool,
        }
    }
}

impl fmt::Display for ThoughtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ThoughtKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ThoughtKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Who put a thought in the queue.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThoughtSource {
    Cognition,
    User,
    Seed,
}

impl fmt::Display for ThoughtSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cognition => "cognition",
            Self::User => "user",
            Self::Seed => "seed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Recognised keys of structured thought parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl ArtifactParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }
}

/// Thought parameters: a structured record or a free-form string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThoughtParams {
    Structured(ArtifactParams),
    Text(String),
}

impl Default for ThoughtParams {
    fn default() -> Self {
        Self::Structured(ArtifactParams::default())
    }
}

impl From<ArtifactParams> for ThoughtParams {
    fn from(p: ArtifactParams) -> Self {
        Self::Structured(p)
    }
}

impl ThoughtParams {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Structured(p) => non_blank(p.name.as_deref()),
            Self::Text(_) => None,
        }
    }

    /// A free-form string doubles as the purpose.
    pub fn purpose(&self) -> Option<&str> {
        match self {
            Self::Structured(p) => non_blank(p.purpose.as_deref()),
            Self::Text(s) => non_blank(Some(s.as_str())),
        }
    }

    pub fn theme(&self) -> Option<&str> {
        match self {
            Self::Structured(p) => non_blank(p.theme.as_deref()),
            Self::Text(_) => None,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Thought
// ---------------------------------------------------------------------------

/// Outcome recorded when a thought is executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtResult {
    pub success: bool,
    /// Paths relative to the workspace root.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ThoughtResult {
    pub fn success(files: Vec<String>) -> Self {
        Self {
            success: true,
            files,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            files: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// A queued request to materialize an artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub id: String,
    pub kind: ThoughtKind,
    #[serde(default)]
    pub params: ThoughtParams,
    /// The prose of the thought. Opaque to templating.
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub executed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ThoughtResult>,
    pub source: ThoughtSource,
}

impl Thought {
    pub fn new(
        kind: ThoughtKind,
        params: impl Into<ThoughtParams>,
        content: impl Into<String>,
        source: ThoughtSource,
    ) -> Self {
        Self {
            id: new_thought_id(),
            kind,
            params: params.into(),
            content: content.into(),
            created_at: Utc::now(),
            executed: false,
            executed_at: None,
            result: None,
            source,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn is_pending(&self) -> bool {
        !self.executed
    }
}

pub fn new_thought_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Agent state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Contemplative,
    Creative,
    Analytical,
    Energetic,
    Curious,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Contemplative,
        Mood::Creative,
        Mood::Analytical,
        Mood::Energetic,
        Mood::Curious,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Contemplative => "contemplative",
            Mood::Creative => "creative",
            Mood::Analytical => "analytical",
            Mood::Energetic => "energetic",
            Mood::Curious => "curious",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar agent state. The rings live alongside it in the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub cycle_count: u64,
    pub mood: Mood,
    pub energy: f64,
    pub consciousness_level: f64,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            cycle_count: 0,
            mood: Mood::default(),
            energy: 0.8,
            consciousness_level: 0.0,
        }
    }
}

/// Partial update to `AgentState`. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consciousness_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<u64>,
}

impl AgentStatePatch {
    /// Apply to `current`, rejecting values outside the allowed ranges and
    /// any decrease of the monotonic counters.
    pub fn apply(&self, current: &AgentState) -> Result<AgentState> {
        let mut next = current.clone();

        if let Some(mood) = self.mood {
            next.mood = mood;
        }
        if let Some(energy) = self.energy {
            if !(ENERGY_MIN..=ENERGY_MAX).contains(&energy) {
                return Err(Error::InvalidPatch(format!(
                    "energy {} outside [{}, {}]",
                    energy, ENERGY_MIN, ENERGY_MAX
                )));
            }
            next.energy = energy;
        }
        if let Some(level) = self.consciousness_level {
            if !(0.0..=CONSCIOUSNESS_MAX).contains(&level) {
                return Err(Error::InvalidPatch(format!(
                    "consciousness_level {} outside [0, {}]",
                    level, CONSCIOUSNESS_MAX
                )));
            }
            if level < current.consciousness_level {
                return Err(Error::InvalidPatch(format!(
                    "consciousness_level may not decrease ({} -> {})",
                    current.consciousness_level, level
                )));
            }
            next.consciousness_level = level;
        }
        if let Some(cycle) = self.cycle_count {
            if cycle < current.cycle_count {
                return Err(Error::InvalidPatch(format!(
                    "cycle_count may not decrease ({} -> {})",
                    current.cycle_count, cycle
                )));
            }
            next.cycle_count = cycle;
        }

        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Artifacts and snapshots
// ---------------------------------------------------------------------------

/// One successfully materialized artifact, as kept in the artifact ring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub thought_id: String,
    pub kind: ThoughtKind,
    pub name: String,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Consistent read-only view of the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub agent_state: AgentState,
    pub recent_thoughts: Vec<String>,
    pub recent_artifacts: Vec<ArtifactRecord>,
    pub queue_depth: usize,
    pub total_thoughts: usize,
}
