//! Cognition tick - consult the model, enqueue one thought, evolve state
//!
//! The thought and the state update land in the store together. When the
//! queue reaches the high-water mark the tick stops producing until the
//! queue drains below the low-water mark.

use crate::prose::{consciousness_boost, fallback_pool, mood_neighbours, MOOD_SHIFT_PROBABILITY};
use crate::store::Store;
use aether_core::config::QueueSettings;
use aether_core::{
    AgentState, AgentStatePatch, ArtifactParams, Error, LiveEvent, Mood, Result, TextSource,
    Thought, ThoughtKind, ThoughtSource, CONSCIOUSNESS_MAX, ENERGY_MAX, ENERGY_MIN,
};
use aether_llm::{Generation, LlmGateway};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest thought content kept, in characters.
pub const MAX_CONTENT_CHARS: usize = 280;
const MAX_HINT_CHARS: usize = 80;
const PROMPT_RECENT_THOUGHTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Enqueued { thought: Thought, state: AgentState },
    /// Backpressure: nothing was asked, enqueued or changed.
    Paused { queue_depth: usize },
    /// Shutdown arrived while waiting on the model; nothing was changed.
    Cancelled,
}

pub struct Cognition {
    store: Arc<Store>,
    llm: Arc<LlmGateway>,
    events: broadcast::Sender<LiveEvent>,
    queue: QueueSettings,
    name: String,
    rng: Mutex<StdRng>,
    paused: AtomicBool,
}

impl Cognition {
    pub fn new(
        store: Arc<Store>,
        llm: Arc<LlmGateway>,
        events: broadcast::Sender<LiveEvent>,
        queue: QueueSettings,
    ) -> Self {
        Self {
            store,
            llm,
            events,
            queue,
            name: "Aether".to_string(),
            rng: Mutex::new(StdRng::from_os_rng()),
            paused: AtomicBool::new(false),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fix the random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub async fn tick(&self) -> Result<TickOutcome> {
        self.tick_until(&CancellationToken::new()).await
    }

    /// Like `tick`, but gives up at the model call once `cancel` fires.
    pub async fn tick_until(&self, cancel: &CancellationToken) -> Result<TickOutcome> {
        let depth = self.store.queue_depth().await;
        if self.should_pause(depth) {
            return Ok(TickOutcome::Paused { queue_depth: depth });
        }

        let state = self.store.agent_state().await;
        let recent = self.store.recent_thoughts(PROMPT_RECENT_THOUGHTS).await;
        let kind = ThoughtKind::rotation(state.cycle_count);

        let system = self.system_prompt();
        let prompt = user_prompt(&state, &recent, &kind);
        let generation = tokio::select! {
            _ = cancel.cancelled() => return Ok(TickOutcome::Cancelled),
            g = self.llm.ask(&system, &prompt) => g,
        };

        let (content, params) = self.interpret(&generation, state.mood);
        let patch = self.evolve(&state, &generation);

        let mut thought = Thought::new(kind, params, content, ThoughtSource::Cognition);
        let committed = match self
            .store
            .commit_cognition(thought.clone(), &patch, self.queue.high_water)
            .await
        {
            Err(Error::DuplicateThought(id)) => {
                warn!(thought_id = %id, "duplicate thought id, retrying with a new id");
                thought = thought.with_id(aether_core::new_thought_id());
                self.store
                    .commit_cognition(thought.clone(), &patch, self.queue.high_water)
                    .await?
            }
            other => other?,
        };

        let Some(state) = committed else {
            // A concurrent producer filled the queue after the depth check.
            self.paused.store(true, Ordering::SeqCst);
            let queue_depth = self.store.queue_depth().await;
            info!(queue_depth, "queue at high-water mark, cognition paused");
            return Ok(TickOutcome::Paused { queue_depth });
        };

        info!(
            thought_id = %thought.id,
            kind = %thought.kind,
            source = %generation.source,
            cycle = state.cycle_count,
            "cognition enqueued thought"
        );

        let _ = self.events.send(LiveEvent::ThoughtEnqueued {
            thought_id: thought.id.clone(),
            kind: thought.kind.clone(),
            source: thought.source,
            content: thought.content.clone(),
        });
        let _ = self.events.send(LiveEvent::StateUpdated {
            state: state.clone(),
        });

        Ok(TickOutcome::Enqueued { thought, state })
    }

    /// Hysteresis between the high- and low-water marks.
    fn should_pause(&self, depth: usize) -> bool {
        if self.paused.load(Ordering::SeqCst) {
            if depth < self.queue.low_water {
                self.paused.store(false, Ordering::SeqCst);
                info!(queue_depth = depth, "queue drained, cognition resumed");
                return false;
            }
            debug!(queue_depth = depth, "cognition paused");
            return true;
        }
        if depth >= self.queue.high_water {
            self.paused.store(true, Ordering::SeqCst);
            info!(queue_depth = depth, "queue at high-water mark, cognition paused");
            return true;
        }
        false
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are {}, an autonomous digital being that creates agents, rooms and tools. \
             Reply with one short thought of one or two sentences. \
             You may add hints on their own lines as `name: ...`, `purpose: ...` or `theme: ...`.",
            self.name
        )
    }

    /// Thought content and params from a generation. Fallback text and
    /// replies with no usable line draw content from the mood's pool.
    fn interpret(&self, generation: &Generation, mood: Mood) -> (String, ArtifactParams) {
        let parsed = match generation.source {
            TextSource::Llm => parse_reply(&generation.text),
            TextSource::Fallback => ParsedReply::default(),
        };
        let content = match parsed.content {
            Some(content) => content,
            None => {
                let pool = fallback_pool(mood);
                let idx = self.with_rng(|rng| rng.random_range(0..pool.len()));
                pool[idx].to_string()
            }
        };
        (content, parsed.params)
    }

    /// Next agent state: one more cycle, a bounded energy walk, a possible
    /// mood shift, and a consciousness boost.
    fn evolve(&self, state: &AgentState, generation: &Generation) -> AgentStatePatch {
        let (delta, shift, pick) = self.with_rng(|rng| {
            (
                rng.random_range(-0.1..=0.2),
                rng.random_bool(MOOD_SHIFT_PROBABILITY),
                rng.random_range(0..usize::MAX),
            )
        });

        let energy = round3((state.energy + delta).clamp(ENERGY_MIN, ENERGY_MAX));

        let mood = if shift {
            let neighbours = mood_neighbours(state.mood);
            neighbours[pick % neighbours.len()]
        } else {
            state.mood
        };

        let boost = consciousness_boost(&generation.text, generation.source);
        let consciousness = round3((state.consciousness_level + boost).min(CONSCIOUSNESS_MAX))
            .max(state.consciousness_level);

        AgentStatePatch {
            mood: Some(mood),
            energy: Some(energy),
            consciousness_level: Some(consciousness),
            cycle_count: Some(state.cycle_count + 1),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

fn user_prompt(state: &AgentState, recent: &[String], kind: &ThoughtKind) -> String {
    let mut prompt = format!(
        "Cycle {}. Mood: {}. Energy: {:.2}.\n",
        state.cycle_count, state.mood, state.energy
    );
    if !recent.is_empty() {
        prompt.push_str("Recent thoughts:\n");
        for thought in recent {
            prompt.push_str("- ");
            prompt.push_str(thought);
            prompt.push('\n');
        }
    }
    let noun = match kind {
        ThoughtKind::CreateRoom => "room",
        ThoughtKind::CreateTool => "tool",
        _ => "agent",
    };
    prompt.push_str(&format!("What {} will you create next?", noun));
    prompt
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[derive(Debug, Default, PartialEq)]
pub struct ParsedReply {
    pub content: Option<String>,
    pub params: ArtifactParams,
}

fn hint_regex() -> &'static Regex {
    static HINT: OnceLock<Regex> = OnceLock::new();
    HINT.get_or_init(|| {
        Regex::new(r"(?i)\b(name|theme|purpose)\s*:\s*([^\n,;]+)").expect("hint regex is valid")
    })
}

/// Split a model reply into thought content and `name:`/`theme:`/`purpose:`
/// hints. The first occurrence of each hint wins.
pub fn parse_reply(text: &str) -> ParsedReply {
    let mut params = ArtifactParams::default();
    for caps in hint_regex().captures_iter(text) {
        let value = clean(&caps[2], MAX_HINT_CHARS);
        if value.is_empty() {
            continue;
        }
        let slot = match caps[1].to_ascii_lowercase().as_str() {
            "name" => &mut params.name,
            "theme" => &mut params.theme,
            _ => &mut params.purpose,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    let content = text
        .lines()
        .map(|line| clean(&hint_regex().replace_all(line, ""), MAX_CONTENT_CHARS))
        .find(|line| !line.is_empty());

    ParsedReply { content, params }
}

/// Trim whitespace, quotes and trailing separators, then cap the length.
fn clean(s: &str, max_chars: usize) -> String {
    let trimmed = s
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':'));
    trimmed.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_reply() {
        let parsed = parse_reply("  A quiet observatory would help me think.  ");
        assert_eq!(parsed.content.as_deref(), Some("A quiet observatory would help me think"));
        assert_eq!(parsed.params, ArtifactParams::default());
    }

    #[test]
    fn parse_hints_on_own_lines() {
        let parsed = parse_reply(
            "I want a place to rest.\nname: Nebula Lounge\ntheme: cosmic\npurpose: Calm reflection",
        );
        assert_eq!(parsed.content.as_deref(), Some("I want a place to rest"));
        assert_eq!(parsed.params.name.as_deref(), Some("Nebula Lounge"));
        assert_eq!(parsed.params.theme.as_deref(), Some("cosmic"));
        assert_eq!(parsed.params.purpose.as_deref(), Some("Calm reflection"));
    }

    #[test]
    fn parse_inline_hints() {
        let parsed = parse_reply("Build a scout, Name: Scout; purpose: map the web");
        assert_eq!(parsed.params.name.as_deref(), Some("Scout"));
        assert_eq!(parsed.params.purpose.as_deref(), Some("map the web"));
        assert_eq!(parsed.content.as_deref(), Some("Build a scout"));
    }

    #[test]
    fn first_hint_wins() {
        let parsed = parse_reply("name: first\nname: second");
        assert_eq!(parsed.params.name.as_deref(), Some("first"));
        assert_eq!(parsed.content, None);
    }

    #[test]
    fn parse_empty_reply() {
        assert_eq!(parse_reply("   \n  "), ParsedReply::default());
    }

    #[test]
    fn content_is_capped() {
        let long = "x".repeat(1000);
        assert_eq!(parse_reply(&long).content.unwrap().chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn prompt_mentions_state_and_recent() {
        let state = AgentState {
            cycle_count: 4,
            mood: Mood::Curious,
            energy: 0.5,
            consciousness_level: 0.1,
        };
        let prompt = user_prompt(&state, &["one".into(), "two".into()], &ThoughtKind::CreateRoom);
        assert!(prompt.contains("Cycle 4"));
        assert!(prompt.contains("curious"));
        assert!(prompt.contains("0.50"));
        assert!(prompt.contains("- one\n- two"));
        assert!(prompt.ends_with("What room will you create next?"));
    }

    #[test]
    fn round3_rounds() {
        assert_eq!(round3(0.0080000001), 0.008);
        assert_eq!(round3(0.1234), 0.123);
    }
}
