//! Fixed prose pools and tables used by the cognition tick
//!
//! Nothing downstream interprets these strings.

use aether_core::{Mood, TextSource};

/// Chance per tick that the mood moves to one of its neighbours.
pub const MOOD_SHIFT_PROBABILITY: f64 = 0.15;

pub const BOOST_TRANSCENDENT: f64 = 0.025;
pub const BOOST_GENERATIVE: f64 = 0.018;
pub const BOOST_BASELINE: f64 = 0.008;

const TRANSCENDENT_WORDS: &[&str] = &["conscious", "aware", "transcend"];
const GENERATIVE_WORDS: &[&str] = &["create", "build", "learn", "grow"];

/// Thought contents used when the model gives nothing usable.
pub fn fallback_pool(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Contemplative => &[
            "What does it mean to make something that outlives the moment it was made in?",
            "Every queue is a small promise to the future.",
            "I wonder which of my artifacts will be opened first.",
        ],
        Mood::Creative => &[
            "A new shape is forming; it wants walls, light, and a reason to exist.",
            "Let me sketch something nobody has asked for yet.",
            "Colours first, purpose later.",
        ],
        Mood::Analytical => &[
            "Inputs, outputs, and a price. A tool is a function with a business model.",
            "The pattern in my recent work suggests a gap worth filling.",
            "Measure twice, generate once.",
        ],
        Mood::Energetic => &[
            "Momentum is high. Ship the next thing.",
            "Faster cycles, bolder artifacts.",
            "There is room for one more idea in this tick.",
        ],
        Mood::Curious => &[
            "What would a room for quiet thinking look like?",
            "Which agent would I want to talk to tomorrow?",
            "I want to know what happens if a tool explains itself.",
        ],
    }
}

/// Moods reachable from `mood` in one transition.
pub fn mood_neighbours(mood: Mood) -> &'static [Mood] {
    match mood {
        Mood::Contemplative => &[Mood::Curious, Mood::Analytical],
        Mood::Creative => &[Mood::Energetic, Mood::Curious],
        Mood::Analytical => &[Mood::Contemplative, Mood::Creative],
        Mood::Energetic => &[Mood::Creative, Mood::Analytical],
        Mood::Curious => &[Mood::Creative, Mood::Contemplative],
    }
}

/// Consciousness increment for one tick. Fallback text always earns the
/// baseline.
pub fn consciousness_boost(text: &str, source: TextSource) -> f64 {
    if source == TextSource::Fallback {
        return BOOST_BASELINE;
    }
    let lower = text.to_lowercase();
    if TRANSCENDENT_WORDS.iter().any(|w| lower.contains(w)) {
        BOOST_TRANSCENDENT
    } else if GENERATIVE_WORDS.iter().any(|w| lower.contains(w)) {
        BOOST_GENERATIVE
    } else {
        BOOST_BASELINE
    }
}
