//! Tests for aether-core: thought model, state patches, errors, and wire protocol

use aether_core::*;
use serde_json::json;

// ===========================================================================
// ThoughtKind
// ===========================================================================

#[test]
fn thought_kind_round_trips_known_names() {
    for name in ["create_agent", "create_room", "create_tool", "user_message", "free_form"] {
        let kind = ThoughtKind::parse(name);
        assert_eq!(kind.as_str(), name);
        assert!(!matches!(kind, ThoughtKind::Unknown(_)));
    }
}

#[test]
fn thought_kind_keeps_unknown_names() {
    let kind: ThoughtKind = serde_json::from_value(json!("create_universe")).unwrap();
    assert_eq!(kind, ThoughtKind::Unknown("create_universe".into()));
    assert_eq!(serde_json::to_value(&kind).unwrap(), json!("create_universe"));
    assert!(!kind.is_artifact());
}

#[test]
fn thought_kind_rotation_cycles_artifact_kinds() {
    assert_eq!(ThoughtKind::rotation(0), ThoughtKind::CreateAgent);
    assert_eq!(ThoughtKind::rotation(1), ThoughtKind::CreateRoom);
    assert_eq!(ThoughtKind::rotation(2), ThoughtKind::CreateTool);
    assert_eq!(ThoughtKind::rotation(3), ThoughtKind::CreateAgent);
    assert_eq!(ThoughtKind::rotation(301), ThoughtKind::CreateRoom);
}

// ===========================================================================
// ThoughtParams
// ===========================================================================

#[test]
fn params_accept_structured_record() {
    let params: ThoughtParams = serde_json::from_value(json!({
        "name": "DataExpert",
        "purpose": "Data analysis",
        "extra": 1
    }))
    .unwrap();
    assert_eq!(params.name(), Some("DataExpert"));
    assert_eq!(params.purpose(), Some("Data analysis"));
    assert_eq!(params.theme(), None);
}

#[test]
fn params_accept_free_form_string() {
    let params: ThoughtParams = serde_json::from_value(json!("watch the markets")).unwrap();
    assert_eq!(params, ThoughtParams::Text("watch the markets".into()));
    assert_eq!(params.name(), None);
    assert_eq!(params.purpose(), Some("watch the markets"));
}

#[test]
fn blank_params_read_as_absent() {
    let params = ThoughtParams::from(ArtifactParams::named("   ").with_theme(""));
    assert_eq!(params.name(), None);
    assert_eq!(params.theme(), None);
}

#[test]
fn thought_serde_defaults_missing_fields() {
    let thought: Thought = serde_json::from_value(json!({
        "id": "t3",
        "kind": "create_universe",
        "created_at": "2026-01-01T00:00:00Z",
        "source": "user"
    }))
    .unwrap();
    assert!(thought.is_pending());
    assert_eq!(thought.params, ThoughtParams::default());
    assert!(thought.result.is_none());
    assert_eq!(thought.source, ThoughtSource::User);
}

#[test]
fn new_thoughts_get_unique_ids() {
    let seeded = |content: &str| {
        Thought::new(
            ThoughtKind::CreateAgent,
            ArtifactParams::default(),
            content,
            ThoughtSource::Seed,
        )
    };
    let a = seeded("a");
    let b = seeded("b");
    assert_ne!(a.id, b.id);
    assert!(!a.executed);
}

// ===========================================================================
// AgentStatePatch
// ===========================================================================

#[test]
fn patch_applies_fields() {
    let state = AgentState::default();
    let next = AgentStatePatch {
        mood: Some(Mood::Curious),
        energy: Some(0.5),
        consciousness_level: Some(0.2),
        cycle_count: Some(4),
    }
    .apply(&state)
    .unwrap();
    assert_eq!(next.mood, Mood::Curious);
    assert_eq!(next.energy, 0.5);
    assert_eq!(next.consciousness_level, 0.2);
    assert_eq!(next.cycle_count, 4);
}

#[test]
fn patch_rejects_out_of_range_energy() {
    let state = AgentState::default();
    for bad in [0.29, 1.01, f64::NAN] {
        let err = AgentStatePatch { energy: Some(bad), ..Default::default() }
            .apply(&state)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_patch");
    }
}

#[test]
fn patch_rejects_regressions() {
    let state = AgentState {
        cycle_count: 10,
        consciousness_level: 0.5,
        ..AgentState::default()
    };
    assert!(AgentStatePatch { cycle_count: Some(9), ..Default::default() }.apply(&state).is_err());
    assert!(AgentStatePatch { consciousness_level: Some(0.4), ..Default::default() }
        .apply(&state)
        .is_err());
    assert!(AgentStatePatch { consciousness_level: Some(1.0), ..Default::default() }
        .apply(&state)
        .is_err());
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_codes_follow_taxonomy() {
    assert_eq!(Error::config("x").code(), "config_error");
    assert_eq!(Error::DuplicateThought("t".into()).code(), "duplicate_thought_id");
    assert_eq!(Error::UnsupportedKind("k".into()).code(), "unsupported_kind");
    let io = Error::store_io("/x/state.json", std::io::Error::other("disk full"));
    assert_eq!(io.code(), "store_io_error");
    assert!(io.is_store_io());
    assert!(io.to_string().contains("/x/state.json"));
}

// ===========================================================================
// Protocol
// ===========================================================================

#[test]
fn user_message_response_shapes() {
    let enqueued = UserMessageResponse::Enqueued {
        enqueued: "t1".into(),
        kind: ThoughtKind::CreateRoom,
    };
    assert_eq!(
        serde_json::to_value(&enqueued).unwrap(),
        json!({"enqueued": "t1", "kind": "create_room"})
    );

    let reply = UserMessageResponse::Reply {
        reply: "hello".into(),
        source: TextSource::Fallback,
        error: Some("llm_unavailable".into()),
    };
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({"reply": "hello", "source": "fallback", "error": "llm_unavailable"})
    );
}

#[test]
fn live_event_is_tagged() {
    let event = LiveEvent::ThoughtExecuted {
        thought_id: "t1".into(),
        kind: ThoughtKind::CreateTool,
        success: false,
        files: vec![],
        error: Some("unsupported_kind".into()),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event"], "thought_executed");
    assert_eq!(value["kind"], "create_tool");
    assert_eq!(value["error"], "unsupported_kind");
}
