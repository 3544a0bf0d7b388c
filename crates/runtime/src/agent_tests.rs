// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use serde_json::json;

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn merge_state_is_shallow() {
    let mut agent = AgentValue::new("a1");
    agent.state = obj(json!({"counter": 1, "nested": {"keep": true}}));

    agent.merge_state(&obj(json!({"counter": 2, "nested": {"new": 1}})));

    assert_eq!(agent.get("counter"), Some(&json!(2)));
    // Shallow merge replaces the whole nested object.
    assert_eq!(agent.get("nested"), Some(&json!({"new": 1})));
}

#[test]
fn deep_merge_preserves_nested_siblings() {
    let mut agent = AgentValue::new("a1");
    agent.state = obj(json!({"config": {"a": 1, "b": {"x": true}}, "top": 1}));

    agent.deep_merge_state(&obj(json!({"config": {"b": {"y": false}, "c": 3}})));

    assert_eq!(
        agent.get("config"),
        Some(&json!({"a": 1, "b": {"x": true, "y": false}, "c": 3}))
    );
    assert_eq!(agent.get("top"), Some(&json!(1)));
}

#[test]
fn deep_merge_overwrites_scalars() {
    let mut agent = AgentValue::new("a1");
    agent.state = obj(json!({"mode": "slow"}));
    agent.deep_merge_state(&obj(json!({"mode": "fast"})));
    assert_eq!(agent.get("mode"), Some(&json!("fast")));
}

#[test]
fn set_path_top_level() {
    let mut agent = AgentValue::new("a1");
    agent.set_path("counter", json!(5));
    assert_eq!(agent.get("counter"), Some(&json!(5)));
}

#[test]
fn set_path_creates_intermediates() {
    let mut agent = AgentValue::new("a1");
    agent.set_path("stats.today.count", json!(2));
    assert_eq!(agent.get("stats"), Some(&json!({"today": {"count": 2}})));
}

#[test]
fn set_path_replaces_non_object_intermediate() {
    let mut agent = AgentValue::new("a1");
    agent.state = obj(json!({"stats": 7}));
    agent.set_path("stats.count", json!(1));
    assert_eq!(agent.get("stats"), Some(&json!({"count": 1})));
}

#[test]
fn agent_value_serde_round_trip() {
    let agent = AgentValue::with_state("a1", obj(json!({"counter": 3})));
    let json = serde_json::to_value(&agent).unwrap();
    let back: AgentValue = serde_json::from_value(json).unwrap();
    assert_eq!(back, agent);
}
