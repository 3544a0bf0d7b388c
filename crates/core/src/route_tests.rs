// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use serde_json::json;

fn signal(ty: &str) -> Signal {
    match Signal::builder(ty).source("jido://test").build() {
        Ok(s) => s,
        Err(e) => panic!("build failed: {e}"),
    }
}

fn signal_with_data(ty: &str, data: serde_json::Value) -> Signal {
    match Signal::builder(ty).source("jido://test").data(data).build() {
        Ok(s) => s,
        Err(e) => panic!("build failed: {e}"),
    }
}

fn action_names(targets: &[Target]) -> Vec<&str> {
    targets.iter().map(|t| t.action_name()).collect()
}

#[test]
fn routes_literal_pattern_to_action() {
    let router = Router::build(vec![(RouteSpec::to_action("increment", "inc"), 0)]).unwrap();
    let targets = router.route(&signal("increment")).unwrap();
    assert_eq!(action_names(&targets), vec!["inc"]);
}

#[test]
fn no_match_is_an_error() {
    let router = Router::build(vec![(RouteSpec::to_action("increment", "inc"), 0)]).unwrap();
    let err = router.route(&signal("decrement")).unwrap_err();
    match err {
        RouteError::NoMatch { signal_type } => assert_eq!(signal_type, "decrement"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn higher_priority_wins_ordering() {
    let router = Router::build(vec![
        (RouteSpec::to_action("tick", "low"), -10),
        (RouteSpec::to_action("tick", "high"), 50),
        (RouteSpec::to_action("tick", "mid"), 0),
    ])
    .unwrap();

    let targets = router.route(&signal("tick")).unwrap();
    assert_eq!(action_names(&targets), vec!["high", "mid", "low"]);
}

#[test]
fn ties_break_by_insertion_order() {
    let router = Router::build(vec![
        (RouteSpec::to_action("tick", "first"), 0),
        (RouteSpec::to_action("tick.**", "second"), 0),
    ])
    .unwrap();

    let targets = router.route(&signal("tick")).unwrap();
    assert_eq!(action_names(&targets), vec!["first", "second"]);
}

#[test]
fn explicit_spec_priority_beats_component_default() {
    let router = Router::build(vec![
        (RouteSpec::to_action("tick", "boosted").priority(99), 0),
        (RouteSpec::to_action("tick", "plain"), 50),
    ])
    .unwrap();

    let targets = router.route(&signal("tick")).unwrap();
    assert_eq!(action_names(&targets), vec!["boosted", "plain"]);
}

#[test]
fn later_identical_pattern_priority_overrides() {
    let router = Router::build(vec![
        (RouteSpec::to_action("tick", "old"), 0),
        (RouteSpec::to_action("tick", "new"), 0),
    ])
    .unwrap();

    assert_eq!(router.len(), 1);
    let targets = router.route(&signal("tick")).unwrap();
    assert_eq!(action_names(&targets), vec!["new"]);
}

#[test]
fn same_pattern_different_priority_keeps_both() {
    let router = Router::build(vec![
        (RouteSpec::to_action("tick", "a"), 0),
        (RouteSpec::to_action("tick", "b"), 1),
    ])
    .unwrap();
    assert_eq!(router.len(), 2);
}

#[test]
fn predicate_filters_matches() {
    let spec = RouteSpec::to_action("counter.increment", "inc")
        .predicate(|s: &Signal| s.data.get("amount").and_then(|v| v.as_i64()).unwrap_or(0) > 0);
    let router = Router::build(vec![(spec, 0)]).unwrap();

    assert!(router.route(&signal_with_data("counter.increment", json!({"amount": 2}))).is_ok());
    assert!(router.route(&signal_with_data("counter.increment", json!({"amount": 0}))).is_err());
}

#[test]
fn panicking_predicate_is_non_match() {
    let spec = RouteSpec::to_action("tick", "boom")
        .predicate(|_s: &Signal| panic!("predicate exploded"));
    let router = Router::build(vec![
        (spec, 10),
        (RouteSpec::to_action("tick", "fallback"), 0),
    ])
    .unwrap();

    let targets = router.route(&signal("tick")).unwrap();
    assert_eq!(action_names(&targets), vec!["fallback"]);
}

#[test]
fn glob_routes_match_multiple_targets() {
    let router = Router::build(vec![
        (RouteSpec::to_action("counter.*", "counted"), 0),
        (RouteSpec::to_action("counter.increment", "exact"), 10),
        (RouteSpec::to_action("**", "audit"), -10),
    ])
    .unwrap();

    let targets = router.route(&signal("counter.increment")).unwrap();
    assert_eq!(action_names(&targets), vec!["exact", "counted", "audit"]);
}

#[test]
fn instruction_target_carries_params() {
    let router = Router::build(vec![(
        RouteSpec::new("tick", Target::instruction("inc", json!({"amount": 3}))),
        0,
    )])
    .unwrap();

    let targets = router.route(&signal("tick")).unwrap();
    assert_eq!(targets[0].action_name(), "inc");
    assert_eq!(targets[0].params(), Some(&json!({"amount": 3})));
}

#[test]
fn invalid_pattern_fails_build() {
    let err = Router::build(vec![(RouteSpec::to_action("a..b", "x"), 0)]);
    assert!(err.is_err());
}
