// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use crate::directive::{Fault, FaultContext};

fn fault() -> Fault {
    Fault::Action { action: "inc".to_string(), reason: "boom".to_string() }
}

fn agent() -> AgentValue {
    AgentValue::new("a1")
}

#[test]
fn log_only_continues() {
    let outcome = decide(&ErrorPolicy::LogOnly, &fault(), FaultContext::Action, 1, &agent());
    assert_eq!(outcome, PolicyOutcome::Continue);
}

#[test]
fn stop_on_error_stops_with_agent_error() {
    let outcome = decide(&ErrorPolicy::StopOnError, &fault(), FaultContext::Action, 1, &agent());
    match outcome {
        PolicyOutcome::Stop(ExitReason::AgentError(reason)) => {
            assert!(reason.contains("inc"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn emit_signal_yields_emit() {
    let hint = DispatchHint::named("errors");
    let outcome =
        decide(&ErrorPolicy::EmitSignal(hint.clone()), &fault(), FaultContext::Action, 1, &agent());
    assert_eq!(outcome, PolicyOutcome::Emit(hint));
}

#[test]
fn max_errors_continues_below_threshold() {
    let policy = ErrorPolicy::MaxErrors(3);
    assert_eq!(decide(&policy, &fault(), FaultContext::Action, 1, &agent()), PolicyOutcome::Continue);
    assert_eq!(decide(&policy, &fault(), FaultContext::Action, 2, &agent()), PolicyOutcome::Continue);
}

#[test]
fn max_errors_stops_on_nth_exactly() {
    let policy = ErrorPolicy::MaxErrors(3);
    assert_eq!(
        decide(&policy, &fault(), FaultContext::Action, 3, &agent()),
        PolicyOutcome::Stop(ExitReason::MaxErrorsExceeded(3))
    );
}

#[test]
fn custom_policy_decides() {
    let policy = ErrorPolicy::Custom(Arc::new(|_fault, agent| {
        if agent.get("tolerant").is_some() {
            PolicyDecision::Continue
        } else {
            PolicyDecision::Stop(ExitReason::Custom("intolerant".to_string()))
        }
    }));

    assert_eq!(
        decide(&policy, &fault(), FaultContext::Action, 1, &agent()),
        PolicyOutcome::Stop(ExitReason::Custom("intolerant".to_string()))
    );

    let mut tolerant = agent();
    tolerant.set_path("tolerant", serde_json::json!(true));
    assert_eq!(
        decide(&policy, &fault(), FaultContext::Action, 1, &tolerant),
        PolicyOutcome::Continue
    );
}

#[test]
fn panicking_custom_policy_continues() {
    let policy = ErrorPolicy::Custom(Arc::new(|_fault, _agent| panic!("policy exploded")));
    assert_eq!(decide(&policy, &fault(), FaultContext::Action, 1, &agent()), PolicyOutcome::Continue);
}

#[test]
fn debug_formatting_is_opaque_for_custom() {
    let policy = ErrorPolicy::Custom(Arc::new(|_f, _a| PolicyDecision::Continue));
    assert_eq!(format!("{policy:?}"), "Custom(<fn>)");
    assert_eq!(format!("{:?}", ErrorPolicy::MaxErrors(5)), "MaxErrors(5)");
}
