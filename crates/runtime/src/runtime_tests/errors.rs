// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Error-policy behaviour under action failures and routing errors.

use super::*;
use crate::children::ExitReason;
use crate::errors::ServerError;
use crate::policy::{ErrorPolicy, PolicyDecision};
use jido_core::dispatch::{ChannelDispatcher, DispatchHint};
use serde_json::json;

#[tokio::test]
async fn action_error_returns_structured_error_and_leaves_state() {
    let handle = start_counter();
    handle.call(signal("increment")).await.unwrap();

    let err = handle.call(signal("fail")).await.unwrap_err();
    match err {
        ServerError::Action { action, reason } => {
            assert_eq!(action, "fail");
            assert!(reason.contains("deliberate"));
        }
        other => panic!("unexpected: {other}"),
    }
    // The failed action mutated nothing.
    assert_eq!(handle.state().agent.get("counter"), Some(&json!(1)));
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn routing_error_surfaced_to_caller() {
    let handle = start_counter();
    let err = handle.call(signal("no.such.route")).await.unwrap_err();
    assert_eq!(err, ServerError::NoRoute { signal_type: "no.such.route".to_string() });
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn log_only_policy_keeps_server_running() {
    let handle = crate::server::start(counter_options().error_policy(ErrorPolicy::LogOnly))
        .unwrap();

    for _ in 0..5 {
        let _ = handle.call(signal("fail")).await;
    }
    // Error directives execute after the reply; wait for the tally.
    eventually(|| handle.state().error_count == 5).await;
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn stop_on_error_policy_stops_server() {
    let handle = crate::server::start(counter_options().error_policy(ErrorPolicy::StopOnError))
        .unwrap();

    let _ = handle.call(signal("fail")).await;
    let reason = handle.wait_exit().await;
    assert!(matches!(reason, ExitReason::AgentError(_)));
}

#[tokio::test]
async fn max_errors_stops_on_nth_not_before() {
    let handle = crate::server::start(counter_options().error_policy(ErrorPolicy::MaxErrors(3)))
        .unwrap();

    let _ = handle.call(signal("fail")).await;
    let _ = handle.call(signal("fail")).await;
    eventually(|| handle.state().error_count == 2).await;
    assert!(handle.alive(), "must survive n-1 errors");

    let _ = handle.call(signal("fail")).await;
    let reason = handle.wait_exit().await;
    assert_eq!(reason, ExitReason::MaxErrorsExceeded(3));
}

#[tokio::test]
async fn emit_signal_policy_forwards_error_signal() {
    let (sink, mut rx) = ChannelDispatcher::pair(8);
    let handle = crate::server::start(
        counter_options()
            .error_policy(ErrorPolicy::EmitSignal(DispatchHint::named("errors")))
            .dispatcher("errors", Arc::new(sink)),
    )
    .unwrap();

    let _ = handle.call(signal("fail")).await;

    let emitted = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(emitted.ty, "jido.agent.error");
    assert!(emitted.data["error"].as_str().unwrap_or("").contains("fail"));
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn custom_policy_controls_fate() {
    let policy = ErrorPolicy::Custom(Arc::new(|fault, _agent| {
        if fault.to_string().contains("deliberate") {
            PolicyDecision::Stop(ExitReason::Custom("had enough".to_string()))
        } else {
            PolicyDecision::Continue
        }
    }));
    let handle = crate::server::start(counter_options().error_policy(policy)).unwrap();

    // A routing error does not match the custom predicate: continue.
    let _ = handle.call(signal("no.route")).await;
    assert!(handle.alive());

    let _ = handle.call(signal("fail")).await;
    let reason = handle.wait_exit().await;
    assert_eq!(reason, ExitReason::Custom("had enough".to_string()));
}

#[tokio::test]
async fn panicking_action_is_contained() {
    use crate::action::{Action, ActionCtx, ActionError, ActionOutcome};
    use crate::agent::AgentModule;

    struct PanicAction;

    #[async_trait]
    impl Action for PanicAction {
        fn name(&self) -> &str {
            "panic"
        }

        async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
            panic!("action exploded")
        }
    }

    struct PanickyModule;

    impl AgentModule for PanickyModule {
        fn name(&self) -> &str {
            "panicky"
        }

        fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
            vec![RouteSpec::to_action("panic", "panic")]
        }

        fn actions(&self) -> Vec<Arc<dyn Action>> {
            vec![Arc::new(PanicAction)]
        }
    }

    let handle = crate::server::start(StartOptions::module(Arc::new(PanickyModule))).unwrap();
    let err = handle.call(signal("panic")).await.unwrap_err();
    match err {
        ServerError::Action { reason, .. } => assert!(reason.contains("panicked")),
        other => panic!("unexpected: {other}"),
    }
    assert!(handle.alive(), "server survives action panics");
    handle.stop(ExitReason::shutdown()).await;
}
