// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Core routing and drain-loop specs

use crate::prelude::*;
use jido_runtime::{via_tuple, ExitReason, Instance, ServerError, StartOptions};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn five_increments_yield_counter_five() {
    let instance = Instance::start("spec-counter-five").unwrap();
    let (handle, _id) = instance
        .start_agent(StartOptions::module(Arc::new(CounterAgent::plain())).id("c1"))
        .unwrap();

    for _ in 0..5 {
        handle.call(signal("increment")).await.unwrap();
    }
    assert_eq!(handle.state().agent.get("counter"), Some(&json!(5)));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn registry_bound_reference_calls_through() {
    let instance = Instance::start("spec-counter-via").unwrap();
    let (_handle, id) = instance
        .start_agent(StartOptions::module(Arc::new(CounterAgent::plain())).id("via-agent"))
        .unwrap();

    let server_ref = via_tuple(id, instance.registry());
    let view = server_ref.call(signal("increment")).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(1)));

    server_ref.resolve().unwrap().stop(ExitReason::shutdown()).await;
    assert!(!server_ref.alive());
    assert_eq!(server_ref.call(signal("increment")).await.unwrap_err(), ServerError::NotFound);
}

#[tokio::test]
async fn unrouted_signal_is_a_structured_error() {
    let instance = Instance::start("spec-counter-unrouted").unwrap();
    let (handle, _id) = instance
        .start_agent(StartOptions::module(Arc::new(CounterAgent::plain())).id("c2"))
        .unwrap();

    let err = handle.call(signal("never.routed")).await.unwrap_err();
    assert_eq!(err, ServerError::NoRoute { signal_type: "never.routed".to_string() });
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn queue_bound_of_one_rejects_second_pending_enqueue() {
    use jido_runtime::{Action, ActionCtx, ActionError, ActionOutcome, AgentModule, RouteCtx};
    use async_trait::async_trait;
    use jido_core::route::RouteSpec;
    use serde_json::Value;

    struct Stall;

    #[async_trait]
    impl Action for Stall {
        fn name(&self) -> &str {
            "stall"
        }

        async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            Ok(ActionOutcome::ok())
        }
    }

    struct StallAgent;

    impl AgentModule for StallAgent {
        fn name(&self) -> &str {
            "staller"
        }

        fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
            vec![RouteSpec::to_action("stall", "stall")]
        }

        fn actions(&self) -> Vec<std::sync::Arc<dyn Action>> {
            vec![std::sync::Arc::new(Stall)]
        }
    }

    let instance = Instance::start("spec-counter-bound").unwrap();
    let (handle, _id) = instance
        .start_agent(StartOptions::module(Arc::new(StallAgent)).id("b1").max_queue_size(1))
        .unwrap();

    handle.cast(signal("stall")).unwrap();
    eventually(|| handle.state().processing).await;

    // One slot: first pending enqueue fits, second overflows.
    handle.cast(signal("stall")).unwrap();
    assert_eq!(handle.cast(signal("stall")).unwrap_err(), ServerError::QueueOverflow);
    handle.stop(ExitReason::shutdown()).await;
}
