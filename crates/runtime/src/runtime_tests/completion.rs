// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Completion waiters: immediate terminal returns, parking, timeout
//! removal, and shutdown notification.

use super::*;
use crate::action::{Action, ActionCtx, ActionError, ActionOutcome};
use crate::agent::AgentModule;
use crate::children::ExitReason;
use crate::errors::ServerError;
use serde_json::json;

/// Marks the conventional terminal keys the default strategy reads.
struct FinishAction;

#[async_trait]
impl Action for FinishAction {
    fn name(&self) -> &str {
        "finish"
    }

    async fn run(&self, params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        Ok(ActionOutcome::ok()
            .effect("done", json!(true))
            .effect("result", params.get("result").cloned().unwrap_or(Value::Null)))
    }
}

struct FinishingModule;

impl AgentModule for FinishingModule {
    fn name(&self) -> &str {
        "finisher"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("finish", "finish"),
            RouteSpec::to_action("increment", "increment"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![Arc::new(FinishAction), Arc::new(IncrementAction)]
    }
}

fn start_finisher() -> AgentHandle {
    crate::server::start(StartOptions::module(Arc::new(FinishingModule))).unwrap()
}

#[tokio::test]
async fn returns_immediately_when_already_terminal() {
    let handle = start_finisher();
    handle.call(signal_with("finish", json!({"result": {"answer": 42}}))).await.unwrap();

    let result = handle.await_completion(Duration::from_millis(10)).await.unwrap();
    assert_eq!(result, Some(json!({"answer": 42})));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn parked_waiter_released_on_completion() {
    let handle = start_finisher();

    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.await_completion(Duration::from_secs(5)).await })
    };
    // Give the waiter time to park.
    eventually(|| handle.state().waiter_count == 1).await;

    handle.call(signal_with("finish", json!({"result": 7}))).await.unwrap();

    let result = waiter.await.unwrap().unwrap();
    assert_eq!(result, Some(json!(7)));
    assert_eq!(handle.state().waiter_count, 0);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn timed_out_waiter_is_removed_from_state() {
    let handle = start_finisher();

    let err = handle.await_completion(Duration::from_millis(30)).await.unwrap_err();
    assert_eq!(err, ServerError::Timeout);
    assert_eq!(handle.state().waiter_count, 0);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn shutdown_notifies_parked_waiters() {
    let handle = start_finisher();

    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.await_completion(Duration::from_secs(5)).await })
    };
    eventually(|| handle.state().waiter_count == 1).await;

    handle.stop(ExitReason::shutdown()).await;
    let err = waiter.await.unwrap().unwrap_err();
    assert_eq!(err, ServerError::ShuttingDown);
}

#[tokio::test]
async fn await_on_dead_agent_errors() {
    let handle = start_finisher();
    handle.stop(ExitReason::shutdown()).await;
    let err = handle.await_completion(Duration::from_millis(10)).await.unwrap_err();
    assert_eq!(err, ServerError::ShuttingDown);
}
