// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Basic drain-loop behaviour: FIFO processing, effect application, state
//! snapshots.

use super::*;
use crate::children::ExitReason;
use crate::state::AgentStatus;
use serde_json::json;

#[tokio::test]
async fn five_increments_count_to_five() {
    let handle = start_counter();
    for _ in 0..5 {
        handle.call(signal("increment")).await.unwrap();
    }
    let state = handle.state();
    assert_eq!(state.agent.get("counter"), Some(&json!(5)));
    assert_eq!(state.metrics.signals_processed, 5);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn call_returns_updated_view() {
    let handle = start_counter();
    let view = handle.call(signal_with("increment", json!({"amount": 4}))).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(4)));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn cast_is_fire_and_forget() {
    let handle = start_counter();
    handle.cast(signal("increment")).unwrap();
    handle.cast(signal("increment")).unwrap();

    eventually(|| handle.state().agent.get("counter") == Some(&json!(2))).await;
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn signals_process_in_fifo_order() {
    let handle = start_counter();
    for n in 0..10 {
        handle.cast(signal_with("mark", json!({"mark": n}))).unwrap();
    }
    eventually(|| {
        handle
            .state()
            .agent
            .get("seen")
            .and_then(|v| v.as_array())
            .map(|a| a.len() == 10)
            .unwrap_or(false)
    })
    .await;

    let seen = handle.state().agent.get("seen").cloned().unwrap();
    assert_eq!(seen, json!([0, 1, 2, 3, 4, 5, 6, 7, 8, 9]));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn idle_after_drain_with_empty_queue() {
    let handle = start_counter();
    handle.call(signal("increment")).await.unwrap();

    let state = handle.state();
    assert_eq!(state.status, AgentStatus::Idle);
    assert!(!state.processing);
    assert_eq!(state.queue_len, 0);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn state_is_available_immediately_after_start() {
    let handle = start_counter();
    // Must not block on post-init.
    let state = handle.state();
    assert_eq!(state.module_name, "counter");
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn calls_during_shutdown_are_rejected() {
    let handle = start_counter();
    handle.stop(ExitReason::shutdown()).await;
    let err = handle.call(signal("increment")).await.unwrap_err();
    assert_eq!(err, crate::errors::ServerError::ShuttingDown);
    assert!(!handle.alive());
}

#[tokio::test]
async fn stop_normal_terminates_with_normal_reason() {
    let handle = start_counter();
    handle.stop_async(ExitReason::Normal);
    let reason = handle.wait_exit().await;
    assert_eq!(reason, ExitReason::Normal);
}
