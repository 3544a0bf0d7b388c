// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Bounded mailbox: overflow is a hard synchronous failure.

use super::*;
use crate::children::ExitReason;
use crate::errors::ServerError;
use jido_core::telemetry::RecordingTelemetry;
use serde_json::json;

#[tokio::test]
async fn queue_overflow_is_synchronous_and_enqueues_nothing() {
    let telemetry = RecordingTelemetry::new();
    let handle = crate::server::start(
        counter_options()
            .max_queue_size(1)
            .telemetry(telemetry.clone()),
    )
    .unwrap();

    // Keep the drain pass busy so enqueued work stays pending.
    handle.cast(signal_with("slow", json!({"ms": 500}))).unwrap();
    eventually(|| handle.state().processing).await;

    // One slot: the first pending enqueue fits, the second overflows.
    handle.cast(signal("increment")).unwrap();
    let err = handle.cast(signal("increment")).unwrap_err();
    assert_eq!(err, ServerError::QueueOverflow);

    assert_eq!(handle.state().queue_len, 1, "overflowing enqueue must not grow the queue");
    assert!(telemetry.names().contains(&"queue.overflow"));

    // The accepted signal still processes once the pass reaches it.
    eventually(|| handle.state().agent.get("counter") == Some(&json!(1))).await;
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn overflowing_call_gets_error_immediately() {
    let handle = crate::server::start(counter_options().max_queue_size(1)).unwrap();

    handle.cast(signal_with("slow", json!({"ms": 500}))).unwrap();
    eventually(|| handle.state().processing).await;
    handle.cast(signal("increment")).unwrap();

    let err = handle.call(signal("increment")).await.unwrap_err();
    assert_eq!(err, ServerError::QueueOverflow);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn queue_drains_back_to_idle_after_pressure() {
    let handle = crate::server::start(counter_options().max_queue_size(100)).unwrap();
    for _ in 0..50 {
        handle.cast(signal("increment")).unwrap();
    }
    eventually(|| {
        let state = handle.state();
        state.queue_len == 0 && !state.processing
    })
    .await;
    assert_eq!(handle.state().agent.get("counter"), Some(&json!(50)));
    handle.stop(ExitReason::shutdown()).await;
}
