// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use crate::agent::AgentModule;
use crate::children::ExitReason;
use crate::options::StartOptions;
use crate::strategy::RunPhase;
use std::sync::Arc;

struct Noop;

impl AgentModule for Noop {
    fn name(&self) -> &str {
        "noop"
    }
}

fn start() -> AgentHandle {
    crate::server::start(StartOptions::module(Arc::new(Noop)).id("status-agent")).unwrap()
}

#[tokio::test]
async fn status_carries_module_and_id() {
    let handle = start();
    let status = handle.status();
    assert_eq!(status.agent_id, "status-agent");
    assert_eq!(status.agent_module, "noop");
    assert_eq!(status.snapshot.status, RunPhase::Idle);
    assert!(!status.snapshot.done);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn stream_yields_immediately_then_polls() {
    let handle = start();
    let mut stream = handle.stream_status(Duration::from_millis(10));

    let first = stream.next().await.unwrap();
    assert_eq!(first.agent_id, "status-agent");
    let second = stream.next().await.unwrap();
    assert_eq!(second.agent_id, "status-agent");

    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn stream_ends_when_agent_dies() {
    let handle = start();
    let mut stream = handle.stream_status(Duration::from_millis(10));
    assert!(stream.next().await.is_some());

    handle.stop(ExitReason::shutdown()).await;
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn streams_are_restartable_and_independent() {
    let handle = start();
    let mut a = handle.stream_status(Duration::from_millis(10));
    let mut b = handle.stream_status(Duration::from_millis(10));
    assert!(a.next().await.is_some());
    assert!(b.next().await.is_some());
    drop(a);
    let mut c = handle.stream_status(Duration::from_millis(10));
    assert!(c.next().await.is_some());
    handle.stop(ExitReason::shutdown()).await;
}
