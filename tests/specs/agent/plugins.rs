// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Plugin middleware and result-transform specs

use crate::prelude::*;
use async_trait::async_trait;
use jido_core::signal::Signal;
use jido_runtime::{
    AgentValue, ExitReason, HandleOutcome, Instance, Plugin, PluginCtx, PluginError,
    PluginInstance, ServerError, StartOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;

struct RejectCounter;

#[async_trait]
impl Plugin for RejectCounter {
    fn state_key(&self) -> &str {
        "reject_counter"
    }

    fn signal_patterns(&self) -> Vec<String> {
        vec!["counter.*".to_string()]
    }

    async fn handle_signal(
        &self,
        _signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        Err(PluginError::Rejected("rejected".to_string()))
    }
}

struct StampView;

#[async_trait]
impl Plugin for StampView {
    fn state_key(&self) -> &str {
        "stamp_view"
    }

    async fn transform_result(&self, mut agent: AgentValue, _ctx: PluginCtx) -> AgentValue {
        agent.set_path("transformed_by", json!("stamp_view"));
        agent
    }
}

struct Prefixer;

#[async_trait]
impl Plugin for Prefixer {
    fn state_key(&self) -> &str {
        "prefixer"
    }

    async fn handle_signal(
        &self,
        signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        let Some(amount) = signal.data.get("amount").cloned() else {
            return Ok(HandleOutcome::Continue);
        };
        let mut wrapped = signal.clone();
        wrapped.data = json!({"amount": amount, "prefix_applied": true});
        Ok(HandleOutcome::Replace(wrapped))
    }
}

struct Tripler;

#[async_trait]
impl Plugin for Tripler {
    fn state_key(&self) -> &str {
        "tripler"
    }

    async fn handle_signal(
        &self,
        signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        if signal.data.get("prefix_applied") != Some(&json!(true)) {
            return Ok(HandleOutcome::Continue);
        }
        let amount = signal.data.get("amount").and_then(Value::as_i64).unwrap_or(0);
        let mut tripled = signal.clone();
        tripled.data = json!({"amount": amount * 3, "prefix_applied": true});
        Ok(HandleOutcome::Replace(tripled))
    }
}

#[tokio::test]
async fn rejecting_plugin_blocks_only_matching_signals() {
    let instance = Instance::start("spec-plugin-reject").unwrap();
    let (handle, _id) = instance
        .start_agent(
            StartOptions::module(Arc::new(CounterAgent::with_plugins(vec![
                PluginInstance::new(Arc::new(RejectCounter)),
            ])))
            .id("p1"),
        )
        .unwrap();

    let err = handle.call(signal_with("counter.increment", json!({}))).await.unwrap_err();
    assert!(matches!(err, ServerError::Plugin { .. }));

    let view = handle.call(signal_with("other.increment", json!({}))).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(1)));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn transform_result_changes_view_but_not_stored_state() {
    let instance = Instance::start("spec-plugin-transform").unwrap();
    let (handle, _id) = instance
        .start_agent(
            StartOptions::module(Arc::new(CounterAgent::with_plugins(vec![
                PluginInstance::new(Arc::new(StampView)),
            ])))
            .id("p2"),
        )
        .unwrap();

    let view = handle.call(signal("increment")).await.unwrap();
    assert_eq!(view.get("transformed_by"), Some(&json!("stamp_view")));
    assert_eq!(handle.state().agent.get("transformed_by"), None);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn two_plugins_compose_amount_to_twelve() {
    let instance = Instance::start("spec-plugin-compose").unwrap();
    let (handle, _id) = instance
        .start_agent(
            StartOptions::module(Arc::new(CounterAgent::with_plugins(vec![
                PluginInstance::new(Arc::new(Prefixer)),
                PluginInstance::new(Arc::new(Tripler)),
            ])))
            .id("p3"),
        )
        .unwrap();

    let view = handle.call(signal_with("increment", json!({"amount": 4}))).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(12)));
    handle.stop(ExitReason::shutdown()).await;
}
