// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use crate::agent::AgentValue;
use async_trait::async_trait;
use jido_core::signal::Signal;
use serde_json::json;

struct Increment;

#[async_trait]
impl Action for Increment {
    fn name(&self) -> &str {
        "increment"
    }

    async fn run(&self, params: Value, ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        let amount = params.get("amount").and_then(Value::as_i64).unwrap_or(1);
        let current = ctx.agent.get("counter").and_then(Value::as_i64).unwrap_or(0);
        Ok(ActionOutcome::ok().effect("counter", json!(current + amount)))
    }
}

fn ctx() -> ActionCtx {
    let signal = Signal::builder("increment")
        .source("jido://test")
        .build()
        .unwrap()
        .ensure_trace();
    let trace = signal.trace.unwrap();
    ActionCtx { agent: AgentValue::new("a1"), signal, trace }
}

#[tokio::test]
async fn action_produces_effects() {
    let out = Increment.run(json!({"amount": 3}), ctx()).await.unwrap();
    assert_eq!(out.effects.get("counter"), Some(&json!(3)));
    assert!(out.directives.is_empty());
}

#[tokio::test]
async fn action_reads_current_state() {
    let mut c = ctx();
    c.agent.set_path("counter", json!(10));
    let out = Increment.run(Value::Null, c).await.unwrap();
    assert_eq!(out.effects.get("counter"), Some(&json!(11)));
}

#[test]
fn outcome_builders_compose() {
    let out = ActionOutcome::ok()
        .effect("a", json!(1))
        .directive(crate::directive::Directive::SetState {
            path: "b".to_string(),
            value: json!(2),
        });
    assert_eq!(out.effects.len(), 1);
    assert_eq!(out.directives.len(), 1);
}

#[test]
fn error_display() {
    assert_eq!(ActionError::Failed("boom".to_string()).to_string(), "boom");
    assert_eq!(
        ActionError::InvalidParams("missing amount".to_string()).to_string(),
        "invalid params: missing amount"
    );
}
