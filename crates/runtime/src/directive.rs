// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Directives represent work the server needs to perform on behalf of an
//! agent: emitting signals, scheduling, spawning, stopping.
//!
//! Directives are produced by actions or generated internally and executed
//! by the drain loop. The set is closed; the executor treats anything it
//! does not understand as a no-op.

use crate::agent::{AgentModule, AgentValue};
use crate::children::{ChildSpec, ChildTag, ExitReason};
use jido_core::dispatch::DispatchHint;
use jido_core::id::CronJobId;
use jido_core::signal::Signal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// What went wrong inside signal processing; carried by `Error` directives.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Fault {
    #[error("no route matched signal type {signal_type:?}")]
    Routing { signal_type: String },
    #[error("action {action} failed: {reason}")]
    Action { action: String, reason: String },
    #[error("unknown action {action}")]
    UnknownAction { action: String },
    #[error("plugin {plugin} failed: {reason}")]
    Plugin { plugin: String, reason: String },
    #[error("spawn failed: {reason}")]
    Spawn { reason: String },
    #[error("dispatch failed: {reason}")]
    Dispatch { reason: String },
    #[error("cron error: {reason}")]
    Cron { reason: String },
    #[error("{reason}")]
    Other { reason: String },
}

/// Where a fault was raised; drives error-policy log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultContext {
    Signal,
    Routing,
    Action,
    Plugin,
    Spawn,
    SpawnAgent,
    Cron,
    Dispatch,
    Other,
}

impl std::fmt::Display for FaultContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FaultContext::Signal => "signal",
            FaultContext::Routing => "routing",
            FaultContext::Action => "action",
            FaultContext::Plugin => "plugin",
            FaultContext::Spawn => "spawn",
            FaultContext::SpawnAgent => "spawn_agent",
            FaultContext::Cron => "cron",
            FaultContext::Dispatch => "dispatch",
            FaultContext::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Payload delivered by a one-shot timer or cron tick.
///
/// A `Signal` passes through unchanged; any other payload is wrapped in a
/// `jido.scheduled` signal on delivery.
#[derive(Debug, Clone)]
pub enum ScheduleMessage {
    Signal(Signal),
    Payload(Value),
}

/// What to start as a child agent: a module descriptor, or a pre-built
/// agent value paired with its module.
#[derive(Clone)]
pub enum AgentSpec {
    Module(Arc<dyn AgentModule>),
    Value { module: Arc<dyn AgentModule>, agent: AgentValue },
}

impl AgentSpec {
    pub fn module(&self) -> &Arc<dyn AgentModule> {
        match self {
            AgentSpec::Module(m) => m,
            AgentSpec::Value { module, .. } => module,
        }
    }
}

impl std::fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentSpec::Module(m) => write!(f, "AgentSpec::Module({})", m.name()),
            AgentSpec::Value { module, agent } => {
                write!(f, "AgentSpec::Value({}, id={})", module.name(), agent.id)
            }
        }
    }
}

/// Options forwarded when spawning a child agent.
#[derive(Debug, Clone, Default)]
pub struct ChildStartOpts {
    /// Child id; derived as `<parent_id>/<tag>` when absent.
    pub id: Option<String>,
    pub initial_state: Map<String, Value>,
    pub max_queue_size: Option<usize>,
    pub skip_schedules: bool,
    pub on_parent_death: Option<crate::children::OnParentDeath>,
}

/// Directives the drain loop executes.
#[derive(Debug)]
pub enum Directive {
    /// Forward a signal to the configured dispatch sink.
    Emit { signal: Signal, dispatch: Option<DispatchHint> },

    /// Route a fault through the error policy.
    Error { error: Fault, context: FaultContext },

    /// Arm a one-shot timer; the message is re-enqueued when it fires.
    Schedule { delay: Duration, message: ScheduleMessage },

    /// Start a supervised child task through the configured spawn seam.
    Spawn { spec: ChildSpec, tag: Option<String> },

    /// Start a child agent server with this agent as its parent.
    SpawnAgent { agent: AgentSpec, tag: String, opts: ChildStartOpts, meta: Value },

    /// Terminate a tracked child; absent tag is a no-op.
    StopChild { tag: ChildTag, reason: ExitReason },

    /// Terminate this server.
    Stop { reason: ExitReason },

    /// Register (or replace) a cron job delivering `message` on schedule.
    CronRegister {
        expr: String,
        message: ScheduleMessage,
        job_id: Option<CronJobId>,
        timezone: Option<String>,
    },

    /// Cancel a cron job; unknown id is a no-op.
    CronCancel { job_id: CronJobId },

    /// Targeted state update at a dotted path, bypassing the shallow merge.
    SetState { path: String, value: Value },
}

impl Directive {
    /// Directive name for log spans and telemetry.
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Emit { .. } => "emit",
            Directive::Error { .. } => "error",
            Directive::Schedule { .. } => "schedule",
            Directive::Spawn { .. } => "spawn",
            Directive::SpawnAgent { .. } => "spawn_agent",
            Directive::StopChild { .. } => "stop_child",
            Directive::Stop { .. } => "stop",
            Directive::CronRegister { .. } => "cron_register",
            Directive::CronCancel { .. } => "cron_cancel",
            Directive::SetState { .. } => "set_state",
        }
    }

    /// Key-value pairs for structured logging
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Directive::Emit { signal, dispatch } => {
                let mut fields = vec![("signal", signal.log_summary())];
                if let Some(hint) = dispatch {
                    fields.push(("sink", hint.sink.clone()));
                }
                fields
            }
            Directive::Error { error, context } => {
                vec![("context", context.to_string()), ("error", error.to_string())]
            }
            Directive::Schedule { delay, .. } => {
                vec![("delay_ms", delay.as_millis().to_string())]
            }
            Directive::Spawn { spec, tag } => {
                let mut fields = vec![("child", spec.id.clone())];
                if let Some(tag) = tag {
                    fields.push(("tag", tag.clone()));
                }
                fields
            }
            Directive::SpawnAgent { agent, tag, .. } => vec![
                ("module", agent.module().name().to_string()),
                ("tag", tag.clone()),
            ],
            Directive::StopChild { tag, reason } => {
                vec![("tag", tag.to_string()), ("reason", reason.to_string())]
            }
            Directive::Stop { reason } => vec![("reason", reason.to_string())],
            Directive::CronRegister { expr, job_id, .. } => {
                let mut fields = vec![("expr", expr.clone())];
                if let Some(id) = job_id {
                    fields.push(("job_id", id.to_string()));
                }
                fields
            }
            Directive::CronCancel { job_id } => vec![("job_id", job_id.to_string())],
            Directive::SetState { path, .. } => vec![("path", path.clone())],
        }
    }

    /// Whether to log execution at info level; frequent signaling directives
    /// stay at debug.
    pub fn verbose(&self) -> bool {
        !matches!(
            self,
            Directive::Emit { .. } | Directive::Schedule { .. } | Directive::SetState { .. }
        )
    }
}

#[cfg(test)]
#[path = "directive_tests.rs"]
mod tests;
