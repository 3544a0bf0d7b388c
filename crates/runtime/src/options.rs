// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Start-argument validation and canonicalisation.
//!
//! Every option carries a default; `validate` canonicalises in place and is
//! idempotent under repeated application.

use crate::children::{OnParentDeath, ParentRef, SpawnFun};
use crate::directive::AgentSpec;
use crate::errors::OptionsError;
use crate::lifecycle::Lifecycle;
use crate::policy::ErrorPolicy;
use crate::registry::Registry;
use jido_core::clock::{Clock, SystemClock};
use jido_core::dispatch::{DispatchSink, LoggerDispatcher};
use jido_core::telemetry::{TelemetrySink, TracingTelemetry};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default mailbox bound.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

/// Arguments for starting an agent server.
#[derive(Clone)]
pub struct StartOptions {
    /// Required: module descriptor, or a pre-built value with its module.
    pub agent: AgentSpec,
    /// Agent id; generated when absent or empty. A non-empty user-supplied
    /// value is preferred over any id embedded in an agent value.
    pub id: Option<String>,
    /// Deep-merged into the agent value's state on construction.
    pub initial_state: Map<String, Value>,
    /// Derived from the instance unless overridden.
    pub registry: Option<Registry>,
    pub error_policy: ErrorPolicy,
    pub max_queue_size: usize,
    pub on_parent_death: OnParentDeath,
    /// Test seam for child spawning; defaults to the instance supervisor.
    pub spawn_fun: Option<SpawnFun>,
    pub parent: Option<ParentRef>,
    pub lifecycle: Lifecycle,
    /// Suppresses plugin cron registration during post-init.
    pub skip_schedules: bool,
    /// Budget for one plugin callback.
    pub plugin_timeout: Duration,
    pub default_dispatch: DispatchSink,
    /// Named dispatch sinks resolvable from dispatch hints.
    pub dispatchers: HashMap<String, DispatchSink>,
    pub telemetry: TelemetrySink,
    pub clock: Arc<dyn Clock>,
}

impl StartOptions {
    pub fn new(agent: AgentSpec) -> Self {
        Self {
            agent,
            id: None,
            initial_state: Map::new(),
            registry: None,
            error_policy: ErrorPolicy::default(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            on_parent_death: OnParentDeath::default(),
            spawn_fun: None,
            parent: None,
            lifecycle: Lifecycle::default(),
            skip_schedules: false,
            plugin_timeout: crate::plugin::DEFAULT_PLUGIN_TIMEOUT,
            default_dispatch: Arc::new(LoggerDispatcher),
            dispatchers: HashMap::new(),
            telemetry: Arc::new(TracingTelemetry),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn module(module: Arc<dyn crate::agent::AgentModule>) -> Self {
        Self::new(AgentSpec::Module(module))
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn initial_state(mut self, state: Map<String, Value>) -> Self {
        self.initial_state = state;
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn on_parent_death(mut self, behaviour: OnParentDeath) -> Self {
        self.on_parent_death = behaviour;
        self
    }

    pub fn spawn_fun(mut self, spawn_fun: SpawnFun) -> Self {
        self.spawn_fun = Some(spawn_fun);
        self
    }

    pub fn parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn skip_schedules(mut self, skip: bool) -> Self {
        self.skip_schedules = skip;
        self
    }

    pub fn plugin_timeout(mut self, timeout: Duration) -> Self {
        self.plugin_timeout = timeout;
        self
    }

    pub fn default_dispatch(mut self, sink: DispatchSink) -> Self {
        self.default_dispatch = sink;
        self
    }

    pub fn dispatcher(mut self, name: impl Into<String>, sink: DispatchSink) -> Self {
        self.dispatchers.insert(name.into(), sink);
        self
    }

    pub fn telemetry(mut self, sink: TelemetrySink) -> Self {
        self.telemetry = sink;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and canonicalise. Idempotent: re-validating the result is a
    /// no-op.
    pub fn validate(mut self) -> Result<Self, OptionsError> {
        if self.max_queue_size == 0 {
            return Err(OptionsError::InvalidQueueSize);
        }
        if let ErrorPolicy::MaxErrors(0) = self.error_policy {
            return Err(OptionsError::InvalidMaxErrors);
        }
        // Empty or whitespace-only id means "generate one".
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                self.id = None;
            }
        }
        Ok(self)
    }

    /// Resolve the agent id: a non-empty user-supplied id wins, then an id
    /// embedded in a pre-built agent value, then a generated one.
    pub(crate) fn resolve_id(&self) -> String {
        if let Some(id) = &self.id {
            if !id.trim().is_empty() {
                return id.clone();
            }
        }
        if let AgentSpec::Value { agent, .. } = &self.agent {
            if !agent.id.trim().is_empty() {
                return agent.id.clone();
            }
        }
        generated_id()
    }
}

fn generated_id() -> String {
    format!("agt-{}", nanoid::nanoid!(19))
}

impl std::fmt::Debug for StartOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartOptions")
            .field("agent", &self.agent)
            .field("id", &self.id)
            .field("max_queue_size", &self.max_queue_size)
            .field("on_parent_death", &self.on_parent_death)
            .field("error_policy", &self.error_policy)
            .field("skip_schedules", &self.skip_schedules)
            .field("plugin_timeout", &self.plugin_timeout)
            .finish()
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
