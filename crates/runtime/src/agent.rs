// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The agent value and its module descriptor.
//!
//! The runtime treats the agent value opaquely except for `id`, `state`, and
//! the metadata reachable through the [`AgentModule`] descriptor.

use crate::action::Action;
use crate::directive::Directive;
use crate::lifecycle::LifecycleHooks;
use crate::plugin::PluginInstance;
use crate::strategy::Strategy;
use jido_core::route::{RouteSpec, Target};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// User-visible record carried by every agent: an id plus a freely-shaped
/// state mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentValue {
    pub id: String,
    #[serde(default)]
    pub state: Map<String, Value>,
}

impl AgentValue {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), state: Map::new() }
    }

    pub fn with_state(id: impl Into<String>, state: Map<String, Value>) -> Self {
        Self { id: id.into(), state }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Shallow-merge action effects into the state: top-level keys overwrite.
    pub fn merge_state(&mut self, effects: &Map<String, Value>) {
        for (k, v) in effects {
            self.state.insert(k.clone(), v.clone());
        }
    }

    /// Deep-merge `overlay` into the state: nested objects merge key-wise,
    /// everything else overwrites.
    pub fn deep_merge_state(&mut self, overlay: &Map<String, Value>) {
        deep_merge(&mut self.state, overlay);
    }

    /// Set a dotted path inside the state, creating intermediate objects.
    ///
    /// A non-object value along the path is replaced by an object.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return;
        };
        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            self.state.insert(first.to_string(), value);
            return;
        }
        let entry = self
            .state
            .entry(first.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        set_path_inner(entry, &rest, value);
    }
}

fn set_path_inner(target: &mut Value, path: &[&str], value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Some(map) = target.as_object_mut() else {
        return;
    };
    match path {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_path_inner(entry, rest, value);
        }
    }
}

fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (k, v) in overlay {
        match (base.get_mut(k), v) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Context handed to `signal_routes` callbacks.
#[derive(Debug, Clone)]
pub struct RouteCtx {
    pub agent: AgentValue,
}

/// Module descriptor: the static metadata and hooks that define an agent's
/// behaviour. Every callback has a no-op default.
pub trait AgentModule: Send + Sync + 'static {
    /// Module name, used in registry entries and telemetry metadata.
    fn name(&self) -> &str;

    /// Construct a fresh agent value for the given id.
    fn build(&self, id: &str) -> AgentValue {
        AgentValue::new(id)
    }

    /// Routes contributed at the agent layer (default priority 0).
    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        Vec::new()
    }

    /// Actions this agent can run, keyed by `Action::name`.
    fn actions(&self) -> Vec<Arc<dyn Action>> {
        Vec::new()
    }

    fn plugins(&self) -> Vec<PluginInstance> {
        Vec::new()
    }

    fn strategy(&self) -> Option<Arc<dyn Strategy>> {
        None
    }

    fn lifecycle(&self) -> Option<Arc<dyn LifecycleHooks>> {
        None
    }

    /// Invoked before an action runs; may substitute the target.
    fn on_before_cmd(&self, _agent: &AgentValue, _target: &Target) -> Option<Target> {
        None
    }

    /// Invoked after an action ran; may edit the agent and the directive list.
    fn on_after_cmd(&self, _agent: &mut AgentValue, _target: &Target, _directives: &mut Vec<Directive>) {
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
