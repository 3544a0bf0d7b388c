// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Plugins (skills): composable capabilities that contribute routes, actions,
//! children, sensors, cron schedules, signal middleware, and result
//! transforms.
//!
//! Every plugin callback is invoked through [`guard`], which bounds the call
//! with a timeout and converts panics into typed errors. A plugin failure
//! aborts the signal it was handling, never the server.

use crate::action::Action;
use crate::agent::AgentValue;
use crate::children::ChildSpec;
use crate::sensor::Sensor;
use async_trait::async_trait;
use jido_core::pattern::{Pattern, PatternError};
use jido_core::route::RouteSpec;
use jido_core::signal::Signal;
use jido_core::trace::TraceEnvelope;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default budget for one plugin callback.
pub const DEFAULT_PLUGIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors surfaced by plugin callbacks.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PluginError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Context handed to plugin callbacks.
#[derive(Debug, Clone)]
pub struct PluginCtx {
    pub agent: AgentValue,
    /// The plugin's declared state key.
    pub state_key: String,
    /// Instance configuration this plugin was installed with.
    pub config: Value,
    pub trace: Option<TraceEnvelope>,
}

/// Outcome of `handle_signal` middleware.
#[derive(Debug, Clone)]
pub enum HandleOutcome {
    /// Proceed with the unmodified signal.
    Continue,
    /// Replace the signal and proceed to the next plugin.
    Replace(Signal),
    /// Stop routing and invoke the action directly.
    Override {
        action: String,
        params: Option<Value>,
        signal: Option<Signal>,
    },
}

/// A cron schedule declared by a plugin; delivered as a synthesised
/// `<state_key>.__schedule__.<action>` signal.
#[derive(Debug, Clone)]
pub struct PluginSchedule {
    pub cron: String,
    pub timezone: Option<String>,
    pub action: String,
}

/// A composable capability. Every callback defaults to identity/no-op.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Key under which this plugin namespaces its state and schedules.
    fn state_key(&self) -> &str;

    /// Signal patterns this plugin's middleware applies to.
    /// Empty means every signal.
    fn signal_patterns(&self) -> Vec<String> {
        Vec::new()
    }

    /// Explicit route list; `None` synthesises one route per declared
    /// pattern × action.
    fn signal_routes(&self, _config: &Value) -> Option<Vec<RouteSpec>> {
        None
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        Vec::new()
    }

    /// Middleware invoked for each matching signal, in declaration order.
    async fn handle_signal(
        &self,
        _signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        Ok(HandleOutcome::Continue)
    }

    /// Transform the agent view returned to synchronous callers.
    /// Never affects the stored state.
    async fn transform_result(&self, agent: AgentValue, _ctx: PluginCtx) -> AgentValue {
        agent
    }

    /// Child tasks to start under the instance supervisor on post-init.
    fn child_specs(&self, _config: &Value) -> Vec<ChildSpec> {
        Vec::new()
    }

    /// Subscription sensors to start on post-init.
    fn sensors(&self) -> Vec<Arc<dyn Sensor>> {
        Vec::new()
    }

    /// Cron schedules registered on post-init unless `skip_schedules` is set.
    fn schedules(&self) -> Vec<PluginSchedule> {
        Vec::new()
    }
}

/// A plugin plus its instance configuration, as declared by the agent module.
#[derive(Clone)]
pub struct PluginInstance {
    pub plugin: Arc<dyn Plugin>,
    pub config: Value,
}

impl PluginInstance {
    pub fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self { plugin, config: Value::Null }
    }

    pub fn with_config(plugin: Arc<dyn Plugin>, config: Value) -> Self {
        Self { plugin, config }
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("state_key", &self.plugin.state_key())
            .field("config", &self.config)
            .finish()
    }
}

/// A plugin installed on a running server: instance plus parsed patterns.
#[derive(Clone)]
pub(crate) struct InstalledPlugin {
    pub instance: PluginInstance,
    pub patterns: Vec<Pattern>,
}

impl InstalledPlugin {
    pub fn install(instance: PluginInstance) -> Result<Self, PatternError> {
        let patterns = instance
            .plugin
            .signal_patterns()
            .into_iter()
            .map(Pattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { instance, patterns })
    }

    pub fn state_key(&self) -> &str {
        self.instance.plugin.state_key()
    }

    /// A plugin with declared patterns is skipped for non-matching signals;
    /// one with no patterns sees everything.
    pub fn applies_to(&self, signal: &Signal) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(&signal.ty))
    }
}

/// Run a plugin callback with a timeout, converting panics and overruns into
/// typed errors. The callback runs on its own task so a panic cannot take the
/// drain loop down.
pub(crate) async fn guard<T, F>(timeout: Duration, fut: F) -> Result<T, PluginError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, PluginError>> + Send + 'static,
{
    let task = tokio::spawn(fut);
    let abort = task.abort_handle();
    match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            abort.abort();
            Err(PluginError::Timeout(timeout))
        }
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(PluginError::Panicked(panic_message(join_err.into_panic())))
        }
        Ok(Err(_)) => Err(PluginError::Panicked("cancelled".to_string())),
    }
}

pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
