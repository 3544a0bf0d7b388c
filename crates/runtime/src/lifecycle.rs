// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The lifecycle record: the single source of truth for optional pooling and
//! idle-timeout parameters, plus user lifecycle callbacks.
//!
//! The server consults this record; it never duplicates the fields elsewhere.

use crate::agent::AgentValue;
use crate::children::{ChildTag, ExitReason};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Events delivered to lifecycle hooks.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    PostInit,
    SignalProcessed { signal_type: String },
    ChildExited { tag: ChildTag, reason: ExitReason },
    ParentDown { reason: ExitReason },
}

/// Optional user module observing the agent's lifecycle.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    async fn init(&self, _agent: &AgentValue) {}

    async fn handle_event(&self, _event: &LifecycleEvent, _agent: &AgentValue) {}

    async fn terminate(&self, _reason: &ExitReason, _agent: &AgentValue) {}
}

/// Lifecycle record assembled from start options.
#[derive(Clone, Default)]
pub struct Lifecycle {
    pub hooks: Option<Arc<dyn LifecycleHooks>>,
    pub pool: Option<String>,
    pub pool_key: Option<String>,
    pub idle_timeout: Option<Duration>,
    pub storage: Option<Value>,
}

impl Lifecycle {
    pub(crate) async fn init(&self, agent: &AgentValue) {
        if let Some(hooks) = &self.hooks {
            hooks.init(agent).await;
        }
    }

    pub(crate) async fn event(&self, event: LifecycleEvent, agent: &AgentValue) {
        if let Some(hooks) = &self.hooks {
            hooks.handle_event(&event, agent).await;
        }
    }

    pub(crate) async fn terminate(&self, reason: &ExitReason, agent: &AgentValue) {
        if let Some(hooks) = &self.hooks {
            hooks.terminate(reason, agent).await;
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("has_hooks", &self.hooks.is_some())
            .field("pool", &self.pool)
            .field("pool_key", &self.pool_key)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
