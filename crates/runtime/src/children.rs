// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Parent/child supervision types.
//!
//! Children are exclusively owned by the parent's state. Every spawned child
//! carries a monitor task that posts a typed exit message into the parent's
//! mailbox when the child goes away; loss of the monitor implies loss of the
//! entry.

use jido_core::id::MonitorRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};

/// Why an agent (or task) went away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Normal,
    Killed,
    /// Graceful, supervision-style termination, optionally wrapping a cause.
    Shutdown(Option<Box<ExitReason>>),
    /// The parent process went away with the wrapped reason.
    ParentDown(Box<ExitReason>),
    /// The monitored process was already gone when the monitor was set up.
    NoProc,
    AgentError(String),
    MaxErrorsExceeded(u32),
    Panic(String),
    Custom(String),
}

impl ExitReason {
    /// Reasons that count as orderly for parent-death handling.
    pub fn is_benign(&self) -> bool {
        matches!(self, ExitReason::Normal | ExitReason::Shutdown(_) | ExitReason::NoProc)
    }

    pub fn shutdown() -> Self {
        ExitReason::Shutdown(None)
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Normal => write!(f, "normal"),
            ExitReason::Killed => write!(f, "killed"),
            ExitReason::Shutdown(None) => write!(f, "shutdown"),
            ExitReason::Shutdown(Some(cause)) => write!(f, "shutdown({cause})"),
            ExitReason::ParentDown(reason) => write!(f, "parent_down({reason})"),
            ExitReason::NoProc => write!(f, "noproc"),
            ExitReason::AgentError(e) => write!(f, "agent_error: {e}"),
            ExitReason::MaxErrorsExceeded(n) => write!(f, "max_errors_exceeded({n})"),
            ExitReason::Panic(msg) => write!(f, "panic: {msg}"),
            ExitReason::Custom(reason) => write!(f, "{reason}"),
        }
    }
}

/// What to do when the parent goes away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnParentDeath {
    #[default]
    Stop,
    Continue,
    EmitOrphan,
}

/// Tag distinguishing tracked children within one parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildTag {
    Named(String),
    Plugin { plugin: String, child: String },
    Sensor { plugin: String, sensor: String },
    Spawn(MonitorRef),
}

impl ChildTag {
    pub fn named(tag: impl Into<String>) -> Self {
        ChildTag::Named(tag.into())
    }
}

impl std::fmt::Display for ChildTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChildTag::Named(tag) => write!(f, "{tag}"),
            ChildTag::Plugin { plugin, child } => write!(f, "plugin:{plugin}:{child}"),
            ChildTag::Sensor { plugin, sensor } => write!(f, "sensor:{plugin}:{sensor}"),
            ChildTag::Spawn(monitor) => write!(f, "spawn:{monitor}"),
        }
    }
}

/// Future to run as a supervised child task.
pub type ChildTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Specification of a child task to spawn.
pub struct ChildSpec {
    pub id: String,
    pub(crate) task: ChildTask,
}

impl ChildSpec {
    pub fn new(id: impl Into<String>, task: impl Future<Output = ()> + Send + 'static) -> Self {
        Self { id: id.into(), task: Box::pin(task) }
    }

    pub(crate) fn into_task(self) -> ChildTask {
        self.task
    }
}

impl std::fmt::Debug for ChildSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildSpec").field("id", &self.id).finish()
    }
}

/// Errors from the spawn seam.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpawnError {
    #[error("instance supervisor is gone")]
    SupervisorMissing,
    #[error("spawn rejected: {0}")]
    Rejected(String),
}

/// A task started through the spawn seam.
#[derive(Debug)]
pub struct SpawnedTask {
    pub id: String,
    pub join: JoinHandle<()>,
}

/// Accepted spawn returns.
#[derive(Debug)]
pub enum SpawnResult {
    Spawned(SpawnedTask),
    SpawnedWithInfo(SpawnedTask, Value),
    Ignored,
}

/// Test seam for child spawning; defaults to the instance task supervisor.
pub type SpawnFun = Arc<dyn Fn(ChildSpec) -> Result<SpawnResult, SpawnError> + Send + Sync>;

/// Validated reference to a parent agent, handed to child servers.
#[derive(Clone)]
pub struct ParentRef {
    pub id: String,
    pub tag: String,
    pub meta: Value,
    /// Monitor seam: resolves once with the parent's exit reason.
    pub(crate) exit: tokio::sync::watch::Receiver<Option<ExitReason>>,
}

impl ParentRef {
    pub fn new(
        id: impl Into<String>,
        tag: impl Into<String>,
        exit: tokio::sync::watch::Receiver<Option<ExitReason>>,
    ) -> Self {
        Self { id: id.into(), tag: tag.into(), meta: Value::Null, exit }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }

    /// Whether the parent has already terminated.
    pub fn is_down(&self) -> bool {
        self.exit.borrow().is_some()
    }
}

impl std::fmt::Debug for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParentRef")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("down", &self.is_down())
            .finish()
    }
}

/// Handle to a tracked child: an agent server or a plain task.
#[derive(Debug, Clone)]
pub enum ChildHandle {
    Agent(crate::server::AgentHandle),
    Task(AbortHandle),
}

/// Book-keeping for one tracked child.
#[derive(Debug)]
pub struct ChildInfo {
    pub handle: ChildHandle,
    pub monitor: MonitorRef,
    /// The monitor task feeding exits back into the parent mailbox.
    pub(crate) monitor_task: AbortHandle,
    pub module: Option<String>,
    pub id: String,
    pub tag: ChildTag,
    pub meta: Value,
}

impl ChildInfo {
    /// Stop the child and its monitor without waiting.
    pub(crate) fn abort(&self, reason: &ExitReason) {
        match &self.handle {
            ChildHandle::Agent(agent) => {
                agent.stop_async(ExitReason::Shutdown(Some(Box::new(reason.clone()))));
            }
            ChildHandle::Task(task) => task.abort(),
        }
    }
}

#[cfg(test)]
#[path = "children_tests.rs"]
mod tests;
