// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The per-agent mutable state record.
//!
//! Owned by the server's drain task; every other access goes through short
//! lock-guarded snapshots. The invariants here are the load-bearing ones:
//! at most one drain pass (`processing`), bounded FIFO queue, and handle
//! maps that mirror actually armed timers and monitored children.

use crate::agent::AgentValue;
use crate::children::{ChildInfo, ChildTag, ExitReason, OnParentDeath, ParentRef};
use crate::directive::Directive;
use crate::scheduler::{CronHandle, TimerHandle};
use indexmap::IndexMap;
use jido_core::id::{CronJobId, TimerRef, WaiterRef};
use jido_core::signal::Signal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Externally visible lifecycle status of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Initializing,
    Idle,
    Processing,
    ShuttingDown,
}

/// Reply channel for a synchronous call: the agent view after the signal's
/// directives have executed, or a structured error.
pub(crate) type Replier = oneshot::Sender<Result<AgentValue, crate::errors::ServerError>>;

/// Reply channel for a parked completion waiter.
pub(crate) type CompletionReplier =
    oneshot::Sender<Result<Option<Value>, crate::errors::ServerError>>;

/// One unit of pending work in the mailbox.
pub(crate) enum QueueEntry {
    /// An ingress signal to run through the signal pipeline.
    Ingress { signal: Signal, replier: Option<Replier> },
    /// A directive to execute; `batch` ties it back to the synchronous call
    /// whose signal produced it.
    Directive { directive: Directive, batch: Option<u64> },
}

impl std::fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueEntry::Ingress { signal, replier } => f
                .debug_struct("Ingress")
                .field("signal", &signal.log_summary())
                .field("sync", &replier.is_some())
                .finish(),
            QueueEntry::Directive { directive, batch } => f
                .debug_struct("Directive")
                .field("directive", &directive.name())
                .field("batch", batch)
                .finish(),
        }
    }
}

/// Counters kept per agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub signals_processed: u64,
    pub directives_executed: u64,
    pub faults: u64,
}

/// The mutable record backing one agent server.
pub struct AgentState {
    pub id: String,
    pub module_name: String,
    pub agent: AgentValue,
    pub status: AgentStatus,
    /// True iff a drain pass is in progress.
    pub processing: bool,
    pub(crate) queue: VecDeque<QueueEntry>,
    pub max_queue_size: usize,
    pub(crate) children: IndexMap<ChildTag, ChildInfo>,
    pub(crate) parent: Option<ParentRef>,
    pub on_parent_death: OnParentDeath,
    pub(crate) scheduled_timers: HashMap<TimerRef, TimerHandle>,
    pub(crate) cron_jobs: HashMap<CronJobId, CronHandle>,
    pub error_count: u64,
    pub(crate) completion_waiters: HashMap<WaiterRef, CompletionReplier>,
    pub metrics: Metrics,
    /// Auxiliary tasks (parent watch, sensor forwarders) aborted on terminate.
    pub(crate) aux_tasks: Vec<AbortHandle>,
    pub(crate) exit_reason: Option<ExitReason>,
}

impl AgentState {
    pub(crate) fn new(
        id: String,
        module_name: String,
        agent: AgentValue,
        max_queue_size: usize,
        parent: Option<ParentRef>,
        on_parent_death: OnParentDeath,
    ) -> Self {
        Self {
            id,
            module_name,
            agent,
            status: AgentStatus::Initializing,
            processing: false,
            queue: VecDeque::new(),
            max_queue_size,
            children: IndexMap::new(),
            parent,
            on_parent_death,
            scheduled_timers: HashMap::new(),
            cron_jobs: HashMap::new(),
            error_count: 0,
            completion_waiters: HashMap::new(),
            metrics: Metrics::default(),
            aux_tasks: Vec::new(),
            exit_reason: None,
        }
    }

    /// Cloneable view of the full state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            id: self.id.clone(),
            module_name: self.module_name.clone(),
            agent: self.agent.clone(),
            status: self.status,
            processing: self.processing,
            queue_len: self.queue.len(),
            max_queue_size: self.max_queue_size,
            children: self.children.keys().cloned().collect(),
            parent_id: self.parent.as_ref().map(|p| p.id.clone()),
            on_parent_death: self.on_parent_death,
            scheduled_timers: self.scheduled_timers.keys().copied().collect(),
            cron_jobs: self.cron_jobs.keys().copied().collect(),
            error_count: self.error_count,
            waiter_count: self.completion_waiters.len(),
            metrics: self.metrics,
            exit_reason: self.exit_reason.clone(),
        }
    }
}

/// Point-in-time view of the entire state record.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub id: String,
    pub module_name: String,
    pub agent: AgentValue,
    pub status: AgentStatus,
    pub processing: bool,
    pub queue_len: usize,
    pub max_queue_size: usize,
    pub children: Vec<ChildTag>,
    pub parent_id: Option<String>,
    pub on_parent_death: OnParentDeath,
    pub scheduled_timers: Vec<TimerRef>,
    pub cron_jobs: Vec<CronJobId>,
    pub error_count: u64,
    pub waiter_count: usize,
    pub metrics: Metrics,
    pub exit_reason: Option<ExitReason>,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
