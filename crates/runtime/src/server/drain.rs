// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The drain loop: one task per server, exclusive owner of signal
//! processing.
//!
//! While the queue is non-empty and the server is idle, a pass dequeues
//! entries in FIFO order and runs them through the signal pipeline or the
//! directive executor. The `processing` flag enforces at most one pass;
//! work arriving mid-pass piles into the queue and is picked up at the tail.

use super::{executor, init, pipeline, Control, ServerShared};
use crate::children::{ChildInfo, ChildTag, ExitReason, OnParentDeath};
use crate::errors::ServerError;
use crate::lifecycle::LifecycleEvent;
use crate::state::{AgentStatus, QueueEntry, Replier};
use jido_core::signal::{types as signal_types, Signal};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A synchronous call waiting for its signal's directives to finish.
pub(crate) struct Batch {
    pub replier: Replier,
    pub remaining: usize,
    /// The (possibly plugin-replaced) signal, for result transformation.
    pub signal: Signal,
}

/// Book-keeping local to the drain task.
pub(crate) struct DrainCtx {
    pub batches: HashMap<u64, Batch>,
    pub next_batch: u64,
}

impl DrainCtx {
    fn new() -> Self {
        Self { batches: HashMap::new(), next_batch: 0 }
    }

    /// Reserve a batch id before appending its entries to the queue.
    pub fn reserve(&mut self) -> u64 {
        let id = self.next_batch;
        self.next_batch += 1;
        id
    }

    pub fn insert(&mut self, id: u64, batch: Batch) {
        self.batches.insert(id, batch);
    }
}

pub(crate) async fn run(shared: Arc<ServerShared>, mut control_rx: mpsc::UnboundedReceiver<Control>) {
    init::post_init(&shared).await;
    {
        let mut st = shared.state.lock();
        if st.status == AgentStatus::Initializing {
            st.status = AgentStatus::Idle;
        }
    }
    tracing::debug!(agent_id = %shared.config.id, module = %shared.config.module_name, "agent ready");

    loop {
        if let Some(reason) = drain_pass(&shared).await {
            terminate(&shared, reason).await;
            return;
        }
        tokio::select! {
            _ = shared.wake.notified() => {}
            control = control_rx.recv() => match control {
                Some(Control::Stop { reason }) => {
                    terminate(&shared, reason).await;
                    return;
                }
                Some(Control::ChildDown { tag, reason }) => {
                    child_down(&shared, tag, reason).await;
                }
                Some(Control::ParentDown { reason }) => {
                    if let Some(exit) = parent_down(&shared, reason).await {
                        terminate(&shared, exit).await;
                        return;
                    }
                }
                // All control senders live in `shared`; kept alive while we run.
                None => {}
            }
        }
    }
}

/// One pass over the queue. Returns the stop reason if a directive asked the
/// server to terminate mid-pass.
async fn drain_pass(shared: &Arc<ServerShared>) -> Option<ExitReason> {
    {
        let mut st = shared.state.lock();
        if st.processing || st.status != AgentStatus::Idle || st.queue.is_empty() {
            return None;
        }
        st.processing = true;
        st.status = AgentStatus::Processing;
    }

    let mut ctx = DrainCtx::new();
    let mut stop: Option<ExitReason> = None;

    loop {
        let entry = { shared.state.lock().queue.pop_front() };
        let Some(entry) = entry else {
            break;
        };
        match entry {
            QueueEntry::Ingress { signal, replier } => {
                pipeline::process_signal(shared, signal, replier, &mut ctx).await;
            }
            QueueEntry::Directive { directive, batch } => {
                let outcome = executor::execute(shared, directive).await;
                shared.state.lock().metrics.directives_executed += 1;
                if let Some(batch_id) = batch {
                    settle_batch_entry(shared, &mut ctx, batch_id).await;
                }
                if let executor::ExecOutcome::Stop(reason) = outcome {
                    stop = Some(reason);
                    break;
                }
            }
        }
    }

    // A stop mid-pass strands any open batches; their callers get a
    // structured shutdown error rather than a dropped channel.
    for (_, batch) in ctx.batches.drain() {
        let _ = batch.replier.send(Err(ServerError::ShuttingDown));
    }

    {
        let mut st = shared.state.lock();
        st.processing = false;
        if stop.is_none() {
            st.status = AgentStatus::Idle;
        }
    }
    if stop.is_none() {
        notify_waiters_if_done(shared);
    }
    stop
}

/// Mark one directive of a batch as executed; completing the batch replies
/// to the synchronous caller with the transformed agent view.
async fn settle_batch_entry(shared: &Arc<ServerShared>, ctx: &mut DrainCtx, batch_id: u64) {
    let done = match ctx.batches.get_mut(&batch_id) {
        Some(batch) => {
            batch.remaining = batch.remaining.saturating_sub(1);
            batch.remaining == 0
        }
        None => false,
    };
    if !done {
        return;
    }
    if let Some(batch) = ctx.batches.remove(&batch_id) {
        let view = pipeline::transform_view(shared, &batch.signal).await;
        let _ = batch.replier.send(Ok(view));
    }
}

/// Release parked completion waiters once the strategy reports a terminal
/// snapshot.
fn notify_waiters_if_done(shared: &Arc<ServerShared>) {
    let mut st = shared.state.lock();
    if st.completion_waiters.is_empty() {
        return;
    }
    let view = ServerShared::strategy_view(&st);
    let snapshot = shared.config.strategy.snapshot(&view);
    if !snapshot.done {
        return;
    }
    for (_, waiter) in st.completion_waiters.drain() {
        let _ = waiter.send(Ok(snapshot.result.clone()));
    }
}

/// A monitored child exited: drop the entry and deliver a child-exit signal.
/// DOWN messages for untracked children are ignored.
async fn child_down(shared: &Arc<ServerShared>, tag: ChildTag, reason: ExitReason) {
    let info = { shared.state.lock().children.shift_remove(&tag) };
    let Some(info) = info else {
        return;
    };
    info.monitor_task.abort();
    tracing::info!(
        agent_id = %shared.config.id,
        tag = %tag,
        child_id = %info.id,
        reason = %reason,
        "child exited"
    );

    let data = json!({
        "tag": tag.to_string(),
        "id": info.id,
        "reason": reason.clone(),
    });
    match Signal::builder(signal_types::CHILD_EXIT)
        .source(shared.config.source.clone())
        .data(data)
        .build()
    {
        Ok(signal) => shared.enqueue_internal(signal),
        Err(e) => tracing::warn!(agent_id = %shared.config.id, error = %e, "bad child-exit signal"),
    }

    let agent = shared.state.lock().agent.clone();
    shared
        .config
        .lifecycle
        .event(LifecycleEvent::ChildExited { tag, reason }, &agent)
        .await;
}

/// The parent went away. Returns the exit reason when this server should
/// stop too.
async fn parent_down(shared: &Arc<ServerShared>, reason: ExitReason) -> Option<ExitReason> {
    let (behaviour, parent_id) = {
        let st = shared.state.lock();
        (st.on_parent_death, st.parent.as_ref().map(|p| p.id.clone()))
    };
    let parent_id = parent_id?;

    let agent = shared.state.lock().agent.clone();
    shared
        .config
        .lifecycle
        .event(LifecycleEvent::ParentDown { reason: reason.clone() }, &agent)
        .await;

    match behaviour {
        OnParentDeath::Stop => Some(if reason.is_benign() {
            ExitReason::Shutdown(Some(Box::new(ExitReason::ParentDown(Box::new(reason)))))
        } else {
            ExitReason::ParentDown(Box::new(reason))
        }),
        OnParentDeath::Continue => {
            tracing::warn!(
                agent_id = %shared.config.id,
                parent_id = %parent_id,
                reason = %reason,
                "parent went away, continuing without it"
            );
            shared.state.lock().parent = None;
            None
        }
        OnParentDeath::EmitOrphan => {
            let data = json!({ "parent_id": parent_id, "reason": reason });
            match Signal::builder(signal_types::ORPHANED)
                .source(shared.config.source.clone())
                .data(data)
                .build()
            {
                Ok(signal) => shared.enqueue_internal(signal),
                Err(e) => {
                    tracing::warn!(agent_id = %shared.config.id, error = %e, "bad orphan signal");
                }
            }
            shared.state.lock().parent = None;
            None
        }
    }
}

/// Orderly termination: cancel timers and cron jobs, stop children, release
/// waiters and pending callers, run lifecycle terminate, deregister, publish
/// the exit reason.
async fn terminate(shared: &Arc<ServerShared>, reason: ExitReason) {
    tracing::info!(agent_id = %shared.config.id, reason = %reason, "agent terminating");

    let (agent, children, timers, crons, waiters, repliers, aux) = {
        let mut st = shared.state.lock();
        st.status = AgentStatus::ShuttingDown;
        st.exit_reason = Some(reason.clone());

        let children: Vec<ChildInfo> = st.children.drain(..).map(|(_, info)| info).collect();
        let timers: Vec<_> = st.scheduled_timers.drain().map(|(_, h)| h).collect();
        let crons: Vec<_> = st.cron_jobs.drain().map(|(_, h)| h).collect();
        let waiters: Vec<_> = st.completion_waiters.drain().map(|(_, w)| w).collect();
        let mut repliers = Vec::new();
        while let Some(entry) = st.queue.pop_front() {
            if let QueueEntry::Ingress { replier: Some(replier), .. } = entry {
                repliers.push(replier);
            }
        }
        let aux = std::mem::take(&mut st.aux_tasks);
        (st.agent.clone(), children, timers, crons, waiters, repliers, aux)
    };

    for timer in &timers {
        timer.cancel();
    }
    drop(timers);
    for cron in &crons {
        cron.cancel();
    }
    drop(crons);
    for child in &children {
        child.monitor_task.abort();
        match &child.handle {
            // Agent children observe our exit through their parent monitor
            // and cascade with a parent-down reason.
            crate::children::ChildHandle::Agent(_) => {}
            crate::children::ChildHandle::Task(task) => task.abort(),
        }
    }
    for task in aux {
        task.abort();
    }
    for waiter in waiters {
        let _ = waiter.send(Err(ServerError::ShuttingDown));
    }
    for replier in repliers {
        let _ = replier.send(Err(ServerError::ShuttingDown));
    }

    shared.config.lifecycle.terminate(&reason, &agent).await;

    if let Some(registry) = &shared.config.registry {
        registry.unregister(&shared.config.id);
    }
    // send_replace: the exit reason must be recorded even with no live
    // subscribers, or alive() would report a dead server as running.
    shared.exit_tx.send_replace(Some(reason));
}
