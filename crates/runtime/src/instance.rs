// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Named instance: the root container binding a registry, an agent
//! supervisor, and a worker-task supervisor.
//!
//! Instance names are unique per process. Spawn seams hold only weak
//! references; when the instance is gone, spawning fails explicitly instead
//! of falling back to anything process-wide.

use crate::children::{ChildSpec, SpawnError, SpawnFun, SpawnResult, SpawnedTask};
use crate::errors::{InstanceError, StartError};
use crate::options::StartOptions;
use crate::registry::Registry;
use crate::server::AgentHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};
use tokio::task::AbortHandle;

fn instances() -> &'static Mutex<HashMap<String, Weak<InstanceInner>>> {
    static TABLE: OnceLock<Mutex<HashMap<String, Weak<InstanceInner>>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

pub(crate) struct InstanceInner {
    name: String,
    registry: Registry,
    /// Root agents started through this instance.
    agents: Mutex<Vec<AgentHandle>>,
    /// Fire-and-forget worker tasks.
    tasks: Mutex<Vec<AbortHandle>>,
}

impl Drop for InstanceInner {
    fn drop(&mut self) {
        let mut table = instances().lock();
        if let Some(weak) = table.get(&self.name) {
            if weak.strong_count() == 0 {
                table.remove(&self.name);
            }
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

/// Handle to a named instance.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    /// Start a named instance. Fails if the name is already taken.
    pub fn start(name: impl Into<String>) -> Result<Self, InstanceError> {
        let name = name.into();
        let mut table = instances().lock();
        table.retain(|_, weak| weak.strong_count() > 0);
        if table.contains_key(&name) {
            return Err(InstanceError::NameTaken(name));
        }
        let inner = Arc::new(InstanceInner {
            registry: Registry::new(name.clone()),
            name: name.clone(),
            agents: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
        });
        table.insert(name, Arc::downgrade(&inner));
        Ok(Self { inner })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Registry name accessor.
    pub fn registry_name(&self) -> &str {
        self.inner.registry.name()
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn agent_supervisor(&self) -> AgentSupervisor {
        AgentSupervisor { inner: Arc::downgrade(&self.inner) }
    }

    pub fn task_supervisor(&self) -> TaskSupervisor {
        TaskSupervisor { inner: Arc::downgrade(&self.inner) }
    }

    /// Validate options, start the agent server under this instance, and
    /// register it. Returns the handle and the resolved agent id.
    pub fn start_agent(
        &self,
        mut options: StartOptions,
    ) -> Result<(AgentHandle, String), StartError> {
        if options.registry.is_none() {
            options.registry = Some(self.inner.registry.clone());
        }
        if options.spawn_fun.is_none() {
            options.spawn_fun = Some(self.spawn_fun());
        }
        let handle = crate::server::start(options)?;
        let id = handle.id().to_string();
        {
            let mut agents = self.inner.agents.lock();
            agents.retain(|a| a.alive());
            agents.push(handle.clone());
        }
        Ok((handle, id))
    }

    /// Child-spawn seam bound to this instance's task supervisor.
    pub fn spawn_fun(&self) -> SpawnFun {
        let supervisor = self.task_supervisor();
        Arc::new(move |spec: ChildSpec| {
            let task = supervisor.spawn_child(spec)?;
            Ok(SpawnResult::Spawned(task))
        })
    }

    /// Stop every agent started through this instance and abort worker tasks.
    pub async fn shutdown(&self) {
        let agents: Vec<AgentHandle> = self.inner.agents.lock().drain(..).collect();
        for agent in agents {
            agent.stop(crate::children::ExitReason::shutdown()).await;
        }
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.inner.name)
            .field("agents", &self.inner.agents.lock().len())
            .finish()
    }
}

/// View of the dynamic supervisor for agent servers.
#[derive(Clone)]
pub struct AgentSupervisor {
    inner: Weak<InstanceInner>,
}

impl AgentSupervisor {
    /// Number of live agents under supervision.
    pub fn count(&self) -> usize {
        match self.inner.upgrade() {
            Some(inner) => {
                let mut agents = inner.agents.lock();
                agents.retain(|a| a.alive());
                agents.len()
            }
            None => 0,
        }
    }
}

/// View of the worker-task supervisor.
#[derive(Clone)]
pub struct TaskSupervisor {
    inner: Weak<InstanceInner>,
}

impl TaskSupervisor {
    /// Spawn a supervised child task. Fails explicitly when the instance is
    /// gone; there is no process-wide fallback.
    pub(crate) fn spawn_child(&self, spec: ChildSpec) -> Result<SpawnedTask, SpawnError> {
        let inner = self.inner.upgrade().ok_or(SpawnError::SupervisorMissing)?;
        let id = spec.id.clone();
        let join = tokio::spawn(spec.into_task());
        let mut tasks = inner.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(join.abort_handle());
        Ok(SpawnedTask { id, join })
    }

    /// Fire-and-forget task under the supervisor.
    pub fn spawn(
        &self,
        id: impl Into<String>,
        task: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), SpawnError> {
        self.spawn_child(ChildSpec::new(id, task)).map(|_| ())
    }

    pub fn count(&self) -> usize {
        match self.inner.upgrade() {
            Some(inner) => {
                let mut tasks = inner.tasks.lock();
                tasks.retain(|t| !t.is_finished());
                tasks.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
