// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Instance-scoped name→server lookup table.
//!
//! Keys are agent ids. Registration lasts for the lifetime of the owning
//! server; termination unregisters.

use crate::server::{AgentHandle, ServerRef};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("agent id {0:?} is already registered")]
    IdTaken(String),
}

/// Single-writer lookup table mapping agent ids to server handles.
#[derive(Clone)]
pub struct Registry {
    name: String,
    table: Arc<RwLock<HashMap<String, AgentHandle>>>,
}

impl Registry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), table: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn register(&self, id: &str, handle: AgentHandle) -> Result<(), RegistryError> {
        let mut table = self.table.write();
        if table.contains_key(id) {
            return Err(RegistryError::IdTaken(id.to_string()));
        }
        table.insert(id.to_string(), handle);
        Ok(())
    }

    pub(crate) fn unregister(&self, id: &str) {
        self.table.write().remove(id);
    }

    /// Look up a registered server. Dead entries resolve to `None` at the
    /// `ServerRef` layer.
    pub fn whereis(&self, id: &str) -> Option<AgentHandle> {
        self.table.read().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.table.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

/// Canonical registry-bound reference for foreign callers.
pub fn via_tuple(id: impl Into<String>, registry: &Registry) -> ServerRef {
    ServerRef::Via { registry: registry.clone(), id: id.into() }
}

/// Registry lookup helper mirroring the reference resolution rules.
pub fn whereis(registry: &Registry, id: &str) -> Option<AgentHandle> {
    registry.whereis(id).filter(|h| h.alive())
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
