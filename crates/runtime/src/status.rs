// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Status snapshots and the polling status stream.

use crate::server::AgentHandle;
use crate::state::StateSnapshot;
use crate::strategy::StatusSnapshot;
use std::time::Duration;

/// Point-in-time status of an agent server.
#[derive(Debug, Clone)]
pub struct Status {
    pub agent_module: String,
    pub agent_id: String,
    /// Handle to the server the snapshot was taken from.
    pub server: AgentHandle,
    /// Strategy-computed snapshot.
    pub snapshot: StatusSnapshot,
    /// Raw state for escape-hatch access.
    pub state: StateSnapshot,
}

/// Infinite polling sequence of [`Status`] values.
///
/// Restartable: any number of independent streams may poll the same server.
/// `next` yields immediately on first call, then at the configured interval,
/// and returns `None` once the agent is gone.
pub struct StatusStream {
    handle: AgentHandle,
    interval: Duration,
    started: bool,
}

impl StatusStream {
    pub(crate) fn new(handle: AgentHandle, interval: Duration) -> Self {
        Self { handle, interval, started: false }
    }

    pub async fn next(&mut self) -> Option<Status> {
        if self.started {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;
        if !self.handle.alive() {
            return None;
        }
        Some(self.handle.status())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
