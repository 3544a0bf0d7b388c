// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Workspace-level scenario specs exercising the public agent-server API
//! end to end: instances, routing, plugins, supervision, and timers.

#[path = "specs/prelude.rs"]
mod prelude;

mod specs {
    mod agent {
        mod counter;
        mod plugins;
        mod supervision;
        mod timers;
    }
}
