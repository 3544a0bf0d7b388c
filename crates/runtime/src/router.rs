// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Routing-table construction from the agent's metadata.
//!
//! Four sources, in order: strategy routes, agent routes, plugin/skill
//! routes, plugin schedule routes. Later entries override earlier ones on
//! identical (pattern, priority).

use crate::agent::{AgentModule, RouteCtx};
use crate::errors::StartError;
use crate::plugin::InstalledPlugin;
use crate::strategy::Strategy;
use jido_core::route::{RouteSpec, Router};
use jido_core::signal::types as signal_types;
use std::sync::Arc;

/// Default priority for strategy-contributed routes.
pub const STRATEGY_PRIORITY: i32 = 50;
/// Default priority for agent-contributed routes.
pub const AGENT_PRIORITY: i32 = 0;
/// Default priority for plugin/skill routes.
pub const PLUGIN_PRIORITY: i32 = -10;

pub(crate) struct RouterSources<'a> {
    pub module: &'a Arc<dyn AgentModule>,
    pub strategy: &'a Arc<dyn Strategy>,
    pub plugins: &'a [InstalledPlugin],
    pub ctx: RouteCtx,
    pub skip_schedules: bool,
}

pub(crate) fn build_router(sources: RouterSources<'_>) -> Result<Router, StartError> {
    let mut entries: Vec<(RouteSpec, i32)> = Vec::new();

    for spec in sources.strategy.signal_routes(&sources.ctx) {
        entries.push((spec, STRATEGY_PRIORITY));
    }

    for spec in sources.module.signal_routes(&sources.ctx) {
        entries.push((spec, AGENT_PRIORITY));
    }

    for installed in sources.plugins {
        let plugin = &installed.instance.plugin;
        match plugin.signal_routes(&installed.instance.config) {
            Some(routes) => {
                for spec in routes {
                    entries.push((spec, PLUGIN_PRIORITY));
                }
            }
            // No explicit route list: one route per declared pattern × action.
            None => {
                let actions = plugin.actions();
                for pattern in plugin.signal_patterns() {
                    for action in &actions {
                        entries.push((
                            RouteSpec::to_action(pattern.clone(), action.name()),
                            PLUGIN_PRIORITY,
                        ));
                    }
                }
            }
        }
    }

    if !sources.skip_schedules {
        for installed in sources.plugins {
            let key = installed.state_key().to_string();
            for schedule in installed.instance.plugin.schedules() {
                let ty = signal_types::plugin_schedule(&key, &schedule.action);
                entries.push((RouteSpec::to_action(ty, schedule.action.clone()), PLUGIN_PRIORITY));
            }
        }
    }

    Ok(Router::build(entries)?)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
