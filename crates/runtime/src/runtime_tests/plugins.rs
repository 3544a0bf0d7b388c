// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Plugin middleware, result transforms, children, sensors, and isolation.

use super::*;
use crate::agent::{AgentModule, AgentValue};
use crate::children::{ChildSpec, ChildTag, ExitReason};
use crate::errors::ServerError;
use crate::plugin::{HandleOutcome, Plugin, PluginCtx, PluginError, PluginInstance};
use crate::sensor::Sensor;
use serde_json::json;
use tokio::sync::mpsc;

/// Rejects every signal matching `counter.*`.
struct RejectingPlugin;

#[async_trait]
impl Plugin for RejectingPlugin {
    fn state_key(&self) -> &str {
        "rejector"
    }

    fn signal_patterns(&self) -> Vec<String> {
        vec!["counter.*".to_string()]
    }

    async fn handle_signal(
        &self,
        _signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        Err(PluginError::Rejected("rejected".to_string()))
    }
}

/// Stamps the returned view; never touches stored state.
struct TransformPlugin;

#[async_trait]
impl Plugin for TransformPlugin {
    fn state_key(&self) -> &str {
        "transformer"
    }

    async fn transform_result(&self, mut agent: AgentValue, _ctx: PluginCtx) -> AgentValue {
        agent.set_path("transformed_by", json!("transformer"));
        agent
    }
}

/// Wraps `{amount}` data with a marker for the next plugin.
struct PrefixPlugin;

#[async_trait]
impl Plugin for PrefixPlugin {
    fn state_key(&self) -> &str {
        "prefixer"
    }

    async fn handle_signal(
        &self,
        signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        let Some(amount) = signal.data.get("amount").cloned() else {
            return Ok(HandleOutcome::Continue);
        };
        let mut replacement = signal.clone();
        replacement.data = json!({"amount": amount, "prefix_applied": true});
        Ok(HandleOutcome::Replace(replacement))
    }
}

/// Triples `amount`, but only when the prefix marker is present.
struct TriplePlugin;

#[async_trait]
impl Plugin for TriplePlugin {
    fn state_key(&self) -> &str {
        "tripler"
    }

    async fn handle_signal(
        &self,
        signal: Signal,
        _ctx: PluginCtx,
    ) -> Result<HandleOutcome, PluginError> {
        if signal.data.get("prefix_applied") != Some(&json!(true)) {
            return Ok(HandleOutcome::Continue);
        }
        let amount = signal.data.get("amount").and_then(Value::as_i64).unwrap_or(0);
        let mut replacement = signal.clone();
        replacement.data = json!({"amount": amount * 3, "prefix_applied": true});
        Ok(HandleOutcome::Replace(replacement))
    }
}

struct PluggedModule {
    plugins: Vec<PluginInstance>,
}

impl AgentModule for PluggedModule {
    fn name(&self) -> &str {
        "plugged"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("counter.increment", "increment"),
            RouteSpec::to_action("other.increment", "increment"),
            RouteSpec::to_action("increment", "increment"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![Arc::new(IncrementAction)]
    }

    fn plugins(&self) -> Vec<PluginInstance> {
        self.plugins.clone()
    }
}

fn start_with_plugins(plugins: Vec<PluginInstance>) -> AgentHandle {
    crate::server::start(StartOptions::module(Arc::new(PluggedModule { plugins }))).unwrap()
}

#[tokio::test]
async fn rejecting_plugin_blocks_matching_signals_only() {
    let handle = start_with_plugins(vec![PluginInstance::new(Arc::new(RejectingPlugin))]);

    let err = handle.call(signal_with("counter.increment", json!({"amount": 1}))).await.unwrap_err();
    match err {
        ServerError::Plugin { plugin, .. } => assert_eq!(plugin, "rejector"),
        other => panic!("unexpected: {other}"),
    }
    // Rejected signal must not mutate state.
    assert_eq!(handle.state().agent.get("counter"), None);

    // Non-matching signal passes the plugin untouched.
    let view = handle.call(signal_with("other.increment", json!({"amount": 1}))).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(1)));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn transform_result_affects_view_not_state() {
    let handle = start_with_plugins(vec![PluginInstance::new(Arc::new(TransformPlugin))]);

    let view = handle.call(signal("increment")).await.unwrap();
    assert_eq!(view.get("transformed_by"), Some(&json!("transformer")));

    // The stored state never saw the transform.
    assert_eq!(handle.state().agent.get("transformed_by"), None);
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn middleware_composes_in_declaration_order() {
    let handle = start_with_plugins(vec![
        PluginInstance::new(Arc::new(PrefixPlugin)),
        PluginInstance::new(Arc::new(TriplePlugin)),
    ]);

    let view = handle.call(signal_with("increment", json!({"amount": 4}))).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(12)));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn panicking_plugin_aborts_signal_not_server() {
    struct PanickingPlugin;

    #[async_trait]
    impl Plugin for PanickingPlugin {
        fn state_key(&self) -> &str {
            "panicker"
        }

        async fn handle_signal(
            &self,
            _signal: Signal,
            _ctx: PluginCtx,
        ) -> Result<HandleOutcome, PluginError> {
            panic!("middleware exploded")
        }
    }

    let handle = start_with_plugins(vec![PluginInstance::new(Arc::new(PanickingPlugin))]);
    let err = handle.call(signal("increment")).await.unwrap_err();
    assert!(matches!(err, ServerError::Plugin { .. }));
    assert!(handle.alive(), "server survives plugin panics");
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn slow_plugin_times_out() {
    struct SlowPlugin;

    #[async_trait]
    impl Plugin for SlowPlugin {
        fn state_key(&self) -> &str {
            "sloth"
        }

        async fn handle_signal(
            &self,
            _signal: Signal,
            _ctx: PluginCtx,
        ) -> Result<HandleOutcome, PluginError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(HandleOutcome::Continue)
        }
    }

    let handle = crate::server::start(
        StartOptions::module(Arc::new(PluggedModule {
            plugins: vec![PluginInstance::new(Arc::new(SlowPlugin))],
        }))
        .plugin_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let err = handle.call(signal("increment")).await.unwrap_err();
    match err {
        ServerError::Plugin { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("unexpected: {other}"),
    }
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn override_bypasses_routing() {
    struct OverridePlugin;

    #[async_trait]
    impl Plugin for OverridePlugin {
        fn state_key(&self) -> &str {
            "overrider"
        }

        async fn handle_signal(
            &self,
            _signal: Signal,
            _ctx: PluginCtx,
        ) -> Result<HandleOutcome, PluginError> {
            Ok(HandleOutcome::Override {
                action: "increment".to_string(),
                params: Some(json!({"amount": 7})),
                signal: None,
            })
        }
    }

    let handle = start_with_plugins(vec![PluginInstance::new(Arc::new(OverridePlugin))]);
    // "unrouted" has no route; the override supplies the action directly.
    let view = handle.call(signal("unrouted")).await.unwrap();
    assert_eq!(view.get("counter"), Some(&json!(7)));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn plugin_children_and_sensors_start_monitored() {
    struct TickSensor;

    #[async_trait]
    impl Sensor for TickSensor {
        fn name(&self) -> &str {
            "tick-sensor"
        }

        async fn run(self: Arc<Self>, emit: mpsc::Sender<Signal>) {
            let _ = emit.send(signal("increment")).await;
            // Stay alive so the child entry persists.
            std::future::pending::<()>().await;
        }
    }

    struct ChildBearingPlugin;

    #[async_trait]
    impl Plugin for ChildBearingPlugin {
        fn state_key(&self) -> &str {
            "bearer"
        }

        fn child_specs(&self, _config: &Value) -> Vec<ChildSpec> {
            vec![ChildSpec::new("background", std::future::pending::<()>())]
        }

        fn sensors(&self) -> Vec<Arc<dyn Sensor>> {
            vec![Arc::new(TickSensor)]
        }
    }

    let instance = crate::instance::Instance::start("plugin-children-test").unwrap();
    let (handle, _id) = instance
        .start_agent(
            StartOptions::module(Arc::new(PluggedModule {
                plugins: vec![PluginInstance::new(Arc::new(ChildBearingPlugin))],
            }))
            .id("bearer-agent"),
        )
        .unwrap();

    // The sensor emitted a signal that flows into the mailbox.
    eventually(|| handle.state().agent.get("counter") == Some(&json!(1))).await;

    let children = handle.state().children;
    assert!(children.iter().any(|tag| matches!(
        tag,
        ChildTag::Plugin { plugin, .. } if plugin == "bearer"
    )));
    assert!(children.iter().any(|tag| matches!(
        tag,
        ChildTag::Sensor { plugin, .. } if plugin == "bearer"
    )));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn plugin_schedules_register_cron_jobs_unless_skipped() {
    struct ScheduledPlugin;

    #[async_trait]
    impl Plugin for ScheduledPlugin {
        fn state_key(&self) -> &str {
            "sched"
        }

        fn actions(&self) -> Vec<Arc<dyn Action>> {
            vec![Arc::new(IncrementAction)]
        }

        fn schedules(&self) -> Vec<crate::plugin::PluginSchedule> {
            vec![crate::plugin::PluginSchedule {
                cron: "* * * * * *".to_string(),
                timezone: None,
                action: "increment".to_string(),
            }]
        }
    }

    let handle = start_with_plugins(vec![PluginInstance::new(Arc::new(ScheduledPlugin))]);
    eventually(|| handle.state().cron_jobs.len() == 1).await;
    handle.stop(ExitReason::shutdown()).await;

    let skipped = crate::server::start(
        StartOptions::module(Arc::new(PluggedModule {
            plugins: vec![PluginInstance::new(Arc::new(ScheduledPlugin))],
        }))
        .skip_schedules(true),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(skipped.state().cron_jobs.is_empty());
    skipped.stop(ExitReason::shutdown()).await;
}
