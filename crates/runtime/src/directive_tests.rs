// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use crate::children::ChildSpec;
use jido_core::signal::Signal;
use std::time::Duration;

fn signal(ty: &str) -> Signal {
    Signal::builder(ty).source("jido://test").build().unwrap()
}

#[test]
fn directive_names() {
    let cases: Vec<(Directive, &str)> = vec![
        (Directive::Emit { signal: signal("tick"), dispatch: None }, "emit"),
        (
            Directive::Error {
                error: Fault::Other { reason: "x".to_string() },
                context: FaultContext::Other,
            },
            "error",
        ),
        (
            Directive::Schedule {
                delay: Duration::from_millis(5),
                message: ScheduleMessage::Payload(Value::Null),
            },
            "schedule",
        ),
        (
            Directive::Spawn { spec: ChildSpec::new("worker", async {}), tag: None },
            "spawn",
        ),
        (
            Directive::StopChild {
                tag: ChildTag::named("worker"),
                reason: ExitReason::shutdown(),
            },
            "stop_child",
        ),
        (Directive::Stop { reason: ExitReason::Normal }, "stop"),
        (
            Directive::CronRegister {
                expr: "* * * * * *".to_string(),
                message: ScheduleMessage::Payload(Value::Null),
                job_id: None,
                timezone: None,
            },
            "cron_register",
        ),
        (
            Directive::CronCancel { job_id: jido_core::id::CronJobId::from_string("crn-x") },
            "cron_cancel",
        ),
        (
            Directive::SetState { path: "a.b".to_string(), value: Value::Null },
            "set_state",
        ),
    ];
    for (directive, expected) in cases {
        assert_eq!(directive.name(), expected);
    }
}

#[test]
fn fields_carry_log_context() {
    let d = Directive::StopChild {
        tag: ChildTag::named("worker"),
        reason: ExitReason::Killed,
    };
    let fields = d.fields();
    assert!(fields.iter().any(|(k, v)| *k == "tag" && v == "worker"));
    assert!(fields.iter().any(|(k, v)| *k == "reason" && v == "killed"));
}

#[test]
fn emit_fields_include_sink_when_hinted() {
    let d = Directive::Emit {
        signal: signal("tick"),
        dispatch: Some(jido_core::dispatch::DispatchHint::named("bus")),
    };
    assert!(d.fields().iter().any(|(k, v)| *k == "sink" && v == "bus"));
}

#[test]
fn verbosity_split() {
    assert!(!Directive::Emit { signal: signal("tick"), dispatch: None }.verbose());
    assert!(!Directive::SetState { path: "x".to_string(), value: Value::Null }.verbose());
    assert!(Directive::Stop { reason: ExitReason::Normal }.verbose());
}

#[test]
fn fault_context_display() {
    assert_eq!(FaultContext::SpawnAgent.to_string(), "spawn_agent");
    assert_eq!(FaultContext::Routing.to_string(), "routing");
}

#[test]
fn fault_display() {
    let f = Fault::Routing { signal_type: "nope".to_string() };
    assert_eq!(f.to_string(), "no route matched signal type \"nope\"");

    let f = Fault::Action { action: "inc".to_string(), reason: "boom".to_string() };
    assert_eq!(f.to_string(), "action inc failed: boom");
}

#[test]
fn fault_serde_round_trip() {
    let f = Fault::Spawn { reason: "supervisor gone".to_string() };
    let json = serde_json::to_value(&f).unwrap();
    let back: Fault = serde_json::from_value(json).unwrap();
    assert_eq!(back, f);
}
