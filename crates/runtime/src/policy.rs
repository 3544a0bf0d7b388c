// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Error policies: what an `Error` directive does to the server.

use crate::agent::AgentValue;
use crate::children::ExitReason;
use crate::directive::{Fault, FaultContext};
use jido_core::dispatch::DispatchHint;
use std::sync::Arc;

/// Decision returned by a user-supplied policy function.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDecision {
    Continue,
    Stop(ExitReason),
}

/// User-supplied policy function.
pub type PolicyFn = Arc<dyn Fn(&Fault, &AgentValue) -> PolicyDecision + Send + Sync>;

/// Built-in error policies plus the user-function escape hatch.
#[derive(Clone, Default)]
pub enum ErrorPolicy {
    /// Log with context and continue.
    #[default]
    LogOnly,
    /// Log and stop with `agent_error`.
    StopOnError,
    /// Emit an error signal through the given dispatch config; continue.
    EmitSignal(DispatchHint),
    /// Stop once the error count reaches `n`.
    MaxErrors(u32),
    Custom(PolicyFn),
}

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::LogOnly => write!(f, "LogOnly"),
            ErrorPolicy::StopOnError => write!(f, "StopOnError"),
            ErrorPolicy::EmitSignal(hint) => write!(f, "EmitSignal({})", hint.sink),
            ErrorPolicy::MaxErrors(n) => write!(f, "MaxErrors({n})"),
            ErrorPolicy::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

/// What the executor should do after consulting the policy.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PolicyOutcome {
    Continue,
    /// Emit an error signal through the hint, then continue.
    Emit(DispatchHint),
    Stop(ExitReason),
}

/// Map a fault to an outcome. `error_count` is the count after this fault
/// was recorded.
pub(crate) fn decide(
    policy: &ErrorPolicy,
    fault: &Fault,
    context: FaultContext,
    error_count: u64,
    agent: &AgentValue,
) -> PolicyOutcome {
    match policy {
        ErrorPolicy::LogOnly => {
            tracing::error!(%context, error = %fault, agent_id = %agent.id, "agent error");
            PolicyOutcome::Continue
        }
        ErrorPolicy::StopOnError => {
            tracing::error!(%context, error = %fault, agent_id = %agent.id, "agent error, stopping");
            PolicyOutcome::Stop(ExitReason::AgentError(fault.to_string()))
        }
        ErrorPolicy::EmitSignal(hint) => PolicyOutcome::Emit(hint.clone()),
        ErrorPolicy::MaxErrors(n) => {
            if error_count >= u64::from(*n) {
                PolicyOutcome::Stop(ExitReason::MaxErrorsExceeded(*n))
            } else {
                tracing::error!(
                    %context,
                    error = %fault,
                    agent_id = %agent.id,
                    error_count,
                    max_errors = n,
                    "agent error"
                );
                PolicyOutcome::Continue
            }
        }
        ErrorPolicy::Custom(f) => {
            let f = Arc::clone(f);
            let decision =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(fault, agent)));
            match decision {
                Ok(PolicyDecision::Continue) => PolicyOutcome::Continue,
                Ok(PolicyDecision::Stop(reason)) => PolicyOutcome::Stop(reason),
                Err(_) => {
                    tracing::warn!(
                        %context,
                        error = %fault,
                        agent_id = %agent.id,
                        "error policy function panicked, continuing"
                    );
                    PolicyOutcome::Continue
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
