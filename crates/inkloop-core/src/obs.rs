//! Structured observability hooks for the run lifecycle.
//!
//! Every event carries an `event = "..."` field so log pipelines can filter
//! on it:
//!
//! - `run.started`, `step.completed`, `run.finished` at info
//! - `run.failed`, `research.query_failed` at warn
//! - `parser.fallback` at debug

use std::time::Instant;

use tracing::{debug, info, warn, Span};

use crate::domain::EditorPhase;
use crate::roles::Role;
use crate::router::{NextStep, TerminationReason};

/// Run-scoped span plus its start time.
///
/// The span is not entered here: the control loop is async, so the run
/// future is instrumented with [`RunSpan::span`] instead.
pub struct RunSpan {
    span: Span,
    started: Instant,
}

impl RunSpan {
    pub fn new(run_id: &str, topic: &str) -> Self {
        Self {
            span: tracing::info_span!("inkloop.run", run_id = %run_id, topic = %topic),
            started: Instant::now(),
        }
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

pub fn emit_run_started(run_id: &str, topic: &str, step_budget: u64) {
    info!(
        event = "run.started",
        run_id = %run_id,
        topic = %topic,
        step_budget = step_budget,
    );
}

pub fn emit_step_completed(
    run_id: &str,
    seq: u64,
    role: Role,
    phase: Option<EditorPhase>,
    next: NextStep,
    changed: &[&str],
) {
    info!(
        event = "step.completed",
        run_id = %run_id,
        seq = seq,
        role = %role,
        phase = %phase.map(|p| p.to_string()).unwrap_or_default(),
        next = %next,
        changed = %changed.join(","),
    );
}

pub fn emit_run_finished(
    run_id: &str,
    steps: u64,
    termination: TerminationReason,
    duration_ms: u64,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        steps = steps,
        approved = termination == TerminationReason::Approved,
        termination = %termination,
        duration_ms = duration_ms,
    );
}

pub fn emit_run_failed(run_id: &str, role: Option<Role>, error: &dyn std::fmt::Display) {
    warn!(
        event = "run.failed",
        run_id = %run_id,
        role = %role.map(|r| r.to_string()).unwrap_or_default(),
        error = %error,
    );
}

/// A marker was missing or unreadable and its default was used.
pub fn emit_parser_fallback(schema: &str, field: &str) {
    debug!(event = "parser.fallback", schema = %schema, field = %field);
}

pub fn emit_research_query_failed(query: &str, error: &dyn std::fmt::Display) {
    warn!(event = "research.query_failed", query = %query, error = %error);
}
