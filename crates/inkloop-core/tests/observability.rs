//! Observability tests for the run lifecycle.
//!
//! Structured events are captured with `#[traced_test]` and matched on their
//! `event = "..."` field.

use std::sync::Arc;

use inkloop_core::fakes::{ScriptedGenerator, StaticRetriever};
use inkloop_core::{
    emit_parser_fallback, emit_research_query_failed, emit_run_failed, emit_run_finished,
    emit_run_started, emit_step_completed, parse_critic_report, EditorPhase, NextStep,
    Orchestrator, Role, RoleBindings, RunConfig, RunSpan, TerminationReason,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_run_started_logs_budget() {
    emit_run_started("run-123", "Lighthouses", 28);
    assert!(logs_contain("run.started"));
    assert!(logs_contain("step_budget=28"));
}

#[traced_test]
#[test]
fn test_emit_step_completed_logs_role_and_next() {
    emit_step_completed(
        "run-123",
        3,
        Role::Editor,
        Some(EditorPhase::CritiqueReview),
        NextStep::Run(Role::Writer),
        &["feedback", "critique_iteration"],
    );
    assert!(logs_contain("step.completed"));
    assert!(logs_contain("role=editor"));
    assert!(logs_contain("phase=critique_review"));
    assert!(logs_contain("changed=feedback,critique_iteration"));
}

#[traced_test]
#[test]
fn test_emit_run_finished_logs_termination() {
    emit_run_finished("run-456", 11, TerminationReason::CritiqueCapReached, 5000);
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("approved=false"));
    assert!(logs_contain("critique_cap_reached"));
}

#[traced_test]
#[test]
fn test_emit_run_failed_logs_warning() {
    emit_run_failed("run-err", Some(Role::Writer), &"HTTP 503");
    assert!(logs_contain("run.failed"));
    assert!(logs_contain("HTTP 503"));
}

#[traced_test]
#[test]
fn test_emit_research_query_failed_logs_query() {
    emit_research_query_failed("tidal power", &"timeout");
    assert!(logs_contain("research.query_failed"));
    assert!(logs_contain("tidal power"));
}

#[traced_test]
#[test]
fn test_parser_fallback_is_logged() {
    emit_parser_fallback("critic", "approved");
    let report = parse_critic_report("EVALUATION: fine");
    assert!(!report.approved);
    assert!(logs_contain("parser.fallback"));
}

#[traced_test]
#[test]
fn test_run_span_can_be_entered() {
    let span = RunSpan::new("run-span", "Topic");
    let _guard = span.span().entered();
    tracing::info!("inside run span");
    assert!(logs_contain("inside run span"));
}

#[tokio::test]
#[traced_test]
async fn test_run_emits_lifecycle_events() {
    let gen = ScriptedGenerator::new("m")
        .with_response("THESIS: t\nOUTLINE: o\nREADY_TO_WRITE: Yes")
        .with_response("Draft.")
        .with_response("EVALUATION: good\nAPPROVED: Yes\nREASON: fine")
        .with_response("DECISION: approve\nDIRECTION: none");
    let bindings = RoleBindings::uniform(Arc::new(gen), Arc::new(StaticRetriever::new()));
    let orchestrator = Orchestrator::new(RunConfig::new("Kites"), bindings).unwrap();

    orchestrator.run(&mut Vec::new()).await.unwrap();

    assert!(logs_contain("run.started"));
    assert!(logs_contain("step.completed"));
    assert!(logs_contain("run.finished"));
    assert!(!logs_contain("run.failed"));
}

#[tokio::test]
#[traced_test]
async fn test_failed_run_logs_failure() {
    let gen = ScriptedGenerator::new("m");
    let bindings = RoleBindings::uniform(Arc::new(gen), Arc::new(StaticRetriever::new()));
    let orchestrator = Orchestrator::new(RunConfig::new("Kites"), bindings).unwrap();

    assert!(orchestrator.run(&mut Vec::new()).await.is_err());
    assert!(logs_contain("run.failed"));
}
