//! inkloop core library
//!
//! Bounded multi-role writing loop: an editor plans and adjudicates, a
//! researcher gathers sources, a writer drafts, a critic evaluates. This
//! crate holds the state model, response parser, role adapters, routing
//! policy and control loop. Concrete model and search backends live in
//! `inkloop-providers`.

pub mod capability;
pub mod domain;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod research;
pub mod roles;
pub mod router;
pub mod telemetry;

pub use capability::{
    CapabilityError, CapabilityResolver, Generator, Message, MessageRole, Retriever, RoleBindings,
};

pub use domain::{
    ConfigError, EditorDecision, EditorPhase, IterationBounds, IterationCounters, ModelId,
    ResearchHighlight, ResearchOutcome, ResearchResult, ResearchSettings, RoleModels, RunConfig,
    RunError, RunResult, SourceItem, StateDelta, WorkflowState,
};

pub use orchestrator::{
    EventSink, NullSink, Orchestrator, RunEvent, RunOutcome, RunSummary, StepEvent,
};

pub use parser::{
    estimate_word_count, parse_critic_report, parse_editor_plan, parse_editor_review,
    CriticReport, EditorPlan, EditorReview,
};

pub use obs::{
    emit_parser_fallback, emit_research_query_failed, emit_run_failed, emit_run_finished,
    emit_run_started, emit_step_completed, RunSpan,
};

pub use metrics::METRICS;
pub use roles::Role;
pub use router::{NextStep, TerminationReason};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
