//! The control loop: run role, merge delta, route, repeat.
//!
//! The orchestrator is the sole owner of [`WorkflowState`]. Roles get a
//! shared borrow for the duration of one step and hand back a delta. Exactly
//! one role runs at a time.
//!
//! Termination is guaranteed twice over: the routing policy reaches a
//! terminal step within [`IterationBounds::step_budget`] role invocations,
//! and the loop refuses to exceed that budget.
//!
//! [`IterationBounds::step_budget`]: crate::domain::IterationBounds::step_budget

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::capability::{CapabilityResolver, RoleBindings};
use crate::domain::{
    EditorPhase, IterationCounters, RunConfig, RunError, RunResult, StateDelta, WorkflowState,
};
use crate::metrics::METRICS;
use crate::obs::{self, RunSpan};
use crate::roles::{self, Role};
use crate::router::{self, NextStep, TerminationReason};

/// One completed role step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub run_id: Uuid,
    /// 1-based, strictly increasing within a run.
    pub seq: u64,
    pub role: Role,
    /// Editor phase the step ran in; `None` for other roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<EditorPhase>,
    pub delta: StateDelta,
    pub next: NextStep,
    /// Counters after the merge.
    pub counters: IterationCounters,
    /// SHA-256 of the merged state.
    pub state_digest: String,
    pub timestamp: DateTime<Utc>,
}

/// Emitted once when a run reaches its terminal step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub steps: u64,
    pub approved: bool,
    pub termination: TerminationReason,
    pub counters: IterationCounters,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Step(StepEvent),
    Finished(RunSummary),
}

/// Consumer of run events. Sinks observe; they cannot touch run state.
pub trait EventSink {
    fn emit(&mut self, event: RunEvent);
}

impl EventSink for Vec<RunEvent> {
    fn emit(&mut self, event: RunEvent) {
        self.push(event);
    }
}

impl EventSink for UnboundedSender<RunEvent> {
    fn emit(&mut self, event: RunEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: RunEvent) {}
}

/// Result of a run that reached its terminal step.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    /// The last writer output.
    pub draft: String,
    /// False whenever the critique cap forced termination.
    pub approved: bool,
    pub termination: TerminationReason,
    pub steps: u64,
    pub state: WorkflowState,
}

pub struct Orchestrator {
    config: RunConfig,
    bindings: RoleBindings,
}

impl Orchestrator {
    /// Validates `config` before anything runs.
    pub fn new(config: RunConfig, bindings: RoleBindings) -> RunResult<Self> {
        config.validate()?;
        Ok(Self { config, bindings })
    }

    /// Validate `config` and resolve every role binding through `resolver`.
    pub fn from_resolver(config: RunConfig, resolver: &dyn CapabilityResolver) -> RunResult<Self> {
        config.validate()?;
        let bindings = RoleBindings::resolve(&config.models, resolver)?;
        Ok(Self { config, bindings })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn bindings(&self) -> &RoleBindings {
        &self.bindings
    }

    /// Drive one run to completion, reporting each step to `sink`.
    ///
    /// On a fatal error no `Finished` event is emitted and no draft is
    /// returned.
    pub async fn run<S>(&self, sink: &mut S) -> RunResult<RunOutcome>
    where
        S: EventSink + Send + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let run_span = RunSpan::new(&run_id.to_string(), &self.config.topic);
        let span = run_span.span();

        async move {
            let result = self.drive(run_id, &run_span, sink).await;
            if let Err(e) = &result {
                METRICS.inc_runs_failed();
                obs::emit_run_failed(&run_id.to_string(), e.role(), e);
            }
            METRICS.flush();
            result
        }
        .instrument(span)
        .await
    }

    async fn drive<S>(
        &self,
        run_id: Uuid,
        run_span: &RunSpan,
        sink: &mut S,
    ) -> RunResult<RunOutcome>
    where
        S: EventSink + Send + ?Sized,
    {
        let run_label = run_id.to_string();
        let budget = self.config.bounds.step_budget();
        obs::emit_run_started(&run_label, &self.config.topic, budget);

        let mut state = WorkflowState::new(&self.config);
        let mut current = Role::Editor;
        let mut seq: u64 = 0;

        loop {
            if seq >= budget {
                return Err(RunError::StepBudgetExceeded {
                    limit: budget,
                    counters: state.counters(),
                });
            }

            let phase = (current == Role::Editor).then_some(state.phase);
            if let Some(explicit) = phase {
                let inferred = router::infer_phase_from_history(&state);
                if inferred != explicit {
                    debug!(%explicit, %inferred, "history pattern disagrees with explicit phase");
                }
            }

            let delta = self.step(current, &state).await?;
            seq += 1;
            METRICS.inc_role_steps();

            state = state.apply(delta.clone());
            let next = router::route(current, &state);
            state = match next {
                NextStep::Run(Role::Editor) => {
                    let entry = router::editor_phase_on_entry(current, &state);
                    state.enter_phase(entry)
                }
                NextStep::Terminal(_) => state.enter_phase(EditorPhase::Done),
                NextStep::Run(_) => state,
            };

            obs::emit_step_completed(
                &run_label,
                seq,
                current,
                phase,
                next,
                &delta.changed_fields(),
            );
            sink.emit(RunEvent::Step(StepEvent {
                run_id,
                seq,
                role: current,
                phase,
                delta,
                next,
                counters: state.counters(),
                state_digest: state.digest(),
                timestamp: Utc::now(),
            }));

            match next {
                NextStep::Run(role) => current = role,
                NextStep::Terminal(termination) => {
                    let approved = termination == TerminationReason::Approved;
                    sink.emit(RunEvent::Finished(RunSummary {
                        run_id,
                        steps: seq,
                        approved,
                        termination,
                        counters: state.counters(),
                        finished_at: Utc::now(),
                    }));
                    METRICS.inc_runs_completed();
                    obs::emit_run_finished(&run_label, seq, termination, run_span.elapsed_ms());

                    return Ok(RunOutcome {
                        run_id,
                        draft: state.draft.clone(),
                        approved,
                        termination,
                        steps: seq,
                        state,
                    });
                }
            }
        }
    }

    async fn step(&self, role: Role, state: &WorkflowState) -> RunResult<StateDelta> {
        let work = roles::execute(role, state, &self.bindings, &self.config.research);
        let result = match self.config.step_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, work).await.map_err(|_| {
                RunError::StepTimedOut {
                    role,
                    counters: state.counters(),
                    timeout,
                }
            })?,
            None => work.await,
        };
        result.map_err(|source| RunError::StepFailed {
            role,
            counters: state.counters(),
            source,
        })
    }
}
