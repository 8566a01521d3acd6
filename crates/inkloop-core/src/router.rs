//! Routing policy: a pure function from (completed role, merged state) to
//! the next step.
//!
//! Researcher, writer and critic have fixed successors. After the editor the
//! route depends on the phase it ran in:
//!
//! | phase                 | condition                                  | next        |
//! |-----------------------|--------------------------------------------|-------------|
//! | InitialOutline        | queries pending                            | researcher  |
//! | InitialOutline        | no queries (editing is then complete)      | writer      |
//! | PostResearchHandoff   | always                                     | writer      |
//! | CritiqueReview        | `essay_complete`                           | terminal    |
//! | CritiqueReview        | `critique_iteration >= max`                | terminal    |
//! | CritiqueReview        | decision is `research`                     | researcher  |
//! | CritiqueReview        | otherwise                                  | writer      |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{EditorDecision, EditorPhase, WorkflowState};
use crate::roles::Role;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The editor explicitly approved the essay.
    Approved,
    /// The critique cap forced termination without approval.
    CritiqueCapReached,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Approved => write!(f, "approved"),
            TerminationReason::CritiqueCapReached => write!(f, "critique_cap_reached"),
        }
    }
}

/// Where control goes after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Run(Role),
    Terminal(TerminationReason),
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextStep::Run(role) => write!(f, "{role}"),
            NextStep::Terminal(reason) => write!(f, "terminal({reason})"),
        }
    }
}

/// Next step after `completed` ran and its delta was merged into `state`.
pub fn route(completed: Role, state: &WorkflowState) -> NextStep {
    match completed.fixed_successor() {
        Some(next) => NextStep::Run(next),
        None => route_after_editor(state),
    }
}

fn route_after_editor(state: &WorkflowState) -> NextStep {
    match state.phase {
        EditorPhase::InitialOutline => {
            if state.research_queries.is_empty() {
                NextStep::Run(Role::Writer)
            } else {
                NextStep::Run(Role::Researcher)
            }
        }
        EditorPhase::PostResearchHandoff => NextStep::Run(Role::Writer),
        EditorPhase::CritiqueReview => {
            if state.essay_complete {
                NextStep::Terminal(TerminationReason::Approved)
            } else if state.critique_iteration >= state.bounds.max_critique_iterations {
                NextStep::Terminal(TerminationReason::CritiqueCapReached)
            } else if state.editor_decision == EditorDecision::Research {
                NextStep::Run(Role::Researcher)
            } else {
                NextStep::Run(Role::Writer)
            }
        }
        EditorPhase::Done => NextStep::Terminal(if state.essay_complete {
            TerminationReason::Approved
        } else {
            TerminationReason::CritiqueCapReached
        }),
    }
}

/// Phase the editor runs in when entered from `from`.
pub fn editor_phase_on_entry(from: Role, state: &WorkflowState) -> EditorPhase {
    match from {
        Role::Critic => EditorPhase::CritiqueReview,
        Role::Researcher => {
            if state.has_draft() || state.editing_complete {
                EditorPhase::PostResearchHandoff
            } else {
                EditorPhase::InitialOutline
            }
        }
        Role::Editor | Role::Writer => state.phase,
    }
}

/// Phase inferred from history and content alone, without the explicit
/// phase field. Used to cross-check the explicit phase in debug logs and
/// tests; it cannot see a handoff that follows final-outline research.
pub fn infer_phase_from_history(state: &WorkflowState) -> EditorPhase {
    let draft = state.has_draft();
    if draft && state.history_suggests_handoff() {
        EditorPhase::PostResearchHandoff
    } else if draft && !state.feedback.is_empty() {
        EditorPhase::CritiqueReview
    } else {
        EditorPhase::InitialOutline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunConfig;

    fn state() -> WorkflowState {
        WorkflowState::new(&RunConfig::new("Deserts"))
    }

    #[test]
    fn test_leaf_roles_have_fixed_successors() {
        let s = state();
        assert_eq!(route(Role::Researcher, &s), NextStep::Run(Role::Editor));
        assert_eq!(route(Role::Writer, &s), NextStep::Run(Role::Critic));
        assert_eq!(route(Role::Critic, &s), NextStep::Run(Role::Editor));
    }

    #[test]
    fn test_outline_routes_on_pending_queries() {
        let mut s = state();
        s.research_queries = vec!["q".into()];
        assert_eq!(route(Role::Editor, &s), NextStep::Run(Role::Researcher));

        s.editing_complete = true;
        assert_eq!(
            route(Role::Editor, &s),
            NextStep::Run(Role::Researcher),
            "final-outline research still runs"
        );

        s.research_queries.clear();
        assert_eq!(route(Role::Editor, &s), NextStep::Run(Role::Writer));
    }

    #[test]
    fn test_handoff_always_goes_to_writer() {
        let mut s = state();
        s.phase = EditorPhase::PostResearchHandoff;
        s.editor_decision = EditorDecision::Research;
        s.critique_iteration = s.bounds.max_critique_iterations;
        assert_eq!(route(Role::Editor, &s), NextStep::Run(Role::Writer));
    }

    #[test]
    fn test_review_approval_terminates() {
        let mut s = state();
        s.phase = EditorPhase::CritiqueReview;
        s.essay_complete = true;
        s.critique_iteration = 1;
        assert_eq!(
            route(Role::Editor, &s),
            NextStep::Terminal(TerminationReason::Approved)
        );
    }

    #[test]
    fn test_review_cap_forces_termination_regardless_of_decision() {
        let mut s = state();
        s.phase = EditorPhase::CritiqueReview;
        s.critique_iteration = s.bounds.max_critique_iterations;
        for decision in [EditorDecision::Research, EditorDecision::Revise] {
            s.editor_decision = decision;
            assert_eq!(
                route(Role::Editor, &s),
                NextStep::Terminal(TerminationReason::CritiqueCapReached)
            );
        }
    }

    #[test]
    fn test_review_decision_routes_below_cap() {
        let mut s = state();
        s.phase = EditorPhase::CritiqueReview;
        s.critique_iteration = 1;
        s.editor_decision = EditorDecision::Research;
        assert_eq!(route(Role::Editor, &s), NextStep::Run(Role::Researcher));
        s.editor_decision = EditorDecision::Revise;
        assert_eq!(route(Role::Editor, &s), NextStep::Run(Role::Writer));
        s.editor_decision = EditorDecision::PassToWriter;
        assert_eq!(route(Role::Editor, &s), NextStep::Run(Role::Writer));
    }

    #[test]
    fn test_phase_on_entry() {
        let mut s = state();
        assert_eq!(editor_phase_on_entry(Role::Researcher, &s), EditorPhase::InitialOutline);

        s.editing_complete = true;
        assert_eq!(
            editor_phase_on_entry(Role::Researcher, &s),
            EditorPhase::PostResearchHandoff
        );

        s.editing_complete = false;
        s.draft = "d".into();
        assert_eq!(
            editor_phase_on_entry(Role::Researcher, &s),
            EditorPhase::PostResearchHandoff
        );
        assert_eq!(editor_phase_on_entry(Role::Critic, &s), EditorPhase::CritiqueReview);
    }

    #[test]
    fn test_history_inference_matches_mid_critique_handoff() {
        let mut s = state();
        s.draft = "d".into();
        s.feedback = "f".into();
        s.node_history = vec![Role::Writer, Role::Critic, Role::Editor, Role::Researcher];
        assert_eq!(infer_phase_from_history(&s), EditorPhase::PostResearchHandoff);

        s.node_history.push(Role::Editor);
        s.node_history.push(Role::Writer);
        s.node_history.push(Role::Critic);
        assert_eq!(infer_phase_from_history(&s), EditorPhase::CritiqueReview);
    }

    #[test]
    fn test_next_step_serializes_snake_case() {
        let json = serde_json::to_value(NextStep::Run(Role::Writer)).unwrap();
        assert_eq!(json, serde_json::json!({"run": "writer"}));
        let json = serde_json::to_value(NextStep::Terminal(TerminationReason::CritiqueCapReached))
            .unwrap();
        assert_eq!(json, serde_json::json!({"terminal": "critique_cap_reached"}));
    }
}
