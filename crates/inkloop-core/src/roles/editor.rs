//! Editor adapter: the only role with decision authority.
//!
//! Which behavior runs is decided by `state.phase`, set by the control loop
//! when it routes into the editor:
//!
//! - `InitialOutline`: draft thesis, outline and research queries.
//! - `PostResearchHandoff`: no generation; reset the writing counter and
//!   pass the new research to the writer.
//! - `CritiqueReview`: weigh the critique and decide research, revise or
//!   approve.

use tracing::{debug, warn};

use crate::capability::{CapabilityError, Generator, Message};
use crate::domain::{EditorDecision, EditorPhase, StateDelta, WorkflowState};
use crate::parser;
use crate::prompts;
use crate::research::format_research_context;
use crate::roles::Role;

pub async fn run(
    state: &WorkflowState,
    generator: &dyn Generator,
) -> Result<StateDelta, CapabilityError> {
    match state.phase {
        EditorPhase::InitialOutline => outline(state, generator).await,
        EditorPhase::PostResearchHandoff => Ok(handoff(state)),
        EditorPhase::CritiqueReview => review(state, generator).await,
        EditorPhase::Done => {
            warn!(phase = %state.phase, "editor invoked after termination; no changes");
            Ok(StateDelta::new(Role::Editor))
        }
    }
}

async fn outline(
    state: &WorkflowState,
    generator: &dyn Generator,
) -> Result<StateDelta, CapabilityError> {
    let iteration = state.editing_iteration + 1;
    let max = state.bounds.max_editing_iterations;
    let user = prompts::editor_plan_prompt(
        &state.topic,
        iteration,
        max,
        &format_research_context(&state.research_results),
    );
    let messages = [
        Message::system(prompts::EDITOR_PLAN_SYSTEM),
        Message::user(user),
    ];

    let text = generator.generate(&messages).await?;
    let plan = parser::parse_editor_plan(&text);

    let complete = plan.ready_to_write || iteration >= max || plan.queries.is_empty();
    debug!(
        iteration,
        ready = plan.ready_to_write,
        research_needed = plan.research_needed,
        queries = plan.queries.len(),
        complete,
        "editor outline parsed"
    );

    let mut delta = StateDelta::new(Role::Editor);
    delta.thesis = Some(plan.thesis);
    delta.outline = Some(plan.outline);
    delta.research_queries = Some(plan.queries);
    delta.editing_iteration = Some(iteration);
    // set-once-true
    delta.editing_complete = Some(state.editing_complete || complete);
    Ok(delta)
}

fn handoff(state: &WorkflowState) -> StateDelta {
    debug!(
        decision = %state.editor_decision,
        "research received; handing off to writer"
    );
    let mut delta = StateDelta::new(Role::Editor);
    delta.editor_decision = Some(EditorDecision::PassToWriter);
    delta.writing_iteration = Some(0);
    delta
}

async fn review(
    state: &WorkflowState,
    generator: &dyn Generator,
) -> Result<StateDelta, CapabilityError> {
    let round = state.critique_iteration + 1;
    let research_context = format_research_context(&state.research_results);
    let user = prompts::editor_review_prompt(&prompts::ReviewPromptInput {
        topic: &state.topic,
        thesis: &state.thesis,
        outline: &state.outline,
        draft: &state.draft,
        feedback: &state.feedback,
        critic_approved: state.critic_approved,
        research_context: &research_context,
        critique_iteration: round,
        max_critique_iterations: state.bounds.max_critique_iterations,
    });
    let messages = [
        Message::system(prompts::EDITOR_REVIEW_SYSTEM),
        Message::user(user),
    ];

    let text = generator.generate(&messages).await?;
    let review = parser::parse_editor_review(&text);
    debug!(
        round,
        decision = %review.decision,
        queries = review.queries.len(),
        "editor review parsed"
    );

    let approved = review.decision == EditorDecision::Approve;
    let queries = if review.decision == EditorDecision::Research {
        review.queries
    } else {
        Vec::new()
    };

    let mut delta = StateDelta::new(Role::Editor);
    if !review.thesis.is_empty() {
        delta.thesis = Some(review.thesis);
    }
    if !review.outline.is_empty() {
        delta.outline = Some(review.outline);
    }
    delta.research_queries = Some(queries);
    delta.editor_direction = Some(review.direction);
    delta.editor_decision = Some(review.decision);
    delta.critique_iteration = Some(round);
    delta.essay_complete = Some(state.essay_complete || approved);
    delta.writing_iteration = Some(0);
    Ok(delta)
}
