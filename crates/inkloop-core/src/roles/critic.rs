//! Critic adapter. Reports a verdict; never ends the run itself.

use tracing::debug;

use crate::capability::{CapabilityError, Generator, Message};
use crate::domain::{StateDelta, WorkflowState};
use crate::parser::{estimate_word_count, parse_critic_report};
use crate::prompts;
use crate::roles::Role;

pub async fn run(
    state: &WorkflowState,
    generator: &dyn Generator,
) -> Result<StateDelta, CapabilityError> {
    let word_count = estimate_word_count(&state.draft);
    let user = prompts::critic_prompt(&prompts::CriticPromptInput {
        draft: &state.draft,
        outline: &state.outline,
        thesis: &state.thesis,
        max_essay_length: state.bounds.max_essay_length,
        word_count,
        iteration: state.writing_iteration,
        max_iterations: state.bounds.max_writing_iterations,
    });
    let messages = [Message::system(prompts::CRITIC_SYSTEM), Message::user(user)];

    let text = generator.generate(&messages).await?;
    let report = parse_critic_report(&text);
    debug!(
        word_count,
        approved = report.approved,
        improvements = report.improvements.len(),
        fallbacks = report.fallbacks.len(),
        "critique parsed"
    );

    let mut feedback = report.render_feedback();
    if feedback.is_empty() {
        // Nothing recognizable; pass the raw critique through.
        feedback = text.trim().to_string();
    }

    let mut delta = StateDelta::new(Role::Critic);
    delta.feedback = Some(feedback);
    delta.critic_approved = Some(report.approved);
    Ok(delta)
}
