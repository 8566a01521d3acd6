//! Writer adapter: first draft, then revisions against feedback.

use tracing::debug;

use crate::capability::{CapabilityError, Generator, Message};
use crate::domain::{StateDelta, WorkflowState};
use crate::prompts;
use crate::research::condense_research;
use crate::roles::Role;

const NO_NEW_RESEARCH: &str = "No new research was commissioned for this revision.";

pub async fn run(
    state: &WorkflowState,
    generator: &dyn Generator,
) -> Result<StateDelta, CapabilityError> {
    let iteration = state.writing_iteration + 1;
    let user = if state.has_draft() {
        revision_prompt(state, iteration)
    } else {
        prompts::writer_initial_prompt(
            &state.topic,
            &state.thesis,
            &state.outline,
            &condense_research(&state.research_results),
            state.bounds.max_essay_length,
        )
    };
    let messages = [Message::system(prompts::WRITER_SYSTEM), Message::user(user)];

    let draft = generator.generate(&messages).await?;
    debug!(
        iteration,
        revision = state.has_draft(),
        words = crate::parser::estimate_word_count(&draft),
        "draft produced"
    );

    let mut delta = StateDelta::new(Role::Writer);
    delta.draft = Some(draft.trim().to_string());
    delta.writing_iteration = Some(iteration);
    Ok(delta)
}

fn revision_prompt(state: &WorkflowState, iteration: u32) -> String {
    // Only research commissioned by the current review round is new.
    let cycle = state.critique_iteration;
    let fresh: Vec<_> = if cycle > 0 {
        state.research_for_cycle(cycle).collect()
    } else {
        Vec::new()
    };
    let new_research = if fresh.is_empty() {
        NO_NEW_RESEARCH.to_string()
    } else {
        condense_research(fresh)
    };

    prompts::writer_revision_prompt(&prompts::RevisionPromptInput {
        draft: &state.draft,
        outline: &state.outline,
        feedback: &state.feedback,
        direction: &state.editor_direction,
        new_research: &new_research,
        max_essay_length: state.bounds.max_essay_length,
        iteration,
        max_iterations: state.bounds.max_writing_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResearchResult, RunConfig, SourceItem};
    use crate::fakes::ScriptedGenerator;

    fn summarized(query: &str, summary: &str, cycle: u32) -> ResearchResult {
        ResearchResult::found(
            query,
            vec![SourceItem::new("t", "u", "c")],
            Some(summary.to_string()),
            cycle,
        )
    }

    #[tokio::test]
    async fn test_initial_draft_uses_all_research() {
        let gen = ScriptedGenerator::new("fake").with_response("  First draft.  ");
        let mut state = WorkflowState::new(&RunConfig::new("Lighthouses"));
        state.thesis = "Lighthouses still matter.".into();
        state.research_results = vec![summarized("history", "Built in 1800s.", 0)];

        let delta = run(&state, &gen).await.unwrap();
        assert_eq!(delta.draft.as_deref(), Some("First draft."));
        assert_eq!(delta.writing_iteration, Some(1));

        let prompt = &gen.calls()[0][1].content;
        assert!(prompt.contains("THESIS: Lighthouses still matter."));
        assert!(prompt.contains("Built in 1800s."));
        assert!(prompt.contains("TARGET LENGTH: 1500 words"));
    }

    #[tokio::test]
    async fn test_revision_after_counter_reset() {
        let gen = ScriptedGenerator::new("fake").with_response("Second draft.");
        let mut state = WorkflowState::new(&RunConfig::new("Lighthouses"));
        state.draft = "First draft.".into();
        state.feedback = "Add numbers.".into();
        state.editor_direction = "Quantify traffic.".into();
        state.critique_iteration = 1;
        state.writing_iteration = 0;

        let delta = run(&state, &gen).await.unwrap();
        assert_eq!(delta.writing_iteration, Some(1));
        let prompt = &gen.calls()[0][1].content;
        assert!(prompt.contains("CURRENT DRAFT:\nFirst draft."));
        assert!(prompt.contains("Quantify traffic."));
        assert!(prompt.contains(NO_NEW_RESEARCH));
    }

    #[tokio::test]
    async fn test_revision_includes_only_current_cycle_research() {
        let gen = ScriptedGenerator::new("fake").with_response("Revised.");
        let mut state = WorkflowState::new(&RunConfig::new("Lighthouses"));
        state.draft = "Draft.".into();
        state.critique_iteration = 2;
        state.research_results = vec![
            summarized("planning", "PLANNING-FACT", 0),
            summarized("round one", "ROUND-ONE-FACT", 1),
            summarized("round two", "ROUND-TWO-FACT", 2),
        ];

        run(&state, &gen).await.unwrap();
        let prompt = &gen.calls()[0][1].content;
        assert!(prompt.contains("ROUND-TWO-FACT"));
        assert!(!prompt.contains("ROUND-ONE-FACT"));
        assert!(!prompt.contains("PLANNING-FACT"));
    }
}
