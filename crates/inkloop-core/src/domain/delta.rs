//! Sparse per-step updates and the merge that folds them into state.

use serde::{Deserialize, Serialize};

use super::state::{EditorDecision, ResearchHighlight, ResearchResult, WorkflowState};
use crate::roles::Role;

/// Fields a role changed in one step. `None` leaves the field untouched.
///
/// Merge is replace-per-field, except `research_results` (appended) and
/// `node_history` (the producing role is always appended).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thesis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub research_results: Vec<ResearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_highlights: Option<Vec<ResearchHighlight>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critic_approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_decision: Option<EditorDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing_iteration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critique_iteration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writing_iteration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essay_complete: Option<bool>,
}

impl StateDelta {
    /// An update that only records that `role` ran.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            thesis: None,
            outline: None,
            research_queries: None,
            research_results: Vec::new(),
            research_highlights: None,
            draft: None,
            feedback: None,
            critic_approved: None,
            editor_direction: None,
            editor_decision: None,
            editing_iteration: None,
            critique_iteration: None,
            writing_iteration: None,
            editing_complete: None,
            essay_complete: None,
        }
    }

    /// Names of the fields this delta sets, for logging.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut note = |set: bool, name: &'static str| {
            if set {
                fields.push(name);
            }
        };
        note(self.thesis.is_some(), "thesis");
        note(self.outline.is_some(), "outline");
        note(self.research_queries.is_some(), "research_queries");
        note(!self.research_results.is_empty(), "research_results");
        note(self.research_highlights.is_some(), "research_highlights");
        note(self.draft.is_some(), "draft");
        note(self.feedback.is_some(), "feedback");
        note(self.critic_approved.is_some(), "critic_approved");
        note(self.editor_direction.is_some(), "editor_direction");
        note(self.editor_decision.is_some(), "editor_decision");
        note(self.editing_iteration.is_some(), "editing_iteration");
        note(self.critique_iteration.is_some(), "critique_iteration");
        note(self.writing_iteration.is_some(), "writing_iteration");
        note(self.editing_complete.is_some(), "editing_complete");
        note(self.essay_complete.is_some(), "essay_complete");
        fields
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl WorkflowState {
    /// Fold one role's delta into the state.
    pub fn apply(mut self, delta: StateDelta) -> Self {
        let StateDelta {
            role,
            thesis,
            outline,
            research_queries,
            research_results,
            research_highlights,
            draft,
            feedback,
            critic_approved,
            editor_direction,
            editor_decision,
            editing_iteration,
            critique_iteration,
            writing_iteration,
            editing_complete,
            essay_complete,
        } = delta;

        replace(&mut self.thesis, thesis);
        replace(&mut self.outline, outline);
        replace(&mut self.research_queries, research_queries);
        self.research_results.extend(research_results);
        replace(&mut self.research_highlights, research_highlights);
        replace(&mut self.draft, draft);
        replace(&mut self.feedback, feedback);
        replace(&mut self.critic_approved, critic_approved);
        replace(&mut self.editor_direction, editor_direction);
        replace(&mut self.editor_decision, editor_decision);
        replace(&mut self.editing_iteration, editing_iteration);
        replace(&mut self.critique_iteration, critique_iteration);
        replace(&mut self.writing_iteration, writing_iteration);
        replace(&mut self.editing_complete, editing_complete);
        replace(&mut self.essay_complete, essay_complete);
        self.node_history.push(role);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::RunConfig;

    fn base() -> WorkflowState {
        WorkflowState::new(&RunConfig::new("Bridges"))
    }

    #[test]
    fn test_empty_delta_only_records_role() {
        let before = base();
        let after = before.clone().apply(StateDelta::new(Role::Writer));
        assert_eq!(after.node_history, vec![Role::Writer]);
        assert_eq!(after.draft, before.draft);
        assert_eq!(after.counters(), before.counters());
    }

    #[test]
    fn test_scalar_fields_replace() {
        let mut delta = StateDelta::new(Role::Editor);
        delta.thesis = Some("Bridges shape cities.".to_string());
        delta.editing_iteration = Some(1);
        delta.research_queries = Some(vec!["history of bridges".to_string()]);
        let state = base().apply(delta);

        let mut delta = StateDelta::new(Role::Editor);
        delta.research_queries = Some(Vec::new());
        let state = state.apply(delta);

        assert_eq!(state.thesis, "Bridges shape cities.");
        assert_eq!(state.editing_iteration, 1);
        assert!(state.research_queries.is_empty());
    }

    #[test]
    fn test_research_results_append() {
        let mut first = StateDelta::new(Role::Researcher);
        first.research_results = vec![ResearchResult::failed("a", "boom", 0)];
        let mut second = StateDelta::new(Role::Researcher);
        second.research_results = vec![
            ResearchResult::failed("b", "boom", 1),
            ResearchResult::failed("c", "boom", 1),
        ];

        let state = base().apply(first).apply(second);
        let queries: Vec<_> = state.research_results.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["a", "b", "c"]);
        assert_eq!(state.research_for_cycle(1).count(), 2);
    }

    #[test]
    fn test_changed_fields_lists_set_fields() {
        let mut delta = StateDelta::new(Role::Critic);
        delta.feedback = Some("tighten".to_string());
        delta.critic_approved = Some(false);
        assert_eq!(delta.changed_fields(), vec!["feedback", "critic_approved"]);
    }

    #[test]
    fn test_delta_json_omits_untouched_fields() {
        let mut delta = StateDelta::new(Role::Writer);
        delta.draft = Some("text".to_string());
        let json = serde_json::to_value(&delta).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["role"], "writer");
    }
}
