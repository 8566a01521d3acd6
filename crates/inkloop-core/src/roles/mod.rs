//! The four role adapters and the shared role vocabulary.
//!
//! Each adapter reads the current [`WorkflowState`], calls its bound
//! capability, and returns a [`StateDelta`]. Adapters never route and never
//! mutate state.

pub mod critic;
pub mod editor;
pub mod researcher;
pub mod writer;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityError, RoleBindings};
use crate::domain::{ResearchSettings, StateDelta, WorkflowState};

/// The four roles of the writing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Editor,
    Researcher,
    Writer,
    Critic,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Editor, Role::Researcher, Role::Writer, Role::Critic];

    /// Fixed successor for roles that never branch. Only the editor routes.
    pub fn fixed_successor(self) -> Option<Role> {
        match self {
            Role::Editor => None,
            Role::Researcher => Some(Role::Editor),
            Role::Writer => Some(Role::Critic),
            Role::Critic => Some(Role::Editor),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Editor => "Plans thesis and outline, commissions research, reviews critiques",
            Role::Researcher => "Runs search queries and summarizes the sources",
            Role::Writer => "Drafts the essay and revises it against feedback",
            Role::Critic => "Evaluates the draft and reports strengths and improvements",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Editor => "editor",
            Role::Researcher => "researcher",
            Role::Writer => "writer",
            Role::Critic => "critic",
        };
        write!(f, "{s}")
    }
}

/// Run one role against `state` with its bound capabilities.
pub async fn execute(
    role: Role,
    state: &WorkflowState,
    bindings: &RoleBindings,
    research: &ResearchSettings,
) -> Result<StateDelta, CapabilityError> {
    let generator = bindings.generator_for(role).as_ref();
    match role {
        Role::Editor => editor::run(state, generator).await,
        Role::Researcher => {
            researcher::run(state, generator, bindings.retriever.as_ref(), research).await
        }
        Role::Writer => writer::run(state, generator).await,
        Role::Critic => critic::run(state, generator).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, serde_json::Value::String(role.to_string()));
        }
    }

    #[test]
    fn test_only_editor_branches() {
        assert_eq!(Role::Editor.fixed_successor(), None);
        assert_eq!(Role::Researcher.fixed_successor(), Some(Role::Editor));
        assert_eq!(Role::Writer.fixed_successor(), Some(Role::Critic));
        assert_eq!(Role::Critic.fixed_successor(), Some(Role::Editor));
    }

    #[tokio::test]
    async fn test_execute_uses_the_role_generator() {
        use std::sync::Arc;

        use crate::domain::RunConfig;
        use crate::fakes::{ScriptedGenerator, StaticRetriever};

        let editor = Arc::new(ScriptedGenerator::new("fake:editor"));
        let writer = Arc::new(ScriptedGenerator::new("fake:writer").with_response("Draft A"));
        let bindings = RoleBindings {
            editor: editor.clone(),
            researcher: Arc::new(ScriptedGenerator::new("fake:researcher")),
            writer: writer.clone(),
            critic: Arc::new(ScriptedGenerator::new("fake:critic")),
            retriever: Arc::new(StaticRetriever::new()),
        };
        let state = WorkflowState::new(&RunConfig::new("Kites"));

        let delta = execute(Role::Writer, &state, &bindings, &ResearchSettings::default())
            .await
            .unwrap();

        assert_eq!(delta.draft.as_deref(), Some("Draft A"));
        assert_eq!(writer.call_count(), 1);
        assert_eq!(editor.call_count(), 0);
    }
}
