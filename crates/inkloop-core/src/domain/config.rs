//! Run configuration: topic, per-role model bindings, iteration bounds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::roles::Role;

/// Opaque `provider:model` identifier.
///
/// The core never interprets it; resolution happens in the capability layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Model binding for each generating role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleModels {
    pub editor: ModelId,
    pub researcher: ModelId,
    pub writer: ModelId,
    pub critic: ModelId,
}

impl RoleModels {
    /// Bind every role to the same model.
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = ModelId::new(model);
        Self {
            editor: model.clone(),
            researcher: model.clone(),
            writer: model.clone(),
            critic: model,
        }
    }

    pub fn for_role(&self, role: Role) -> &ModelId {
        match role {
            Role::Editor => &self.editor,
            Role::Researcher => &self.researcher,
            Role::Writer => &self.writer,
            Role::Critic => &self.critic,
        }
    }

    pub fn for_role_mut(&mut self, role: Role) -> &mut ModelId {
        match role {
            Role::Editor => &mut self.editor,
            Role::Researcher => &mut self.researcher,
            Role::Writer => &mut self.writer,
            Role::Critic => &mut self.critic,
        }
    }
}

impl Default for RoleModels {
    fn default() -> Self {
        Self {
            editor: ModelId::new("openai:gpt-4o"),
            researcher: ModelId::new("openai:gpt-4o-mini"),
            writer: ModelId::new("openai:gpt-4o"),
            critic: ModelId::new("openai:gpt-4o"),
        }
    }
}

/// Caps on each loop of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationBounds {
    pub max_editing_iterations: u32,
    pub max_critique_iterations: u32,
    pub max_writing_iterations: u32,
    /// Target word count passed to writer and critic prompts.
    pub max_essay_length: u32,
}

impl Default for IterationBounds {
    fn default() -> Self {
        Self {
            max_editing_iterations: 3,
            max_critique_iterations: 3,
            max_writing_iterations: 2,
            max_essay_length: 1500,
        }
    }
}

impl IterationBounds {
    /// Hard ceiling on role invocations for one run.
    ///
    /// Planning takes at most two steps per editing iteration plus one handoff.
    /// Each critique cycle takes a critic, an editor review, a possible
    /// research round with its handoff, and up to `max_writing` writer steps
    /// interleaved with critic passes.
    pub fn step_budget(&self) -> u64 {
        let e = u64::from(self.max_editing_iterations);
        let c = u64::from(self.max_critique_iterations);
        let w = u64::from(self.max_writing_iterations);
        2 * e + 1 + c * (2 * w + 3)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("max_editing_iterations", self.max_editing_iterations),
            ("max_critique_iterations", self.max_critique_iterations),
            ("max_writing_iterations", self.max_writing_iterations),
            ("max_essay_length", self.max_essay_length),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::BoundTooSmall { field });
            }
        }
        Ok(())
    }
}

/// Research fan-out settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub max_results_per_query: usize,
    pub max_concurrent_queries: usize,
    /// Per-source character cap before summarization.
    pub source_char_limit: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_results_per_query: 3,
            max_concurrent_queries: 4,
            source_char_limit: 5000,
        }
    }
}

/// Everything needed to start a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    pub topic: String,
    pub models: RoleModels,
    pub bounds: IterationBounds,
    pub research: ResearchSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
}

impl RunConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing sections take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        self.bounds.validate()?;
        for role in Role::ALL {
            if self.models.for_role(role).as_str().trim().is_empty() {
                return Err(ConfigError::EmptyModelId { role });
            }
        }
        if self.research.max_results_per_query == 0 {
            return Err(ConfigError::BoundTooSmall {
                field: "max_results_per_query",
            });
        }
        if self.research.max_concurrent_queries == 0 {
            return Err(ConfigError::BoundTooSmall {
                field: "max_concurrent_queries",
            });
        }
        Ok(())
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_bounds() {
        let b = IterationBounds::default();
        assert_eq!(b.max_editing_iterations, 3);
        assert_eq!(b.max_critique_iterations, 3);
        assert_eq!(b.max_writing_iterations, 2);
        assert_eq!(b.max_essay_length, 1500);
    }

    #[test]
    fn test_step_budget_formula() {
        let b = IterationBounds::default();
        // 2*3 + 1 + 3*(2*2 + 3)
        assert_eq!(b.step_budget(), 28);

        let tight = IterationBounds {
            max_editing_iterations: 1,
            max_critique_iterations: 1,
            max_writing_iterations: 1,
            max_essay_length: 100,
        };
        assert_eq!(tight.step_budget(), 8);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg = RunConfig::from_toml_str(
            r#"
            topic = "Tide pools"

            [bounds]
            max_critique_iterations = 1

            [models]
            writer = "anthropic:claude-3-5-sonnet-latest"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.topic, "Tide pools");
        assert_eq!(cfg.bounds.max_critique_iterations, 1);
        assert_eq!(cfg.bounds.max_editing_iterations, 3);
        assert_eq!(
            cfg.models.writer.as_str(),
            "anthropic:claude-3-5-sonnet-latest"
        );
        assert_eq!(cfg.models.editor.as_str(), "openai:gpt-4o");
        assert_eq!(cfg.research.source_char_limit, 5000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_topic() {
        let cfg = RunConfig::new("   ");
        match cfg.validate().unwrap_err() {
            ConfigError::EmptyTopic => {}
            other => panic!("expected EmptyTopic, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_bound() {
        let mut cfg = RunConfig::new("Rivers");
        cfg.bounds.max_writing_iterations = 0;
        match cfg.validate().unwrap_err() {
            ConfigError::BoundTooSmall { field } => assert_eq!(field, "max_writing_iterations"),
            other => panic!("expected BoundTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_blank_model() {
        let mut cfg = RunConfig::new("Rivers");
        cfg.models.critic = ModelId::new("");
        match cfg.validate().unwrap_err() {
            ConfigError::EmptyModelId { role } => assert_eq!(role, Role::Critic),
            other => panic!("expected EmptyModelId, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        match RunConfig::from_toml_str("topic = ").unwrap_err() {
            ConfigError::Parse(_) => {}
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let mut cfg = RunConfig::new("Rivers");
        assert!(cfg.step_timeout().is_none());
        cfg.step_timeout_secs = Some(0);
        assert!(cfg.step_timeout().is_none());
        cfg.step_timeout_secs = Some(30);
        assert_eq!(cfg.step_timeout(), Some(Duration::from_secs(30)));
    }
}
