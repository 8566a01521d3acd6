//! Capability contracts: text generation and source retrieval.
//!
//! Role adapters depend only on these traits. Concrete providers live in
//! `inkloop-providers`; in-memory doubles live in [`crate::fakes`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ModelId, RoleModels, RunError, RunResult, SourceItem};
use crate::roles::Role;

/// Failure reported by a generator or retriever.
///
/// `Configuration` covers missing keys and unknown models and always aborts
/// the run. `Provider` covers transport faults, bad statuses and malformed
/// payloads; the researcher tolerates it per query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl CapabilityError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, CapabilityError::Configuration(_))
    }
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Produces text from an ordered message list.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Identifier of the bound model, for logs.
    fn model(&self) -> &str;

    async fn generate(&self, messages: &[Message]) -> Result<String, CapabilityError>;
}

/// Searches an external corpus.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SourceItem>, CapabilityError>;
}

/// Turns model identifiers into live capabilities.
pub trait CapabilityResolver {
    fn generator(&self, model: &ModelId) -> Result<Arc<dyn Generator>, CapabilityError>;

    fn retriever(&self) -> Result<Arc<dyn Retriever>, CapabilityError>;
}

/// The capabilities bound to each role for one run.
#[derive(Clone)]
pub struct RoleBindings {
    pub editor: Arc<dyn Generator>,
    pub researcher: Arc<dyn Generator>,
    pub writer: Arc<dyn Generator>,
    pub critic: Arc<dyn Generator>,
    pub retriever: Arc<dyn Retriever>,
}

impl RoleBindings {
    /// Use one generator for every role.
    pub fn uniform(generator: Arc<dyn Generator>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            editor: generator.clone(),
            researcher: generator.clone(),
            writer: generator.clone(),
            critic: generator,
            retriever,
        }
    }

    /// Resolve every role's model through `resolver`. Fails on the first
    /// binding that cannot be made, before any step runs.
    pub fn resolve(models: &RoleModels, resolver: &dyn CapabilityResolver) -> RunResult<Self> {
        let bind = |role: Role| {
            resolver
                .generator(models.for_role(role))
                .map_err(|source| RunError::Capability { role, source })
        };
        Ok(Self {
            editor: bind(Role::Editor)?,
            researcher: bind(Role::Researcher)?,
            writer: bind(Role::Writer)?,
            critic: bind(Role::Critic)?,
            retriever: resolver.retriever().map_err(|source| RunError::Capability {
                role: Role::Researcher,
                source,
            })?,
        })
    }

    /// The generator bound to `role`.
    pub fn generator_for(&self, role: Role) -> &Arc<dyn Generator> {
        match role {
            Role::Editor => &self.editor,
            Role::Researcher => &self.researcher,
            Role::Writer => &self.writer,
            Role::Critic => &self.critic,
        }
    }
}

impl fmt::Debug for RoleBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleBindings")
            .field("editor", &self.editor.model())
            .field("researcher", &self.researcher.model())
            .field("writer", &self.writer.model())
            .field("critic", &self.critic.model())
            .field("retriever", &self.retriever.name())
            .finish()
    }
}
