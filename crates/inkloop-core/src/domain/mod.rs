//! Domain types: run configuration, workflow state, deltas, errors.

pub mod config;
pub mod delta;
pub mod error;
pub mod state;

pub use config::{IterationBounds, ModelId, ResearchSettings, RoleModels, RunConfig};
pub use delta::StateDelta;
pub use error::{ConfigError, IterationCounters, RunError, RunResult};
pub use state::{
    EditorDecision, EditorPhase, ResearchHighlight, ResearchOutcome, ResearchResult, SourceItem,
    WorkflowState,
};
