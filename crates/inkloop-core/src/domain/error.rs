//! Error taxonomy for inkloop runs.
//!
//! Configuration problems and failed role steps are fatal and unwind to the
//! caller. Malformed model output is never an error (see [`crate::parser`]),
//! and per-query research failures are recorded as data instead.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityError;
use crate::roles::Role;

/// Iteration counters captured at the moment a step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationCounters {
    pub editing: u32,
    pub critique: u32,
    pub writing: u32,
}

impl fmt::Display for IterationCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "editing={} critique={} writing={}",
            self.editing, self.critique, self.writing
        )
    }
}

/// Errors produced while loading or validating a run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("{field} must be at least 1")]
    BoundTooSmall { field: &'static str },

    #[error("model id for {role} must not be empty")]
    EmptyModelId { role: Role },

    #[error("failed to parse run config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Fatal run failures.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not bind a capability for {role}: {source}")]
    Capability {
        role: Role,
        #[source]
        source: CapabilityError,
    },

    #[error("{role} step failed ({counters}): {source}")]
    StepFailed {
        role: Role,
        counters: IterationCounters,
        #[source]
        source: CapabilityError,
    },

    #[error("{role} step timed out after {timeout:?} ({counters})")]
    StepTimedOut {
        role: Role,
        counters: IterationCounters,
        timeout: Duration,
    },

    #[error("step budget of {limit} role invocations exhausted ({counters})")]
    StepBudgetExceeded {
        limit: u64,
        counters: IterationCounters,
    },
}

impl RunError {
    /// The role that was executing (or being bound) when the run failed.
    pub fn role(&self) -> Option<Role> {
        match self {
            RunError::Capability { role, .. }
            | RunError::StepFailed { role, .. }
            | RunError::StepTimedOut { role, .. } => Some(*role),
            RunError::Config(_) | RunError::StepBudgetExceeded { .. } => None,
        }
    }

    /// Counters at the failing step, when a step was in flight.
    pub fn counters(&self) -> Option<IterationCounters> {
        match self {
            RunError::StepFailed { counters, .. }
            | RunError::StepTimedOut { counters, .. }
            | RunError::StepBudgetExceeded { counters, .. } => Some(*counters),
            RunError::Config(_) | RunError::Capability { .. } => None,
        }
    }

    /// True for failures caused by configuration rather than a runtime provider fault.
    pub fn is_configuration(&self) -> bool {
        match self {
            RunError::Config(_) | RunError::Capability { .. } => true,
            RunError::StepFailed { source, .. } => source.is_configuration(),
            RunError::StepTimedOut { .. } | RunError::StepBudgetExceeded { .. } => false,
        }
    }
}

/// Result type for run-level operations.
pub type RunResult<T> = std::result::Result<T, RunError>;
