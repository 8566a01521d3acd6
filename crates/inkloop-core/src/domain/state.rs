//! Workflow state shared by every role.
//!
//! A role never mutates [`WorkflowState`] directly. It returns a
//! [`StateDelta`](super::delta::StateDelta) that the control loop folds in.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::config::{IterationBounds, RoleModels, RunConfig};
use super::error::IterationCounters;
use crate::roles::Role;

/// Routing decision recorded by the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorDecision {
    Research,
    #[default]
    Revise,
    Approve,
    PassToWriter,
}

impl EditorDecision {
    /// Parse a decision word as emitted by the editor review prompt.
    ///
    /// `pass_to_writer` is internal and never accepted from model output.
    pub fn from_model_word(word: &str) -> Option<Self> {
        let word = word
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_lowercase();
        if word.starts_with("research") {
            Some(Self::Research)
        } else if word.starts_with("revis") {
            Some(Self::Revise)
        } else if word.starts_with("approv") {
            Some(Self::Approve)
        } else {
            None
        }
    }
}

impl fmt::Display for EditorDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorDecision::Research => write!(f, "research"),
            EditorDecision::Revise => write!(f, "revise"),
            EditorDecision::Approve => write!(f, "approve"),
            EditorDecision::PassToWriter => write!(f, "pass_to_writer"),
        }
    }
}

/// Which editor behavior the next editor step performs.
///
/// Set by the control loop on each transition into the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorPhase {
    /// Phase A: thesis, outline, and research queries.
    #[default]
    InitialOutline,
    /// Phase B: research is in, hand the draft job to the writer.
    PostResearchHandoff,
    /// Phase C: review the critic's feedback and decide.
    CritiqueReview,
    /// The run has terminated.
    Done,
}

impl fmt::Display for EditorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorPhase::InitialOutline => write!(f, "initial_outline"),
            EditorPhase::PostResearchHandoff => write!(f, "post_research_handoff"),
            EditorPhase::CritiqueReview => write!(f, "critique_review"),
            EditorPhase::Done => write!(f, "done"),
        }
    }
}

/// One retrieved source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    pub title: String,
    pub url: String,
    /// Snippet returned by the retriever.
    pub content: String,
    /// Full page text, when the retriever supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

impl SourceItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            raw_content: None,
        }
    }

    /// Best available text: raw page content when present, else the snippet.
    pub fn body(&self) -> &str {
        match self.raw_content.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => &self.content,
        }
    }
}

/// Either the sources found for a query or the reason retrieval failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResearchOutcome {
    Found {
        results: Vec<SourceItem>,
        /// `None` when summarization failed; the sources are kept.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Outcome of one research query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub query: String,
    #[serde(flatten)]
    pub outcome: ResearchOutcome,
    /// Critique iteration at which the query was commissioned. Zero means
    /// planning-phase research.
    pub cycle: u32,
    pub timestamp: DateTime<Utc>,
}

impl ResearchResult {
    pub fn found(
        query: impl Into<String>,
        results: Vec<SourceItem>,
        summary: Option<String>,
        cycle: u32,
    ) -> Self {
        Self {
            query: query.into(),
            outcome: ResearchOutcome::Found { results, summary },
            cycle,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(query: impl Into<String>, error: impl Into<String>, cycle: u32) -> Self {
        Self {
            query: query.into(),
            outcome: ResearchOutcome::Failed {
                error: error.into(),
            },
            cycle,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResearchOutcome::Found { .. })
    }

    pub fn sources(&self) -> &[SourceItem] {
        match &self.outcome {
            ResearchOutcome::Found { results, .. } => results,
            ResearchOutcome::Failed { .. } => &[],
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match &self.outcome {
            ResearchOutcome::Found { summary, .. } => summary.as_deref(),
            ResearchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ResearchOutcome::Failed { error } => Some(error),
            ResearchOutcome::Found { .. } => None,
        }
    }
}

/// Short preview of a research summary, shown to the editor and in events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchHighlight {
    pub query: String,
    pub preview: String,
}

/// The single shared record passed between roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub topic: String,
    pub thesis: String,
    pub outline: String,
    /// Queries awaiting the researcher.
    pub research_queries: Vec<String>,
    /// Append-only across the run.
    pub research_results: Vec<ResearchResult>,
    pub research_highlights: Vec<ResearchHighlight>,
    pub draft: String,
    pub feedback: String,
    pub critic_approved: bool,
    pub editor_direction: String,
    pub editor_decision: EditorDecision,
    pub editing_iteration: u32,
    pub critique_iteration: u32,
    pub writing_iteration: u32,
    pub editing_complete: bool,
    pub essay_complete: bool,
    pub phase: EditorPhase,
    pub bounds: IterationBounds,
    pub models: RoleModels,
    /// Roles in execution order.
    pub node_history: Vec<Role>,
}

impl WorkflowState {
    /// Fresh state for a validated run configuration.
    pub fn new(config: &RunConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            thesis: String::new(),
            outline: String::new(),
            research_queries: Vec::new(),
            research_results: Vec::new(),
            research_highlights: Vec::new(),
            draft: String::new(),
            feedback: String::new(),
            critic_approved: false,
            editor_direction: String::new(),
            editor_decision: EditorDecision::default(),
            editing_iteration: 0,
            critique_iteration: 0,
            writing_iteration: 0,
            editing_complete: false,
            essay_complete: false,
            phase: EditorPhase::InitialOutline,
            bounds: config.bounds,
            models: config.models.clone(),
            node_history: Vec::new(),
        }
    }

    pub fn counters(&self) -> IterationCounters {
        IterationCounters {
            editing: self.editing_iteration,
            critique: self.critique_iteration,
            writing: self.writing_iteration,
        }
    }

    pub fn has_draft(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// True when the two most recent steps were editor then researcher, the
    /// pattern that precedes a post-research handoff.
    pub fn history_suggests_handoff(&self) -> bool {
        self.node_history.ends_with(&[Role::Editor, Role::Researcher])
    }

    /// Research commissioned during the given critique cycle.
    pub fn research_for_cycle(&self, cycle: u32) -> impl Iterator<Item = &ResearchResult> {
        self.research_results
            .iter()
            .filter(move |r| r.cycle == cycle)
    }

    /// Hex SHA-256 of the canonical JSON form.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Move the editor into `phase` for its next step.
    pub fn enter_phase(mut self, phase: EditorPhase) -> Self {
        self.phase = phase;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_at_zero() {
        let state = WorkflowState::new(&RunConfig::new("Glaciers"));
        assert_eq!(state.topic, "Glaciers");
        assert_eq!(state.counters(), IterationCounters::default());
        assert_eq!(state.phase, EditorPhase::InitialOutline);
        assert!(!state.has_draft());
        assert!(!state.essay_complete);
    }

    #[test]
    fn test_decision_word_parsing() {
        assert_eq!(
            EditorDecision::from_model_word("Research"),
            Some(EditorDecision::Research)
        );
        assert_eq!(
            EditorDecision::from_model_word("[APPROVE]"),
            Some(EditorDecision::Approve)
        );
        assert_eq!(
            EditorDecision::from_model_word(" revise."),
            Some(EditorDecision::Revise)
        );
        assert_eq!(EditorDecision::from_model_word("pass_to_writer"), None);
        assert_eq!(EditorDecision::from_model_word(""), None);
    }

    #[test]
    fn test_research_result_accessors() {
        let ok = ResearchResult::found(
            "q1",
            vec![SourceItem::new("T", "https://a.example", "snippet")],
            Some("summary".to_string()),
            0,
        );
        assert!(ok.is_success());
        assert_eq!(ok.sources().len(), 1);
        assert_eq!(ok.summary(), Some("summary"));
        assert!(ok.error().is_none());

        let bad = ResearchResult::failed("q2", "HTTP 429", 1);
        assert!(!bad.is_success());
        assert!(bad.sources().is_empty());
        assert_eq!(bad.error(), Some("HTTP 429"));
    }

    #[test]
    fn test_research_result_serializes_flat_status() {
        let bad = ResearchResult::failed("q", "timeout", 0);
        let json = serde_json::to_value(&bad).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "timeout");
        assert_eq!(json["query"], "q");
    }

    #[test]
    fn test_source_body_prefers_raw_content() {
        let mut item = SourceItem::new("T", "u", "snippet");
        assert_eq!(item.body(), "snippet");
        item.raw_content = Some("   ".to_string());
        assert_eq!(item.body(), "snippet");
        item.raw_content = Some("full text".to_string());
        assert_eq!(item.body(), "full text");
    }

    #[test]
    fn test_digest_changes_with_content() {
        let state = WorkflowState::new(&RunConfig::new("Glaciers"));
        let a = state.digest();
        assert_eq!(a.len(), 64);
        assert_eq!(a, state.clone().digest());

        let mut changed = state;
        changed.draft = "Ice moves.".to_string();
        assert_ne!(a, changed.digest());
    }

    #[test]
    fn test_history_pattern() {
        let mut state = WorkflowState::new(&RunConfig::new("Glaciers"));
        state.node_history = vec![Role::Editor, Role::Researcher];
        assert!(state.history_suggests_handoff());
        state.node_history.push(Role::Editor);
        assert!(!state.history_suggests_handoff());
    }
}
