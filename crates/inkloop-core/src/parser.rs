//! Marker-section extraction for free-form role output.
//!
//! Each schema is a fixed set of `MARKER:` headings. A field runs from its
//! marker to the next recognized marker of the same schema, or to the end of
//! the text. Markers are matched case-insensitively in the first column,
//! tolerating a markdown heading or emphasis prefix (`## THESIS:`,
//! `**THESIS:**`) and spaces in place of underscores. Indented labels belong
//! to the body they sit in.
//!
//! Parsing never fails. A missing marker resolves to the schema's default
//! (see each `parse_*` function) and is recorded as a fallback: logged as
//! `parser.fallback`, counted in [`METRICS`], and listed on the returned
//! record so callers can see what was defaulted.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::EditorDecision;
use crate::metrics::METRICS;
use crate::obs;

static EDITOR_PLAN_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    marker_regex("THESIS|OUTLINE|RESEARCH[_ ]NEEDED|QUERIES|READY[_ ]TO[_ ]WRITE|REASONING")
});

static EDITOR_REVIEW_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| marker_regex("THESIS|OUTLINE|DECISION|QUERIES|DIRECTION|REASONING"));

static CRITIC_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    marker_regex("EVALUATION|STRENGTHS|AREAS[_ ]FOR[_ ]IMPROVEMENT|LENGTH|APPROVED|REASON")
});

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*(.*)$").expect("numbered item regex"));

fn marker_regex(names: &str) -> Regex {
    let pattern = format!(
        r"(?im)^(?:#{{1,6}}[ \t]*|>[ \t]*|\*{{1,2}})?(?P<name>{names})[ \t]*(?:\*\*)?[ \t]*:(?:\*\*)?"
    );
    Regex::new(&pattern).expect("marker regex")
}

/// The three marker schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    EditorPlan,
    EditorReview,
    Critic,
}

impl Schema {
    pub fn name(self) -> &'static str {
        match self {
            Schema::EditorPlan => "editor_plan",
            Schema::EditorReview => "editor_review",
            Schema::Critic => "critic",
        }
    }

    fn markers(self) -> &'static Regex {
        match self {
            Schema::EditorPlan => &*EDITOR_PLAN_MARKERS,
            Schema::EditorReview => &*EDITOR_REVIEW_MARKERS,
            Schema::Critic => &*CRITIC_MARKERS,
        }
    }
}

/// Structured output of an initial-outline editor call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EditorPlan {
    pub thesis: String,
    pub outline: String,
    pub research_needed: bool,
    pub queries: Vec<String>,
    pub ready_to_write: bool,
    pub reasoning: String,
    /// Markers that were missing and defaulted.
    pub fallbacks: Vec<&'static str>,
}

/// Structured output of a critique-review editor call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EditorReview {
    pub thesis: String,
    pub outline: String,
    pub decision: EditorDecision,
    pub queries: Vec<String>,
    pub direction: String,
    pub reasoning: String,
    pub fallbacks: Vec<&'static str>,
}

/// Structured critic evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CriticReport {
    pub evaluation: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub length_info: String,
    pub approved: bool,
    pub reason: String,
    pub fallbacks: Vec<&'static str>,
}

impl CriticReport {
    /// Normalized feedback text handed to the writer and editor.
    pub fn render_feedback(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if !self.evaluation.is_empty() {
            lines.push(format!("EVALUATION: {}\n", self.evaluation));
        }
        if !self.strengths.is_empty() {
            lines.push("STRENGTHS:".to_string());
            lines.extend(self.strengths.iter().map(|s| format!("- {s}")));
            lines.push(String::new());
        }
        if !self.improvements.is_empty() {
            lines.push("AREAS FOR IMPROVEMENT:".to_string());
            lines.extend(
                self.improvements
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {item}", i + 1)),
            );
            lines.push(String::new());
        }
        if !self.length_info.is_empty() {
            lines.push(format!("LENGTH: {}", self.length_info));
        }
        if !self.reason.is_empty() {
            lines.push(format!("\n{}", self.reason));
        }
        lines.join("\n").trim().to_string()
    }
}

/// Marker sections of one response.
struct Sections<'a> {
    schema: Schema,
    found: HashMap<String, &'a str>,
    fallbacks: Vec<&'static str>,
}

impl<'a> Sections<'a> {
    fn split(schema: Schema, text: &'a str) -> Self {
        let hits: Vec<(String, usize, usize)> = schema
            .markers()
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.name("name")?;
                Some((canonical(name.as_str()), whole.start(), whole.end()))
            })
            .collect();

        let mut found = HashMap::new();
        for (i, (name, _, body_start)) in hits.iter().enumerate() {
            let body_end = hits.get(i + 1).map_or(text.len(), |(_, start, _)| *start);
            let body = text[*body_start..body_end].trim();
            // Closing rationale comes last; other markers keep their first occurrence.
            if matches!(name.as_str(), "REASON" | "REASONING") {
                found.insert(name.clone(), body);
            } else {
                found.entry(name.clone()).or_insert(body);
            }
        }

        Self {
            schema,
            found,
            fallbacks: Vec::new(),
        }
    }

    fn get(&mut self, field: &'static str) -> Option<&'a str> {
        match self.found.get(field) {
            Some(body) => Some(*body),
            None => {
                self.fallback(field);
                None
            }
        }
    }

    fn fallback(&mut self, field: &'static str) {
        obs::emit_parser_fallback(self.schema.name(), field);
        METRICS.inc_parser_fallbacks();
        self.fallbacks.push(field);
    }

    fn text(&mut self, field: &'static str) -> String {
        self.get(field).unwrap_or_default().to_string()
    }

    fn flag(&mut self, field: &'static str, default: bool) -> bool {
        let Some(body) = self.get(field) else {
            return default;
        };
        match yes_no(body) {
            Some(value) => value,
            None => {
                self.fallback(field);
                default
            }
        }
    }

    fn list(&mut self, field: &'static str) -> Vec<String> {
        self.get(field).map(list_items).unwrap_or_default()
    }

    fn numbered(&mut self, field: &'static str) -> Vec<String> {
        self.get(field).map(numbered_items).unwrap_or_default()
    }

    fn has(&self, field: &str) -> bool {
        self.found.contains_key(field)
    }
}

fn canonical(name: &str) -> String {
    name.to_ascii_uppercase().replace(' ', "_")
}

fn yes_no(body: &str) -> Option<bool> {
    let word = body
        .trim_start_matches(|c: char| !c.is_ascii_alphabetic())
        .to_ascii_lowercase();
    if word.starts_with("yes") || word.starts_with("true") {
        Some(true)
    } else if word.starts_with("no") || word.starts_with("false") {
        Some(false)
    } else {
        None
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    let line = line.trim();
    let rest = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('•'))
        .or_else(|| line.strip_prefix('*'))?;
    Some(rest.trim())
}

/// Bulleted (or, failing that, numbered) lines as trimmed strings.
fn list_items(body: &str) -> Vec<String> {
    let bullets: Vec<String> = body
        .lines()
        .filter_map(strip_bullet)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    body.lines()
        .filter_map(|line| NUMBERED_ITEM.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Numbered items; continuation lines join the current item, a blank line
/// closes it. Falls back to bullets when nothing is numbered.
fn numbered_items(body: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut open = false;
    for line in body.lines() {
        if let Some(caps) = NUMBERED_ITEM.captures(line) {
            let first = caps.get(1).map_or("", |m| m.as_str().trim());
            items.push(first.to_string());
            open = true;
        } else if line.trim().is_empty() {
            open = false;
        } else if open {
            if let Some(current) = items.last_mut() {
                current.push_str("\n   ");
                current.push_str(line.trim());
            }
        }
    }
    items.retain(|s| !s.trim().is_empty());
    if items.is_empty() {
        return list_items(body);
    }
    items
}

/// Parse initial-outline editor output.
///
/// Defaults: thesis/outline/reasoning empty, `research_needed` true,
/// `ready_to_write` false, no queries.
pub fn parse_editor_plan(text: &str) -> EditorPlan {
    let mut s = Sections::split(Schema::EditorPlan, text);
    let plan = EditorPlan {
        thesis: s.text("THESIS"),
        outline: s.text("OUTLINE"),
        research_needed: s.flag("RESEARCH_NEEDED", true),
        queries: s.list("QUERIES"),
        ready_to_write: s.flag("READY_TO_WRITE", false),
        reasoning: s.text("REASONING"),
        fallbacks: Vec::new(),
    };
    EditorPlan {
        fallbacks: s.fallbacks,
        ..plan
    }
}

/// Parse critique-review editor output.
///
/// A missing or unrecognized DECISION resolves to `revise`; approval is
/// never a default. `research` without any query also degrades to `revise`.
pub fn parse_editor_review(text: &str) -> EditorReview {
    let mut s = Sections::split(Schema::EditorReview, text);
    let thesis = s.text("THESIS");
    let outline = s.text("OUTLINE");
    let decision = match s.get("DECISION") {
        Some(body) => match EditorDecision::from_model_word(body) {
            Some(decision) => decision,
            None => {
                s.fallback("DECISION");
                EditorDecision::Revise
            }
        },
        None => EditorDecision::Revise,
    };
    // QUERIES is only expected alongside a research decision.
    let queries = if s.has("QUERIES") {
        s.list("QUERIES")
    } else if decision == EditorDecision::Research {
        s.fallback("QUERIES");
        Vec::new()
    } else {
        Vec::new()
    };
    let decision = if decision == EditorDecision::Research && queries.is_empty() {
        EditorDecision::Revise
    } else {
        decision
    };
    let direction = s.text("DIRECTION");
    let reasoning = s.text("REASONING");

    EditorReview {
        thesis,
        outline,
        decision,
        queries,
        direction,
        reasoning,
        fallbacks: s.fallbacks,
    }
}

/// Parse critic output. A missing APPROVED marker means not approved.
pub fn parse_critic_report(text: &str) -> CriticReport {
    let mut s = Sections::split(Schema::Critic, text);
    let report = CriticReport {
        evaluation: s.text("EVALUATION"),
        strengths: s.list("STRENGTHS"),
        improvements: s.numbered("AREAS_FOR_IMPROVEMENT"),
        length_info: s
            .get("LENGTH")
            .and_then(|body| body.lines().next())
            .unwrap_or_default()
            .trim()
            .to_string(),
        approved: s.flag("APPROVED", false),
        reason: s.text("REASON"),
        fallbacks: Vec::new(),
    };
    CriticReport {
        fallbacks: s.fallbacks,
        ..report
    }
}

/// Whitespace-delimited word count.
pub fn estimate_word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
