//! Text renderings of research results for prompts.

use crate::domain::{ResearchHighlight, ResearchResult, SourceItem};

const QUERY_SEPARATOR: &str = "********************************************************************************";
const SOURCE_SEPARATOR: &str = "--------------------------------------------------------------------------------";

/// Characters of a summary shown in a highlight.
pub const HIGHLIGHT_CHARS: usize = 200;

/// Cut `text` to at most `limit` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Numbered source blocks fed to the summarizer.
pub fn format_sources_for_summary(items: &[SourceItem], char_limit: usize) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "\n[Source {}] {}\nURL: {}\n{}\n\n{SOURCE_SEPARATOR}\n",
            i + 1,
            item.title,
            item.url,
            truncate_chars(item.body(), char_limit)
        ));
    }
    out
}

/// Full research log for the editor: every query, its summary (or raw
/// sources when unsummarized), and any error.
pub fn format_research_context(results: &[ResearchResult]) -> String {
    if results.is_empty() {
        return "No research conducted yet.".to_string();
    }

    let mut out = String::from("RESEARCH RESULTS:\n\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("Query {}: \"{}\"\n", i + 1, result.query));
        if let Some(error) = result.error() {
            out.push_str(&format!("  Error: {error}\n"));
        } else if let Some(summary) = result.summary() {
            out.push_str(&format!("Summary:\n{summary}\n"));
        } else {
            out.push_str("Findings:\n");
            for (j, item) in result.sources().iter().enumerate() {
                out.push_str(&format!(
                    "  Source {}: {}\n  URL: {}\n  {}\n  {}\n",
                    j + 1,
                    item.title,
                    item.url,
                    item.body(),
                    &SOURCE_SEPARATOR[..76]
                ));
            }
        }
        if i + 1 < results.len() {
            out.push_str(&format!("\n{QUERY_SEPARATOR}\n\n"));
        }
    }
    out
}

/// Condensed findings for the writer. Failed queries are skipped.
pub fn condense_research<'a, I>(results: I) -> String
where
    I: IntoIterator<Item = &'a ResearchResult>,
{
    let blocks: Vec<String> = results
        .into_iter()
        .filter(|r| r.is_success())
        .enumerate()
        .map(|(i, result)| {
            let mut block = format!("Query {}: '{}'\n", i + 1, result.query);
            match result.summary() {
                Some(summary) => {
                    block.push_str(summary);
                    block.push('\n');
                }
                None => {
                    for item in result.sources().iter().take(3) {
                        block.push_str(&format!("- {}\n", item.body()));
                    }
                }
            }
            block
        })
        .collect();

    if blocks.is_empty() {
        return "No research available.".to_string();
    }
    format!(
        "KEY RESEARCH FINDINGS:\n\n{}",
        blocks.join(&format!("\n{QUERY_SEPARATOR}\n\n"))
    )
}

/// One highlight per summarized result.
pub fn highlights(results: &[ResearchResult]) -> Vec<ResearchHighlight> {
    results
        .iter()
        .filter_map(|r| {
            r.summary().map(|summary| ResearchHighlight {
                query: r.query.clone(),
                preview: truncate_chars(summary, HIGHLIGHT_CHARS),
            })
        })
        .collect()
}
