//! Researcher adapter: retrieval plus summarization per pending query.
//!
//! Queries fan out with at most `max_concurrent_queries` in flight; results
//! come back in query order as one delta. A provider failure affects only
//! its own query. A configuration failure aborts the whole step.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::capability::{CapabilityError, Generator, Message, Retriever};
use crate::domain::{ResearchResult, ResearchSettings, StateDelta, WorkflowState};
use crate::metrics::METRICS;
use crate::obs;
use crate::prompts;
use crate::research::{format_sources_for_summary, highlights};
use crate::roles::Role;

pub async fn run(
    state: &WorkflowState,
    generator: &dyn Generator,
    retriever: &dyn Retriever,
    settings: &ResearchSettings,
) -> Result<StateDelta, CapabilityError> {
    let cycle = state.critique_iteration;
    if state.research_queries.is_empty() {
        warn!("researcher invoked with no pending queries");
    }

    let results: Vec<ResearchResult> = stream::iter(state.research_queries.iter())
        .map(|query| research_one(state, query, cycle, generator, retriever, settings))
        .buffered(settings.max_concurrent_queries.max(1))
        .try_collect()
        .await?;

    debug!(
        queries = results.len(),
        failed = results.iter().filter(|r| !r.is_success()).count(),
        cycle,
        "research batch complete"
    );

    let mut delta = StateDelta::new(Role::Researcher);
    delta.research_highlights = Some(highlights(&results));
    delta.research_queries = Some(Vec::new());
    delta.research_results = results;
    Ok(delta)
}

async fn research_one(
    state: &WorkflowState,
    query: &str,
    cycle: u32,
    generator: &dyn Generator,
    retriever: &dyn Retriever,
    settings: &ResearchSettings,
) -> Result<ResearchResult, CapabilityError> {
    let sources = match retriever.search(query, settings.max_results_per_query).await {
        Ok(sources) => sources,
        Err(e) if e.is_configuration() => return Err(e),
        Err(e) => {
            obs::emit_research_query_failed(query, &e);
            METRICS.inc_research_failures();
            return Ok(ResearchResult::failed(query, e.to_string(), cycle));
        }
    };

    let user = prompts::researcher_prompt(
        &state.topic,
        &state.thesis,
        query,
        &format_sources_for_summary(&sources, settings.source_char_limit),
    );
    let messages = [Message::system(prompts::RESEARCHER_SYSTEM), Message::user(user)];

    let summary = match generator.generate(&messages).await {
        Ok(summary) => Some(summary),
        Err(e) if e.is_configuration() => return Err(e),
        Err(e) => {
            warn!(query = %query, error = %e, "summarization failed; keeping raw sources");
            None
        }
    };
    Ok(ResearchResult::found(query, sources, summary, cycle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RunConfig, SourceItem};
    use crate::fakes::{ScriptedGenerator, StaticRetriever};

    fn state(queries: &[&str]) -> WorkflowState {
        let mut s = WorkflowState::new(&RunConfig::new("Coral reefs"));
        s.research_queries = queries.iter().map(|q| q.to_string()).collect();
        s
    }

    fn source(title: &str) -> SourceItem {
        SourceItem::new(title, format!("https://{title}.example"), format!("{title} body"))
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let retriever = StaticRetriever::new()
            .with_results("q1", vec![source("a")])
            .with_failure("q2", CapabilityError::Provider("HTTP 502".into()))
            .with_results("q3", vec![source("c")]);
        let gen = ScriptedGenerator::new("fake").with_responder(|messages| {
            let user = &messages[1].content;
            Ok(if user.contains("RESEARCH QUERY: q1") {
                "summary one".to_string()
            } else {
                "summary three".to_string()
            })
        });

        let delta = run(&state(&["q1", "q2", "q3"]), &gen, &retriever, &ResearchSettings::default())
            .await
            .unwrap();

        let results = &delta.research_results;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].summary(), Some("summary one"));
        assert_eq!(results[1].error(), Some("provider error: HTTP 502"));
        assert!(results[1].summary().is_none());
        assert_eq!(results[2].summary(), Some("summary three"));
        assert_eq!(results[2].sources().len(), 1);
        assert_eq!(delta.research_queries, Some(Vec::new()));
        assert_eq!(gen.call_count(), 2);
        assert_eq!(delta.research_highlights.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_results_keep_query_order_under_concurrency() {
        let retriever = StaticRetriever::new().with_default(vec![source("x")]);
        let gen = ScriptedGenerator::new("fake").with_responder(|messages| {
            let user = &messages[1].content;
            let query = user
                .lines()
                .find_map(|l| l.strip_prefix("RESEARCH QUERY: "))
                .unwrap_or_default();
            Ok(format!("about {query}"))
        });
        let settings = ResearchSettings {
            max_concurrent_queries: 2,
            ..ResearchSettings::default()
        };

        let delta = run(&state(&["a", "b", "c", "d"]), &gen, &retriever, &settings)
            .await
            .unwrap();
        let queries: Vec<_> = delta.research_results.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["a", "b", "c", "d"]);
        assert_eq!(delta.research_results[3].summary(), Some("about d"));
    }

    #[tokio::test]
    async fn test_results_tagged_with_critique_cycle() {
        let retriever = StaticRetriever::new().with_default(vec![source("x")]);
        let gen = ScriptedGenerator::new("fake").with_responder(|_| Ok("s".to_string()));
        let mut s = state(&["q"]);
        s.critique_iteration = 2;

        let delta = run(&s, &gen, &retriever, &ResearchSettings::default())
            .await
            .unwrap();
        assert_eq!(delta.research_results[0].cycle, 2);
    }

    #[tokio::test]
    async fn test_summarization_provider_failure_keeps_sources() {
        let retriever = StaticRetriever::new().with_default(vec![source("x")]);
        let gen = ScriptedGenerator::new("fake")
            .with_error(CapabilityError::Provider("rate limited".into()));

        let delta = run(&state(&["q"]), &gen, &retriever, &ResearchSettings::default())
            .await
            .unwrap();
        let r = &delta.research_results[0];
        assert!(r.is_success());
        assert!(r.summary().is_none());
        assert_eq!(r.sources().len(), 1);
        assert_eq!(delta.research_highlights, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_configuration_failure_aborts_batch() {
        let retriever = StaticRetriever::new()
            .with_failure("q", CapabilityError::Configuration("TAVILY_API_KEY not set".into()));
        let gen = ScriptedGenerator::new("fake");

        let err = run(&state(&["q"]), &gen, &retriever, &ResearchSettings::default())
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_sources_truncated_before_summarization() {
        let mut long = source("long");
        long.content = "w".repeat(100);
        let retriever = StaticRetriever::new().with_default(vec![long]);
        let gen = ScriptedGenerator::new("fake").with_responder(|_| Ok("s".to_string()));
        let settings = ResearchSettings {
            source_char_limit: 10,
            ..ResearchSettings::default()
        };

        run(&state(&["q"]), &gen, &retriever, &settings).await.unwrap();
        let calls = gen.calls();
        assert!(calls[0][1].content.contains("wwwwwwwwww...\n"));
        assert!(!calls[0][1].content.contains(&"w".repeat(11)));
    }

    #[tokio::test]
    async fn test_retriever_receives_result_bound() {
        let retriever = StaticRetriever::new().with_default(vec![]);
        let gen = ScriptedGenerator::new("fake").with_responder(|_| Ok("s".to_string()));
        let settings = ResearchSettings {
            max_results_per_query: 5,
            ..ResearchSettings::default()
        };
        run(&state(&["q"]), &gen, &retriever, &settings).await.unwrap();
        assert_eq!(retriever.calls(), vec![("q".to_string(), 5)]);
    }
}
