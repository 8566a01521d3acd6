use async_trait::async_trait;
use inkloop_core::{CapabilityError, Retriever, SourceItem};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::http;

/// Tavily web search. Requests advanced depth with full page content.
pub struct TavilyRetriever {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<SearchHit>>,
}

// Tavily sends explicit nulls for fields it could not fill.
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    raw_content: Option<String>,
}

impl From<SearchHit> for SourceItem {
    fn from(hit: SearchHit) -> Self {
        SourceItem {
            title: hit.title.unwrap_or_default(),
            url: hit.url.unwrap_or_default(),
            content: hit.content.unwrap_or_default(),
            raw_content: hit.raw_content,
        }
    }
}

impl TavilyRetriever {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body(&self, query: &str, max_results: usize) -> Value {
        json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "advanced",
            "include_answer": false,
            "include_raw_content": true,
            "include_images": false,
        })
    }
}

fn parse_results(data: Value, max_results: usize) -> Result<Vec<SourceItem>, CapabilityError> {
    let response: SearchResponse = serde_json::from_value(data)
        .map_err(|e| CapabilityError::Provider(format!("tavily: unexpected response: {e}")))?;
    Ok(response
        .results
        .unwrap_or_default()
        .into_iter()
        .take(max_results)
        .map(SourceItem::from)
        .collect())
}

#[async_trait]
impl Retriever for TavilyRetriever {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SourceItem>, CapabilityError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        debug!(%query, max_results, "tavily search");
        let data = http::post_json(
            self.client.post(&url),
            &self.request_body(query, max_results),
            "tavily",
        )
        .await?;
        parse_results(data, max_results)
    }
}
