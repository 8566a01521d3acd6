//! In-memory capability fakes (testing only).
//!
//! `ScriptedGenerator`, `StaticRetriever` and `StaticResolver` satisfy the
//! capability contracts deterministically and record every call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::capability::{CapabilityError, CapabilityResolver, Generator, Message, Retriever};
use crate::domain::{ModelId, SourceItem};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type Responder = Box<dyn Fn(&[Message]) -> Result<String, CapabilityError> + Send + Sync>;

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// Generator that replays queued responses in order, then defers to an
/// optional responder closure. With neither left it fails with a provider
/// error.
pub struct ScriptedGenerator {
    model: String,
    script: Mutex<VecDeque<Result<String, CapabilityError>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedGenerator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(VecDeque::new()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, error: CapabilityError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Message]) -> Result<String, CapabilityError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    /// Every message list received, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, CapabilityError> {
        lock(&self.calls).push(messages.to_vec());
        if let Some(next) = lock(&self.script).pop_front() {
            return next;
        }
        match &self.responder {
            Some(f) => f(messages),
            None => Err(CapabilityError::Provider(format!(
                "scripted generator {} has no response left",
                self.model
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticRetriever
// ---------------------------------------------------------------------------

/// Retriever answering from a fixed query table, with an optional default.
#[derive(Default)]
pub struct StaticRetriever {
    table: HashMap<String, Result<Vec<SourceItem>, CapabilityError>>,
    default: Option<Vec<SourceItem>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: impl Into<String>, items: Vec<SourceItem>) -> Self {
        self.table.insert(query.into(), Ok(items));
        self
    }

    pub fn with_failure(mut self, query: impl Into<String>, error: CapabilityError) -> Self {
        self.table.insert(query.into(), Err(error));
        self
    }

    /// Answer for any query not in the table.
    pub fn with_default(mut self, items: Vec<SourceItem>) -> Self {
        self.default = Some(items);
        self
    }

    /// `(query, max_results)` pairs received, in call order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SourceItem>, CapabilityError> {
        lock(&self.calls).push((query.to_string(), max_results));
        match self.table.get(query) {
            Some(Ok(items)) => Ok(items.iter().take(max_results).cloned().collect()),
            Some(Err(e)) => Err(e.clone()),
            None => match &self.default {
                Some(items) => Ok(items.iter().take(max_results).cloned().collect()),
                None => Err(CapabilityError::Provider(format!(
                    "no canned results for {query:?}"
                ))),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// StaticResolver
// ---------------------------------------------------------------------------

/// Resolver over a fixed model table.
#[derive(Default)]
pub struct StaticResolver {
    generators: HashMap<String, Arc<dyn Generator>>,
    retriever: Option<Arc<dyn Retriever>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(mut self, model: impl Into<String>, generator: Arc<dyn Generator>) -> Self {
        self.generators.insert(model.into(), generator);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }
}

impl CapabilityResolver for StaticResolver {
    fn generator(&self, model: &ModelId) -> Result<Arc<dyn Generator>, CapabilityError> {
        self.generators
            .get(model.as_str())
            .cloned()
            .ok_or_else(|| CapabilityError::Configuration(format!("unknown model {model}")))
    }

    fn retriever(&self) -> Result<Arc<dyn Retriever>, CapabilityError> {
        self.retriever
            .clone()
            .ok_or_else(|| CapabilityError::Configuration("no retriever configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_responder_then_exhausted() {
        let gen = ScriptedGenerator::new("m")
            .with_response("first")
            .with_error(CapabilityError::Provider("second".into()));
        assert_eq!(gen.generate(&[]).await.unwrap(), "first");
        assert!(gen.generate(&[]).await.is_err());
        assert!(gen.generate(&[]).await.is_err());
        assert_eq!(gen.call_count(), 3);

        let gen = ScriptedGenerator::new("m").with_responder(|_| Ok("always".into()));
        assert_eq!(gen.generate(&[]).await.unwrap(), "always");
    }

    #[tokio::test]
    async fn test_static_retriever_honors_bound() {
        let items = vec![
            SourceItem::new("a", "u", "c"),
            SourceItem::new("b", "u", "c"),
        ];
        let retriever = StaticRetriever::new().with_results("q", items);
        assert_eq!(retriever.search("q", 1).await.unwrap().len(), 1);
        assert!(retriever.search("other", 3).await.is_err());
    }
}
